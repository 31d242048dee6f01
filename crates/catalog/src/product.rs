use core::str::FromStr;

use serde::{Deserialize, Serialize};

use fenestra_core::DomainError;

/// Declares a closed set of attribute codes.
///
/// Codes are the catalog's own (Portuguese) identifiers; they are what gets
/// persisted, sent to the AI collaborator and compared during filtering.
macro_rules! attribute_codes {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Catalog code for this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err(DomainError::validation(format!(
                        "unknown {} '{}'",
                        $label, other
                    ))),
                }
            }
        }
    };
}

attribute_codes! {
    /// Product category.
    Category, "category" {
        Window => "janela",
        Door => "porta",
    }
}

attribute_codes! {
    /// Opening system (how the leaves move).
    OpeningSystem, "opening system" {
        SlidingWindow => "janela-correr",
        SlidingDoor => "porta-correr",
        TopHung => "maxim-ar",
        Hinged => "giro",
    }
}

attribute_codes! {
    /// Whether the product has an integrated roller shutter.
    Shutter, "shutter option" {
        Yes => "sim",
        No => "nao",
    }
}

attribute_codes! {
    /// How an integrated shutter is driven.
    ShutterDrive, "shutter drive" {
        Motorized => "motorizada",
        Manual => "manual",
    }
}

attribute_codes! {
    /// Fill material of the leaves; some products combine two.
    FillMaterial, "fill material" {
        Glass => "vidro",
        GlassAndLouver => "vidro + veneziana",
        Panel => "lambri",
        Louver => "veneziana",
        GlassAndPanel => "vidro + lambri",
    }
}

/// Number of leaves (panels) of a product. Never zero, also when deserialized.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LeafCount(u8);

impl LeafCount {
    pub fn new(count: u8) -> Result<Self, DomainError> {
        if count == 0 {
            return Err(DomainError::validation("leaf count must be at least 1"));
        }
        Ok(Self(count))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for LeafCount {
    type Error = DomainError;

    fn try_from(count: u8) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<LeafCount> for u8 {
    fn from(count: LeafCount) -> Self {
        count.0
    }
}

impl core::fmt::Display for LeafCount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for LeafCount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count: u8 = s
            .trim()
            .parse()
            .map_err(|_| DomainError::validation(format!("unknown leaf count '{s}'")))?;
        Self::new(count)
    }
}

/// Admissible opening width, in metres.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidthRange {
    pub min_m: f64,
    pub max_m: f64,
}

impl WidthRange {
    pub fn contains(&self, width_m: f64) -> bool {
        width_m >= self.min_m && width_m <= self.max_m
    }
}

/// One catalog entry.
///
/// Field names on the wire follow the catalog document format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    slug: String,
    image: String,
    #[serde(rename = "categoria")]
    category: Category,
    #[serde(rename = "sistema")]
    opening_system: OpeningSystem,
    #[serde(rename = "persiana")]
    shutter: Shutter,
    #[serde(rename = "persianaMotorizada", default)]
    shutter_drive: Option<ShutterDrive>,
    #[serde(rename = "material")]
    fill_material: FillMaterial,
    #[serde(rename = "minLargura")]
    min_width_m: f64,
    #[serde(rename = "maxLargura")]
    max_width_m: f64,
    #[serde(rename = "folhas")]
    leaf_count: LeafCount,
}

impl Product {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        slug: impl Into<String>,
        image: impl Into<String>,
        category: Category,
        opening_system: OpeningSystem,
        shutter: Shutter,
        shutter_drive: Option<ShutterDrive>,
        fill_material: FillMaterial,
        width: WidthRange,
        leaf_count: LeafCount,
    ) -> Self {
        Self {
            slug: slug.into(),
            image: image.into(),
            category,
            opening_system,
            shutter,
            shutter_drive,
            fill_material,
            min_width_m: width.min_m,
            max_width_m: width.max_m,
            leaf_count,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn opening_system(&self) -> OpeningSystem {
        self.opening_system
    }

    pub fn shutter(&self) -> Shutter {
        self.shutter
    }

    /// `None` for products without an integrated shutter.
    pub fn shutter_drive(&self) -> Option<ShutterDrive> {
        self.shutter_drive
    }

    pub fn fill_material(&self) -> FillMaterial {
        self.fill_material
    }

    pub fn leaf_count(&self) -> LeafCount {
        self.leaf_count
    }

    pub fn width(&self) -> WidthRange {
        WidthRange {
            min_m: self.min_width_m,
            max_m: self.max_width_m,
        }
    }

    /// Public product page for this entry.
    pub fn link(&self, base_url: &str) -> String {
        format!("{base_url}{}", self.slug)
    }
}
