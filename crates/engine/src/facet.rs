//! Facets: the fixed, ordered question sequence.
//!
//! Everything the resolver and the reducer need to know about a facet lives in
//! its [`FacetDefinition`]: the prompt, and whether the facet only applies when
//! another facet holds a given value. Conditional facets are declared here, not
//! special-cased in the algorithms.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use fenestra_catalog::{
    Category, FillMaterial, LeafCount, OpeningSystem, Product, Shutter, ShutterDrive,
};
use fenestra_core::{DomainError, DomainResult};

use crate::selection::Selections;

/// One discriminating attribute in the question sequence.
///
/// The declaration order is the question order and the cascade-reset direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Facet {
    #[serde(rename = "categoria")]
    Category,
    #[serde(rename = "sistema")]
    OpeningSystem,
    #[serde(rename = "persiana")]
    Shutter,
    #[serde(rename = "motorizada")]
    ShutterDrive,
    #[serde(rename = "material")]
    FillMaterial,
    #[serde(rename = "folhas")]
    LeafCount,
}

impl Facet {
    pub const ORDER: [Facet; 6] = [
        Facet::Category,
        Facet::OpeningSystem,
        Facet::Shutter,
        Facet::ShutterDrive,
        Facet::FillMaterial,
        Facet::LeafCount,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Key used in persisted selection documents.
    pub fn key(self) -> &'static str {
        match self {
            Facet::Category => "categoria",
            Facet::OpeningSystem => "sistema",
            Facet::Shutter => "persiana",
            Facet::ShutterDrive => "motorizada",
            Facet::FillMaterial => "material",
            Facet::LeafCount => "folhas",
        }
    }

    pub fn from_key(key: &str) -> DomainResult<Self> {
        Facet::ORDER
            .into_iter()
            .find(|f| f.key() == key)
            .ok_or_else(|| DomainError::validation(format!("unknown facet '{key}'")))
    }

    pub fn definition(self) -> &'static FacetDefinition {
        &FACETS[self.index()]
    }

    /// Facets strictly after this one in the question order.
    pub fn later(self) -> impl Iterator<Item = Facet> {
        Facet::ORDER.into_iter().skip(self.index() + 1)
    }

    /// Whether the facet takes part in the sequence under `selections`.
    pub fn is_applicable(self, selections: &Selections) -> bool {
        match self.definition().requires {
            None => true,
            Some(req) => selections.get(req.facet) == Some(req.value),
        }
    }

    /// Value of this facet's attribute on a product (`None` when the product lacks it).
    pub fn attribute_of(self, product: &Product) -> Option<FacetValue> {
        match self {
            Facet::Category => Some(FacetValue::Category(product.category())),
            Facet::OpeningSystem => Some(FacetValue::OpeningSystem(product.opening_system())),
            Facet::Shutter => Some(FacetValue::Shutter(product.shutter())),
            Facet::ShutterDrive => product.shutter_drive().map(FacetValue::ShutterDrive),
            Facet::FillMaterial => Some(FacetValue::FillMaterial(product.fill_material())),
            Facet::LeafCount => Some(FacetValue::LeafCount(product.leaf_count())),
        }
    }
}

impl core::fmt::Display for Facet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

/// Applicability requirement of a conditional facet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub facet: Facet,
    pub value: FacetValue,
}

/// Static description of a facet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FacetDefinition {
    pub facet: Facet,
    pub prompt: &'static str,
    pub requires: Option<Requirement>,
}

/// Facet table, indexed by [`Facet::index`].
pub static FACETS: [FacetDefinition; 6] = [
    FacetDefinition {
        facet: Facet::Category,
        prompt: "O que você procura?",
        requires: None,
    },
    FacetDefinition {
        facet: Facet::OpeningSystem,
        prompt: "Qual sistema de abertura você prefere?",
        requires: None,
    },
    FacetDefinition {
        facet: Facet::Shutter,
        prompt: "Precisa de persiana integrada?",
        requires: None,
    },
    FacetDefinition {
        facet: Facet::ShutterDrive,
        prompt: "Persiana motorizada ou manual?",
        requires: Some(Requirement {
            facet: Facet::Shutter,
            value: FacetValue::Shutter(Shutter::Yes),
        }),
    },
    FacetDefinition {
        facet: Facet::FillMaterial,
        prompt: "Qual material de preenchimento?",
        requires: None,
    },
    FacetDefinition {
        facet: Facet::LeafCount,
        prompt: "Quantas folhas?",
        requires: None,
    },
];

/// A concrete answer for one facet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FacetValue {
    Category(Category),
    OpeningSystem(OpeningSystem),
    Shutter(Shutter),
    ShutterDrive(ShutterDrive),
    FillMaterial(FillMaterial),
    LeafCount(LeafCount),
}

impl FacetValue {
    pub fn facet(&self) -> Facet {
        match self {
            FacetValue::Category(_) => Facet::Category,
            FacetValue::OpeningSystem(_) => Facet::OpeningSystem,
            FacetValue::Shutter(_) => Facet::Shutter,
            FacetValue::ShutterDrive(_) => Facet::ShutterDrive,
            FacetValue::FillMaterial(_) => Facet::FillMaterial,
            FacetValue::LeafCount(_) => Facet::LeafCount,
        }
    }

    /// Parse an option code for `facet` (as sent back by the presentation layer).
    pub fn parse(facet: Facet, code: &str) -> DomainResult<Self> {
        Ok(match facet {
            Facet::Category => FacetValue::Category(code.parse()?),
            Facet::OpeningSystem => FacetValue::OpeningSystem(code.parse()?),
            Facet::Shutter => FacetValue::Shutter(code.parse()?),
            Facet::ShutterDrive => FacetValue::ShutterDrive(code.parse()?),
            Facet::FillMaterial => FacetValue::FillMaterial(code.parse()?),
            Facet::LeafCount => FacetValue::LeafCount(code.parse()?),
        })
    }

    /// Catalog code (what gets compared, persisted and sent to the AI).
    pub fn code(&self) -> String {
        match self {
            FacetValue::Category(v) => v.as_str().to_string(),
            FacetValue::OpeningSystem(v) => v.as_str().to_string(),
            FacetValue::Shutter(v) => v.as_str().to_string(),
            FacetValue::ShutterDrive(v) => v.as_str().to_string(),
            FacetValue::FillMaterial(v) => v.as_str().to_string(),
            FacetValue::LeafCount(v) => v.to_string(),
        }
    }

    /// Human-facing label.
    pub fn label(&self) -> String {
        match self {
            FacetValue::Category(Category::Window) => "Janela".into(),
            FacetValue::Category(Category::Door) => "Porta".into(),
            FacetValue::OpeningSystem(OpeningSystem::SlidingWindow)
            | FacetValue::OpeningSystem(OpeningSystem::SlidingDoor) => "de Correr".into(),
            FacetValue::OpeningSystem(OpeningSystem::TopHung) => "Maxim-ar".into(),
            FacetValue::OpeningSystem(OpeningSystem::Hinged) => "de Giro".into(),
            FacetValue::Shutter(Shutter::Yes) => "Persiana Integrada".into(),
            FacetValue::Shutter(Shutter::No) => "Não".into(),
            FacetValue::ShutterDrive(ShutterDrive::Motorized) => "Motorizada".into(),
            FacetValue::ShutterDrive(ShutterDrive::Manual) => "Manual".into(),
            FacetValue::FillMaterial(FillMaterial::Glass) => "Vidro".into(),
            FacetValue::FillMaterial(FillMaterial::GlassAndLouver) => "Vidro e Veneziana".into(),
            FacetValue::FillMaterial(FillMaterial::Panel) => "Lambri".into(),
            FacetValue::FillMaterial(FillMaterial::Louver) => "Veneziana".into(),
            FacetValue::FillMaterial(FillMaterial::GlassAndPanel) => "Vidro e Lambri".into(),
            FacetValue::LeafCount(n) if n.get() == 1 => "1 Folha".into(),
            FacetValue::LeafCount(n) => format!("{n} Folhas"),
        }
    }

    /// Presentation order between two values of the same facet: numeric for
    /// leaf counts, byte-wise on the code otherwise.
    pub fn presentation_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FacetValue::LeafCount(a), FacetValue::LeafCount(b)) => a.cmp(b),
            _ => self.code().cmp(&other.code()),
        }
    }
}

impl core::fmt::Display for FacetValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.code())
    }
}
