//! Selection-set and the selection reducer.
//!
//! A [`Selections`] value is never edited in place by the configurator: every
//! user action goes through [`apply_selection`] (or a [`SelectionPatch`], which
//! folds through the same reducer) and yields a fresh value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fenestra_catalog::{Category, FillMaterial, LeafCount, OpeningSystem, Shutter, ShutterDrive};

use crate::facet::{Facet, FacetValue};

/// The user's answers, one slot per facet.
///
/// Serialises with the persisted document keys; unset slots are `null`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selections {
    #[serde(rename = "categoria", default)]
    category: Option<Category>,
    #[serde(rename = "sistema", default)]
    opening_system: Option<OpeningSystem>,
    #[serde(rename = "persiana", default)]
    shutter: Option<Shutter>,
    #[serde(rename = "motorizada", default)]
    shutter_drive: Option<ShutterDrive>,
    #[serde(rename = "material", default)]
    fill_material: Option<FillMaterial>,
    #[serde(rename = "folhas", default)]
    leaf_count: Option<LeafCount>,
}

impl Selections {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, facet: Facet) -> Option<FacetValue> {
        match facet {
            Facet::Category => self.category.map(FacetValue::Category),
            Facet::OpeningSystem => self.opening_system.map(FacetValue::OpeningSystem),
            Facet::Shutter => self.shutter.map(FacetValue::Shutter),
            Facet::ShutterDrive => self.shutter_drive.map(FacetValue::ShutterDrive),
            Facet::FillMaterial => self.fill_material.map(FacetValue::FillMaterial),
            Facet::LeafCount => self.leaf_count.map(FacetValue::LeafCount),
        }
    }

    pub fn is_set(&self, facet: Facet) -> bool {
        self.get(facet).is_some()
    }

    pub fn is_empty(&self) -> bool {
        Facet::ORDER.into_iter().all(|f| !self.is_set(f))
    }

    /// Set values in facet order.
    pub fn chosen(&self) -> impl Iterator<Item = FacetValue> + '_ {
        Facet::ORDER.into_iter().filter_map(|f| self.get(f))
    }

    /// Copy with one slot overwritten, without cascade or applicability rules.
    ///
    /// Meant for building fixtures and for the resolver's forced narrowing;
    /// user actions go through [`apply_selection`].
    pub fn with(mut self, value: FacetValue) -> Self {
        self.put(value.facet(), Some(value));
        self
    }

    /// Copy with one slot unset, without cascade or applicability rules.
    pub fn without(mut self, facet: Facet) -> Self {
        self.put(facet, None);
        self
    }

    fn put(&mut self, facet: Facet, value: Option<FacetValue>) {
        match (facet, value) {
            (Facet::Category, None) => self.category = None,
            (Facet::OpeningSystem, None) => self.opening_system = None,
            (Facet::Shutter, None) => self.shutter = None,
            (Facet::ShutterDrive, None) => self.shutter_drive = None,
            (Facet::FillMaterial, None) => self.fill_material = None,
            (Facet::LeafCount, None) => self.leaf_count = None,
            (_, Some(FacetValue::Category(v))) => self.category = Some(v),
            (_, Some(FacetValue::OpeningSystem(v))) => self.opening_system = Some(v),
            (_, Some(FacetValue::Shutter(v))) => self.shutter = Some(v),
            (_, Some(FacetValue::ShutterDrive(v))) => self.shutter_drive = Some(v),
            (_, Some(FacetValue::FillMaterial(v))) => self.fill_material = Some(v),
            (_, Some(FacetValue::LeafCount(v))) => self.leaf_count = Some(v),
        }
    }

    /// Unset every facet whose applicability requirement does not hold.
    ///
    /// Selections built by the reducer are already normalized; documents
    /// read from storage may not be.
    pub fn normalized(mut self) -> Self {
        for facet in Facet::ORDER {
            if !facet.is_applicable(&self) {
                self.put(facet, None);
            }
        }
        self
    }
}

/// Record an answer: set the value's facet, reset every later facet, then
/// drop any conditional facet whose requirement no longer holds.
pub fn apply_selection(selections: &Selections, value: FacetValue) -> Selections {
    assign(selections, value.facet(), Some(value))
}

/// Withdraw an answer, with the same cascade as [`apply_selection`].
pub fn clear_selection(selections: &Selections, facet: Facet) -> Selections {
    assign(selections, facet, None)
}

/// Start over: every facet unset.
pub fn restart() -> Selections {
    Selections::empty()
}

fn assign(selections: &Selections, facet: Facet, value: Option<FacetValue>) -> Selections {
    let mut next = *selections;
    next.put(facet, value);
    for later in facet.later() {
        next.put(later, None);
    }
    next.normalized()
}

/// Partial selection-set: facets mentioned map to a value or to "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPatch {
    entries: BTreeMap<Facet, Option<FacetValue>>,
}

impl SelectionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, value: FacetValue) -> Self {
        self.entries.insert(value.facet(), Some(value));
        self
    }

    pub fn unset(mut self, facet: Facet) -> Self {
        self.entries.insert(facet, None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in facet order.
    pub fn entries(&self) -> impl Iterator<Item = (Facet, Option<FacetValue>)> + '_ {
        self.entries.iter().map(|(f, v)| (*f, *v))
    }

    /// Fold the patch through the reducer, in facet order.
    ///
    /// Entries restating the current value are skipped, so repeating an
    /// earlier answer does not reset the answers after it.
    pub fn apply_to(&self, selections: &Selections) -> Selections {
        self.entries()
            .fold(*selections, |acc, (facet, value)| {
                if acc.get(facet) == value {
                    acc
                } else {
                    assign(&acc, facet, value)
                }
            })
    }
}

impl From<Selections> for SelectionPatch {
    /// A patch that mentions every facet.
    fn from(selections: Selections) -> Self {
        let entries = Facet::ORDER
            .into_iter()
            .map(|f| (f, selections.get(f)))
            .collect();
        Self { entries }
    }
}
