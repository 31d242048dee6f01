//! Proptest strategies shared by the engine's unit tests.

use proptest::prelude::*;

use fenestra_catalog::{Category, FillMaterial, LeafCount, OpeningSystem, Shutter, ShutterDrive};

use crate::facet::FacetValue;
use crate::selection::Selections;

pub(crate) fn any_value() -> impl Strategy<Value = FacetValue> {
    prop_oneof![
        prop::sample::select(Category::ALL).prop_map(FacetValue::Category),
        prop::sample::select(OpeningSystem::ALL).prop_map(FacetValue::OpeningSystem),
        prop::sample::select(Shutter::ALL).prop_map(FacetValue::Shutter),
        prop::sample::select(ShutterDrive::ALL).prop_map(FacetValue::ShutterDrive),
        prop::sample::select(FillMaterial::ALL).prop_map(FacetValue::FillMaterial),
        (1u8..=8).prop_map(|n| FacetValue::LeafCount(LeafCount::new(n).unwrap())),
    ]
}

/// Arbitrary selection-sets, including ones the reducer would never produce.
pub(crate) fn any_selections() -> impl Strategy<Value = Selections> {
    prop::collection::vec(any_value(), 0..8)
        .prop_map(|values| values.into_iter().fold(Selections::empty(), Selections::with))
}
