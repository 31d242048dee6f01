//! Facet resolution engine.
//!
//! Pure, deterministic logic (no IO, no storage):
//! - [`facet`]: the ordered facet table and facet values
//! - [`selection`]: the selection-set and the cascade-reset reducer
//! - [`resolver`]: candidate filtering, forced narrowing and next-question choice
//! - [`view`]: the presentation model derived from a resolver result

pub mod facet;
pub mod resolver;
pub mod selection;
pub mod view;

#[cfg(test)]
mod test_support;

pub use facet::{FACETS, Facet, FacetDefinition, FacetValue, Requirement};
pub use resolver::{EngineResult, Question, Step, filter_products, matches, resolve, unique_options};
pub use selection::{SelectionPatch, Selections, apply_selection, clear_selection, restart};
pub use view::{ConfiguratorView, NO_MATCH_MESSAGE, OptionCard, ProductCard, render};
