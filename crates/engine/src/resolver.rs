//! Facet resolution.
//!
//! Given the user's answers and the catalog, decide whether the candidate set
//! is settled or which facet to ask about next. Facets with a single possible
//! answer are filled in automatically, so the user is never asked a question
//! with one option.
//!
//! The resolver is a total, pure function: same inputs, same [`EngineResult`],
//! no IO beyond a warning log for data anomalies.

use fenestra_catalog::{Catalog, Product};

use crate::facet::{Facet, FacetValue};
use crate::selection::Selections;

/// The next question to put to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub facet: Facet,
    pub prompt: &'static str,
    /// At least two values, in presentation order.
    pub options: Vec<FacetValue>,
}

/// What the resolver decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Still narrowing: ask this.
    Ask(Question),
    /// Nothing left to ask; the candidates are the answer (possibly none, possibly several).
    Final,
}

/// Derived view of a selection-set. Recomputed on every change, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResult {
    /// Input selections plus any auto-selected facets.
    pub selections: Selections,
    /// Products matching `selections`.
    pub products: Vec<Product>,
    pub step: Step,
    /// Facets that had candidates but no values among them.
    pub anomalies: Vec<Facet>,
}

impl EngineResult {
    pub fn is_final(&self) -> bool {
        matches!(self.step, Step::Final)
    }

    pub fn question(&self) -> Option<&Question> {
        match &self.step {
            Step::Ask(q) => Some(q),
            Step::Final => None,
        }
    }

    /// Final with an empty candidate set: the chosen path has no product.
    pub fn is_no_match(&self) -> bool {
        self.is_final() && self.products.is_empty()
    }
}

/// Resolve the next step for `selections` against `catalog`.
pub fn resolve(selections: &Selections, catalog: &Catalog) -> EngineResult {
    let mut working = *selections;
    let mut anomalies = Vec::new();

    for facet in Facet::ORDER {
        if !facet.is_applicable(&working) || working.is_set(facet) {
            continue;
        }

        let candidates = filter_products(&working, catalog);
        if candidates.len() <= 1 {
            return EngineResult {
                selections: working,
                products: candidates.into_iter().cloned().collect(),
                step: Step::Final,
                anomalies,
            };
        }

        let options = unique_options(facet, candidates.iter().copied());
        match options.len() {
            0 => {
                tracing::warn!(
                    facet = %facet,
                    candidates = candidates.len(),
                    "no candidate carries a value for this facet; leaving it unresolved"
                );
                anomalies.push(facet);
            }
            1 => {
                tracing::debug!(facet = %facet, value = %options[0], "auto-selected forced facet");
                working = working.with(options[0]);
            }
            _ => {
                return EngineResult {
                    selections: working,
                    products: candidates.into_iter().cloned().collect(),
                    step: Step::Ask(Question {
                        facet,
                        prompt: facet.definition().prompt,
                        options,
                    }),
                    anomalies,
                };
            }
        }
    }

    let products = filter_products(&working, catalog)
        .into_iter()
        .cloned()
        .collect();
    EngineResult {
        selections: working,
        products,
        step: Step::Final,
        anomalies,
    }
}

/// Whether `product` satisfies every set, applicable facet of `selections`.
///
/// Unset facets impose no constraint.
pub fn matches(product: &Product, selections: &Selections) -> bool {
    Facet::ORDER.into_iter().all(|facet| {
        if !facet.is_applicable(selections) {
            return true;
        }
        match selections.get(facet) {
            None => true,
            Some(wanted) => facet.attribute_of(product) == Some(wanted),
        }
    })
}

/// Candidate set: catalog products consistent with `selections`, in catalog order.
pub fn filter_products<'a>(selections: &Selections, catalog: &'a Catalog) -> Vec<&'a Product> {
    catalog.iter().filter(|p| matches(p, selections)).collect()
}

/// Distinct values of `facet` across `products`, in presentation order.
pub fn unique_options<'a>(
    facet: Facet,
    products: impl IntoIterator<Item = &'a Product>,
) -> Vec<FacetValue> {
    let mut options: Vec<FacetValue> = Vec::new();
    for value in products.into_iter().filter_map(|p| facet.attribute_of(p)) {
        if !options.contains(&value) {
            options.push(value);
        }
    }
    options.sort_by(|a, b| a.presentation_cmp(b));
    options
}
