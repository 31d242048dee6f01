//! Presentation model.
//!
//! Turns an [`EngineResult`] into what a front end shows: a question with
//! option cards, a list of product cards, or one of the two terminal messages.
//! Rendering to an actual surface is left to the presenter.

use serde::Serialize;

use fenestra_catalog::{Product, Shutter, WidthRange};

use crate::facet::{Facet, FacetValue};
use crate::resolver::{EngineResult, Step};

/// Image used for an option no candidate illustrates.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/400x300/E2E8F0/333?text=Op%C3%A7%C3%A3o";

pub const NO_MATCH_MESSAGE: &str = "Nenhum produto encontrado para os filtros atuais.";

pub const UNAVAILABLE_MESSAGE: &str =
    "O configurador está indisponível no momento. Tente novamente mais tarde.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionCard {
    pub facet: Facet,
    /// Option code, sent back as the click payload.
    pub value: String,
    pub label: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCard {
    pub title: String,
    pub chips: Vec<String>,
    pub image: String,
    pub link: String,
    pub width: WidthRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfiguratorView {
    Question {
        facet: Facet,
        prompt: String,
        options: Vec<OptionCard>,
    },
    Products {
        heading: String,
        cards: Vec<ProductCard>,
    },
    NoMatch {
        message: String,
    },
    Unavailable {
        message: String,
    },
}

impl ConfiguratorView {
    pub fn unavailable() -> Self {
        ConfiguratorView::Unavailable {
            message: UNAVAILABLE_MESSAGE.to_string(),
        }
    }

    /// Prompt of the question being asked, if any.
    pub fn prompt(&self) -> Option<&str> {
        match self {
            ConfiguratorView::Question { prompt, .. } => Some(prompt),
            _ => None,
        }
    }
}

/// Build the view for a resolver result.
pub fn render(result: &EngineResult, product_base_url: &str) -> ConfiguratorView {
    match &result.step {
        Step::Ask(question) => ConfiguratorView::Question {
            facet: question.facet,
            prompt: question.prompt.to_string(),
            options: question
                .options
                .iter()
                .map(|value| option_card(question.facet, value, &result.products))
                .collect(),
        },
        Step::Final if result.products.is_empty() => ConfiguratorView::NoMatch {
            message: NO_MATCH_MESSAGE.to_string(),
        },
        Step::Final => {
            let heading = if result.products.len() == 1 {
                "Produto final determinado:"
            } else {
                "Produtos correspondentes:"
            };
            ConfiguratorView::Products {
                heading: heading.to_string(),
                cards: result
                    .products
                    .iter()
                    .map(|p| product_card(p, product_base_url))
                    .collect(),
            }
        }
    }
}

fn option_card(facet: Facet, value: &FacetValue, candidates: &[Product]) -> OptionCard {
    let image = candidates
        .iter()
        .find(|p| facet.attribute_of(p).as_ref() == Some(value))
        .map(|p| p.image().to_string())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    OptionCard {
        facet,
        value: value.code(),
        label: value.label(),
        image,
    }
}

fn product_card(product: &Product, base_url: &str) -> ProductCard {
    let title = format!(
        "{} {}",
        FacetValue::Category(product.category()).label(),
        FacetValue::OpeningSystem(product.opening_system()).label()
    );

    let mut chips = Vec::new();
    if product.shutter() == Shutter::Yes {
        chips.push(FacetValue::Shutter(Shutter::Yes).label());
        if let Some(drive) = product.shutter_drive() {
            chips.push(FacetValue::ShutterDrive(drive).label());
        }
    }
    chips.push(FacetValue::FillMaterial(product.fill_material()).label());
    chips.push(FacetValue::LeafCount(product.leaf_count()).label());

    ProductCard {
        title,
        chips,
        image: product.image().to_string(),
        link: product.link(base_url),
        width: product.width(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::selection::{Selections, apply_selection};
    use fenestra_catalog::{Catalog, DEFAULT_PRODUCT_BASE_URL};

    fn pick(selections: &Selections, facet: Facet, code: &str) -> Selections {
        apply_selection(selections, FacetValue::parse(facet, code).unwrap())
    }

    #[test]
    fn question_view_has_one_card_per_option_with_a_candidate_image() {
        let catalog = Catalog::embedded().unwrap();
        let view = render(&resolve(&Selections::empty(), &catalog), DEFAULT_PRODUCT_BASE_URL);

        match view {
            ConfiguratorView::Question { facet, prompt, options } => {
                assert_eq!(facet, Facet::Category);
                assert_eq!(prompt, "O que você procura?");
                let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
                assert_eq!(labels, vec!["Janela", "Porta"]);
                assert!(options[0].image.contains("janela"));
                assert!(options[1].image.contains("porta"));
            }
            other => panic!("expected a question, got {other:?}"),
        }
    }

    #[test]
    fn single_product_view_has_title_chips_and_link() {
        let catalog = Catalog::embedded().unwrap();
        let s = pick(&Selections::empty(), Facet::Category, "janela");
        let s = pick(&s, Facet::OpeningSystem, "janela-correr");
        let s = pick(&s, Facet::Shutter, "sim");
        let s = pick(&s, Facet::ShutterDrive, "motorizada");

        match render(&resolve(&s, &catalog), DEFAULT_PRODUCT_BASE_URL) {
            ConfiguratorView::Products { heading, cards } => {
                assert_eq!(heading, "Produto final determinado:");
                assert_eq!(cards.len(), 1);
                let card = &cards[0];
                assert_eq!(card.title, "Janela de Correr");
                assert_eq!(
                    card.chips,
                    vec!["Persiana Integrada", "Motorizada", "Vidro", "2 Folhas"]
                );
                assert!(card.link.starts_with(DEFAULT_PRODUCT_BASE_URL));
                assert!(card.link.ends_with("motorizada-30.php"));
            }
            other => panic!("expected products, got {other:?}"),
        }
    }

    #[test]
    fn empty_final_renders_no_match_message() {
        let catalog = Catalog::embedded().unwrap();
        let s = pick(&Selections::empty(), Facet::Category, "janela");
        let s = pick(&s, Facet::OpeningSystem, "giro");

        let view = render(&resolve(&s, &catalog), DEFAULT_PRODUCT_BASE_URL);
        assert_eq!(
            view,
            ConfiguratorView::NoMatch {
                message: NO_MATCH_MESSAGE.to_string()
            }
        );
        assert!(view.prompt().is_none());
    }

    #[test]
    fn unavailable_is_distinct_from_no_match() {
        let view = ConfiguratorView::unavailable();
        assert_ne!(
            view,
            ConfiguratorView::NoMatch {
                message: NO_MATCH_MESSAGE.to_string()
            }
        );
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "unavailable");
    }
}
