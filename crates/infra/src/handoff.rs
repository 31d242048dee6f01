//! Specialist hand-off.
//!
//! Once the user asks for a human, the bot collects a name, then a phone
//! number or e-mail, and finally offers a WhatsApp link pre-filled with the
//! user's choices.

use fenestra_engine::Selections;
use fenestra_state::AppState;

pub const ASK_NAME: &str = "Com quem eu falo?";
pub const ASK_CONTACT: &str =
    "Vou passar você para um especialista. Qual seu telefone ou e-mail?";
pub const LINK_TEXT: &str = "Clique aqui para falar com um especialista.";

const WHATSAPP_SEND_URL: &str = "https://api.whatsapp.com/send";
const NO_CHOICE_TEXT: &str = "esquadrias sob medida";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffStep {
    /// Post this question.
    Ask(&'static str),
    /// Post the link and clear the hand-off flag.
    Connect { url: String },
}

/// Tracks the hand-off conversation so the same question is not repeated.
#[derive(Debug, Clone)]
pub struct HandoffFlow {
    phone: String,
    last_question: Option<&'static str>,
}

impl HandoffFlow {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            last_question: None,
        }
    }

    /// Decide what to do for a new state, if anything.
    pub fn evaluate(&mut self, state: &AppState) -> Option<HandoffStep> {
        let user = &state.user_data;
        if !user.talk_to_human {
            self.last_question = None;
            return None;
        }

        let question = if !user.has_name() {
            ASK_NAME
        } else if !user.has_contact() {
            ASK_CONTACT
        } else {
            self.last_question = None;
            let name = user.user_name.as_deref().unwrap_or("Cliente");
            return Some(HandoffStep::Connect {
                url: whatsapp_link(&self.phone, name, &state.product_choice),
            });
        };

        if self.last_question == Some(question) {
            return None;
        }
        self.last_question = Some(question);
        Some(HandoffStep::Ask(question))
    }
}

/// `https://api.whatsapp.com/send?phone=..&text=..` with the choice summary.
pub fn whatsapp_link(phone: &str, user_name: &str, selections: &Selections) -> String {
    let chosen: Vec<String> = selections.chosen().map(|v| v.code()).collect();
    let interest = if chosen.is_empty() {
        NO_CHOICE_TEXT.to_string()
    } else {
        chosen.join("\n")
    };
    let text = format!("Olá, meu nome é {user_name},\nTenho interesse em:\n{interest}");

    let params = [("phone", phone), ("text", text.as_str())];
    match reqwest::Url::parse_with_params(WHATSAPP_SEND_URL, params) {
        Ok(url) => url.into(),
        // The base URL is a constant; parsing it cannot fail.
        Err(_) => format!("{WHATSAPP_SEND_URL}?phone={phone}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fenestra_engine::{Facet, FacetValue, apply_selection};
    use fenestra_state::UserData;

    fn state(user_data: UserData, product_choice: Selections) -> AppState {
        AppState {
            session_id: None,
            user_data,
            product_choice,
        }
    }

    fn asking(name: Option<&str>, phone: Option<&str>) -> UserData {
        UserData {
            user_name: name.map(str::to_string),
            user_phone: phone.map(str::to_string),
            user_email: None,
            talk_to_human: true,
        }
    }

    fn query_text(url: &str) -> String {
        reqwest::Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "text")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn idle_without_the_flag() {
        let mut flow = HandoffFlow::new("5511976810216");
        assert_eq!(flow.evaluate(&AppState::default()), None);
    }

    #[test]
    fn asks_for_name_then_contact_without_repeating() {
        let mut flow = HandoffFlow::new("5511976810216");

        let s = state(asking(None, None), Selections::empty());
        assert_eq!(flow.evaluate(&s), Some(HandoffStep::Ask(ASK_NAME)));
        assert_eq!(flow.evaluate(&s), None);

        let s = state(asking(Some("Ana"), None), Selections::empty());
        assert_eq!(flow.evaluate(&s), Some(HandoffStep::Ask(ASK_CONTACT)));
        assert_eq!(flow.evaluate(&s), None);
    }

    #[test]
    fn question_is_asked_again_after_the_flag_was_cleared() {
        let mut flow = HandoffFlow::new("5511976810216");
        let waiting = state(asking(None, None), Selections::empty());

        assert!(flow.evaluate(&waiting).is_some());
        assert_eq!(flow.evaluate(&AppState::default()), None);
        assert_eq!(flow.evaluate(&waiting), Some(HandoffStep::Ask(ASK_NAME)));
    }

    #[test]
    fn connects_with_chosen_values_once_contact_is_known() {
        let mut flow = HandoffFlow::new("5511976810216");
        let choice = apply_selection(
            &Selections::empty(),
            FacetValue::parse(Facet::Category, "porta").unwrap(),
        );
        let choice = apply_selection(&choice, FacetValue::parse(Facet::OpeningSystem, "giro").unwrap());

        match flow.evaluate(&state(asking(Some("Ana"), Some("11 99999-0000")), choice)) {
            Some(HandoffStep::Connect { url }) => {
                assert!(url.starts_with("https://api.whatsapp.com/send?phone=5511976810216&text="));
                assert_eq!(
                    query_text(&url),
                    "Olá, meu nome é Ana,\nTenho interesse em:\nporta\ngiro"
                );
            }
            other => panic!("expected a link, got {other:?}"),
        }
    }

    #[test]
    fn link_without_choices_mentions_custom_frames() {
        let url = whatsapp_link("5511976810216", "Bia", &Selections::empty());
        assert!(query_text(&url).ends_with("Tenho interesse em:\nesquadrias sob medida"));
    }
}
