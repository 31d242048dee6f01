//! Store snapshot types.

use serde::{Deserialize, Serialize};

use fenestra_core::SessionId;
use fenestra_engine::Selections;

/// Contact details collected during the chat, plus the hand-off flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_phone: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    /// The user asked to talk to a specialist.
    #[serde(default)]
    pub talk_to_human: bool,
}

impl UserData {
    /// Phone or e-mail is known (blank strings do not count).
    pub fn has_contact(&self) -> bool {
        is_filled(&self.user_phone) || is_filled(&self.user_email)
    }

    pub fn has_name(&self) -> bool {
        is_filled(&self.user_name)
    }
}

fn is_filled(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Partial user data; `Some` fields overwrite, `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataPatch {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_phone: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub talk_to_human: Option<bool>,
}

impl UserDataPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn talk_to_human(flag: bool) -> Self {
        Self {
            talk_to_human: Some(flag),
            ..Self::default()
        }
    }

    pub fn merge_into(&self, current: &UserData) -> UserData {
        UserData {
            user_name: self.user_name.clone().or_else(|| current.user_name.clone()),
            user_phone: self.user_phone.clone().or_else(|| current.user_phone.clone()),
            user_email: self.user_email.clone().or_else(|| current.user_email.clone()),
            talk_to_human: self.talk_to_human.unwrap_or(current.talk_to_human),
        }
    }
}

/// Everything the store holds. Returned by value: callers get their own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Unset until a session document exists; persistence is skipped meanwhile.
    pub session_id: Option<SessionId>,
    pub user_data: UserData,
    pub product_choice: Selections,
}
