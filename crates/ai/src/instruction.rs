//! Decoding of the assistant's structured data.
//!
//! The assistant answers free-form JSON. Nothing in it is trusted: every
//! field is validated here, and whatever cannot be understood becomes
//! [`Instruction::Unrecognized`] instead of reaching the store.

use serde_json::{Map, Number, Value as JsonValue};

use fenestra_engine::{Facet, FacetValue, SelectionPatch};
use fenestra_state::UserDataPatch;

/// What an assistant reply asks the configurator to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Merge these facet values into the product selection.
    ProductChoice(SelectionPatch),
    /// Merge these fields into the user data.
    UserData(UserDataPatch),
    /// The reply carries no structured data.
    None,
    Unrecognized { reason: String },
}

impl Instruction {
    fn unrecognized(reason: impl Into<String>) -> Self {
        Instruction::Unrecognized {
            reason: reason.into(),
        }
    }
}

/// Facet addressed by a payload key; document keys and assistant schema keys
/// are both accepted.
fn facet_for_key(key: &str) -> Option<Facet> {
    match key {
        "categoria" | "type" => Some(Facet::Category),
        "sistema" | "mechanism" => Some(Facet::OpeningSystem),
        "persiana" | "shutter" => Some(Facet::Shutter),
        "motorizada" | "persianaMotorizada" | "motorized" => Some(Facet::ShutterDrive),
        "material" => Some(Facet::FillMaterial),
        "folhas" | "leaves" => Some(Facet::LeafCount),
        _ => None,
    }
}

/// Decode the `data` member of a reply.
pub fn decode(data: Option<&JsonValue>) -> Instruction {
    let fields = match data {
        None | Some(JsonValue::Null) => return Instruction::None,
        Some(JsonValue::Object(fields)) => fields,
        Some(other) => {
            return Instruction::unrecognized(format!("data is not an object: {other}"));
        }
    };
    if fields.is_empty() {
        return Instruction::None;
    }

    if fields.get("talkToHuman") == Some(&JsonValue::Bool(true)) {
        tracing::warn!("legacy talkToHuman flag in assistant data; expected target 'user-data'");
        return Instruction::UserData(UserDataPatch::talk_to_human(true));
    }

    let target = fields.get("target").and_then(JsonValue::as_str);
    let payload = fields.get("payload");
    let (Some(target), Some(payload)) = (target, payload) else {
        return Instruction::unrecognized("data is missing 'target' or 'payload'");
    };
    let Some(payload) = payload.as_object() else {
        return Instruction::unrecognized(format!("payload for '{target}' is not an object"));
    };

    match target {
        "product-choice" => decode_product_choice(payload),
        "user-data" | "user" => decode_user_data(payload),
        other => Instruction::unrecognized(format!("unknown target '{other}'")),
    }
}

fn decode_product_choice(payload: &Map<String, JsonValue>) -> Instruction {
    let mut patch = SelectionPatch::new();

    for (key, raw) in payload {
        let Some(facet) = facet_for_key(key) else {
            tracing::debug!(key = %key, "ignoring unknown product-choice field");
            continue;
        };
        // Null or blank means "not mentioned", never "clear".
        let code = match raw {
            JsonValue::Null => continue,
            JsonValue::String(s) if s.trim().is_empty() => continue,
            JsonValue::String(s) => s.trim().to_string(),
            JsonValue::Number(n) => number_code(n),
            other => {
                return Instruction::unrecognized(format!("field '{key}' has unsupported value {other}"));
            }
        };
        match FacetValue::parse(facet, &code) {
            Ok(value) => patch = patch.set(value),
            Err(err) => return Instruction::unrecognized(format!("field '{key}': {err}")),
        }
    }

    if patch.is_empty() {
        Instruction::None
    } else {
        Instruction::ProductChoice(patch)
    }
}

/// Integral numbers render without a fraction (`2.0` → `"2"`), so a float
/// leaf count still matches the integer codes.
fn number_code(n: &Number) -> String {
    if let Some(whole) = n.as_u64() {
        return whole.to_string();
    }
    match n.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => (f as u64).to_string(),
        _ => n.to_string(),
    }
}

fn decode_user_data(payload: &Map<String, JsonValue>) -> Instruction {
    let text = |key: &str| {
        payload
            .get(key)
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let patch = UserDataPatch {
        user_name: text("userName"),
        user_phone: text("userPhone"),
        user_email: text("userEmail"),
        talk_to_human: payload.get("talkToHuman").and_then(JsonValue::as_bool),
    };

    if patch.is_empty() {
        Instruction::None
    } else {
        Instruction::UserData(patch)
    }
}
