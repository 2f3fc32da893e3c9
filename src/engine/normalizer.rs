use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::engine::transport::RawReply;
use crate::error::ClientError;
use crate::model::character::CharacterRecord;
use crate::model::game_state::{BattleOutcome, CharacterClass, MonsterRecord, Weapon};

/// Canonical reading of any game response, whatever shape it came in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedResponse {
    pub character: Option<CharacterRecord>,
    pub monster: Option<MonsterRecord>,
    /// `None` means no battle took place.
    pub outcome: Option<BattleOutcome>,
    pub drop: Option<Weapon>,
    pub battle_log: Vec<String>,
    pub game_won: Option<bool>,
    pub character_health: Option<i64>,
    pub monster_health: Option<i64>,
}

/// Drop keys in order of preference.
const DROP_KEYS: [&str; 3] = ["weapon_drop", "drop", "reward_weapon"];

pub fn normalize(reply: &RawReply) -> Result<NormalizedResponse, ClientError> {
    match decode_body(reply)? {
        Some(value) => normalize_value(value),
        None => Ok(NormalizedResponse::default()),
    }
}

/// The encounter endpoint answers with a bare monster object.
pub fn decode_monster(reply: &RawReply) -> Result<MonsterRecord, ClientError> {
    let value = decode_body(reply)?
        .ok_or_else(|| ClientError::malformed("empty monster response"))?;
    let object = into_object(value)?;
    let payload = match object.get("monster") {
        Some(monster @ Value::Object(_)) => monster.clone(),
        _ => Value::Object(object),
    };
    typed(payload, "monster")
}

/// The catalogue endpoint answers with a JSON array of classes.
pub fn decode_classes(reply: &RawReply) -> Result<Vec<CharacterClass>, ClientError> {
    match decode_body(reply)? {
        Some(value @ Value::Array(_)) => typed(value, "class catalogue"),
        Some(_) => Err(ClientError::malformed("class catalogue is not a JSON array")),
        None => Ok(Vec::new()),
    }
}

pub fn normalize_value(value: Value) -> Result<NormalizedResponse, ClientError> {
    let payload = into_object(value)?;

    let character = match payload.get("character") {
        Some(Value::Null) | None if payload.contains_key("id") && payload.contains_key("name") => {
            Some(typed(Value::Object(payload.clone()), "character")?)
        }
        Some(Value::Null) | None => None,
        Some(embedded) => Some(typed(embedded.clone(), "character")?),
    };

    let monster = match payload.get("monster") {
        Some(Value::Null) | None => None,
        Some(embedded) => Some(typed(embedded.clone(), "monster")?),
    };

    let drop = DROP_KEYS
        .iter()
        .find_map(|key| payload.get(*key).filter(|v| !v.is_null()))
        .map(|v| typed::<Weapon>(v.clone(), "weapon drop"))
        .transpose()?;

    let outcome = match payload.get("result") {
        Some(Value::Null) | None => None,
        Some(Value::String(raw)) => Some(BattleOutcome::from_wire(raw)),
        Some(other) => Some(BattleOutcome::Other(other.to_string())),
    };

    let battle_log = match payload.get("battle_log") {
        Some(Value::Array(lines)) => lines.iter().map(text_of).collect(),
        Some(Value::String(line)) => vec![line.clone()],
        _ => Vec::new(),
    };

    Ok(NormalizedResponse {
        character,
        monster,
        outcome,
        drop,
        battle_log,
        game_won: payload.get("game_won").and_then(Value::as_bool),
        character_health: payload.get("character_health").and_then(Value::as_i64),
        monster_health: payload.get("monster_health").and_then(Value::as_i64),
    })
}

/* =========================
   Body decoding
   ========================= */

/// Status and content checks shared by every endpoint. `Ok(None)` is an
/// empty body on a success status.
fn decode_body(reply: &RawReply) -> Result<Option<Value>, ClientError> {
    if is_html(reply) {
        let detail = html_heading(&reply.body)
            .map(|heading| format!("Server error: {heading}"))
            .unwrap_or_else(|| "server returned HTML instead of JSON".to_string());
        return Err(ClientError::MalformedResponse(detail));
    }

    let text = reply.body.trim();
    if text.is_empty() {
        return if reply.is_success() {
            Ok(None)
        } else {
            Err(ClientError::Application(format!("Server error: {}", reply.status)))
        };
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| ClientError::malformed(format!("invalid JSON ({e})")))?;

    if !reply.is_success() {
        let message = error_text(&value, &["error", "detail"])
            .unwrap_or_else(|| format!("Server error: {}", reply.status));
        return Err(ClientError::Application(message));
    }
    if let Some(message) = error_text(&value, &["error"]) {
        return Err(ClientError::Application(message));
    }

    Ok(Some(value))
}

fn is_html(reply: &RawReply) -> bool {
    let by_header = reply
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));
    let lowered: String = reply
        .body
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    by_header || lowered.starts_with("<!doctype") || lowered.starts_with("<html")
}

/// Text of the `<title>`, else the first `<h1>`.
fn html_heading(body: &str) -> Option<String> {
    let lowered = body.to_ascii_lowercase();
    ["title", "h1"].iter().find_map(|tag| {
        let open = lowered.find(&format!("<{tag}"))?;
        let start = open + lowered[open..].find('>')? + 1;
        let end = start + lowered[start..].find(&format!("</{tag}"))?;
        let text = body[start..end].trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

fn error_text(value: &Value, keys: &[&str]) -> Option<String> {
    let object = value.as_object()?;
    keys.iter()
        .find_map(|key| object.get(*key).filter(|v| !v.is_null()))
        .map(text_of)
}

/// A JSON string holding JSON text counts as that text.
fn into_object(value: Value) -> Result<Map<String, Value>, ClientError> {
    match value {
        Value::Object(object) => Ok(object),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(object)) => Ok(object),
            _ => Err(ClientError::malformed("expected a JSON object, got text")),
        },
        other => Err(ClientError::malformed(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn typed<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ClientError> {
    serde_json::from_value(value)
        .map_err(|e| ClientError::malformed(format!("unreadable {what}: {e}")))
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
