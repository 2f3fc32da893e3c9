use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::model::game_state::EntityId;

/// Path templates of the game API, relative to `ApiSettings::api_base`.
/// `{id}` is replaced by the character id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Routes {
    pub classes: String,
    pub create: String,
    pub character: String,
    pub encounter: String,
    pub battle: String,
    pub weapon: String,
    pub level_up: String,
    pub delete: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            classes: "/classes/".into(),
            create: "/characters/".into(),
            character: "/characters/{id}/".into(),
            encounter: "/characters/{id}/battle/".into(),
            battle: "/characters/{id}/battle/".into(),
            weapon: "/characters/{id}/weapon/".into(),
            level_up: "/characters/{id}/level-up/".into(),
            delete: "/characters/{id}/".into(),
        }
    }
}

impl Routes {
    pub fn expand(template: &str, id: &EntityId) -> String {
        let id = id.to_string();
        let encoded = utf8_percent_encode(&id, NON_ALPHANUMERIC).to_string();
        template.replace("{id}", &encoded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub csrf_cookie: String,
    pub csrf_header: String,
    pub routes: Routes,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8000".into(),
            request_timeout_secs: 10,
            csrf_cookie: "csrftoken".into(),
            csrf_header: "X-CSRFToken".into(),
            routes: Routes::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_numeric_ids() {
        let routes = Routes::default();
        assert_eq!(
            Routes::expand(&routes.battle, &EntityId::Number(12)),
            "/characters/12/battle/"
        );
    }

    #[test]
    fn text_ids_are_percent_encoded() {
        assert_eq!(
            Routes::expand("/characters/{id}/", &EntityId::Text("a b/c".into())),
            "/characters/a%20b%2Fc/"
        );
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let text = r#"{"api_base": "http://game.local", "routes": {"classes": "/api/classes/"}}"#;
        let api: ApiSettings = serde_json::from_str(text).unwrap();
        assert_eq!(api.api_base, "http://game.local");
        assert_eq!(api.routes.classes, "/api/classes/");
        assert_eq!(api.routes.create, "/characters/");
        assert_eq!(api.csrf_header, "X-CSRFToken");
    }
}
