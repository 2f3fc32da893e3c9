use std::sync::Arc;
use std::time::Duration;

use log::debug;
use percent_encoding::percent_decode_str;
use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use serde_json::Value;

use crate::engine::routes::ApiSettings;
use crate::error::ClientError;
use crate::logutil::preview;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::Get)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::Get, path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self { method: Method::Post, path: path.into(), body }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::Put, path: path.into(), body: Some(body) }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: Method::Delete, path: path.into(), body: None }
    }
}

/// Whatever came back over the wire, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One request, one reply. Failures to get any reply at all are
/// `ClientError::MalformedResponse`.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<RawReply, ClientError>;
}

/* =========================
   HTTP
   ========================= */

pub struct HttpTransport {
    client: Client,
    jar: Arc<Jar>,
    base: String,
    csrf_cookie: String,
    csrf_header: String,
}

impl HttpTransport {
    pub fn new(settings: &ApiSettings) -> Result<Self, ClientError> {
        let base = settings.api_base.trim().trim_end_matches('/').to_string();
        Url::parse(&base)
            .map_err(|e| ClientError::transport(format!("invalid api base {base:?}: {e}")))?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(settings.request_timeout_secs.max(1)))
            .build()
            .map_err(ClientError::transport)?;

        Ok(Self {
            client,
            jar,
            base,
            csrf_cookie: settings.csrf_cookie.clone(),
            csrf_header: settings.csrf_header.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        };
        Url::parse(&joined)
            .map_err(|e| ClientError::transport(format!("invalid url {joined:?}: {e}")))
    }

    fn csrf_token(&self, url: &Url) -> Option<String> {
        let header = self.jar.cookies(url)?;
        let header = header.to_str().ok()?;
        cookie_value(header, &self.csrf_cookie)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<RawReply, ClientError> {
        let url = self.url(&request.path)?;
        debug!("{} {}", request.method.as_str(), url);

        let mut builder = match request.method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
            Method::Put => self.client.put(url.clone()),
            Method::Delete => self.client.delete(url.clone()),
        }
        .header(ACCEPT, "application/json");

        if request.method.is_mutating() && !self.csrf_header.is_empty() {
            if let Some(token) = self.csrf_token(&url) {
                builder = builder.header(self.csrf_header.as_str(), token);
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(ClientError::transport)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().map_err(ClientError::transport)?;

        debug!("{} {} -> {} {}", request.method.as_str(), url, status, preview(&body));

        Ok(RawReply { status, content_type, body })
    }
}

/// Pull one cookie out of a `Cookie:` header value (`a=1; b=2`).
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| percent_decode_str(value).decode_utf8_lossy().into_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_csrf_cookie() {
        let header = "sessionid=abc; csrftoken=tok%3D1; other=x";
        assert_eq!(cookie_value(header, "csrftoken").as_deref(), Some("tok=1"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn cookie_names_match_exactly() {
        assert_eq!(cookie_value("xcsrftoken=1", "csrftoken"), None);
    }

    #[test]
    fn only_get_is_safe() {
        assert!(!Method::Get.is_mutating());
        assert!(Method::Post.is_mutating());
        assert!(Method::Put.is_mutating());
        assert!(Method::Delete.is_mutating());
    }

    #[test]
    fn joins_paths_onto_the_base() {
        let api = ApiSettings {
            api_base: "http://127.0.0.1:8000/game/".into(),
            ..ApiSettings::default()
        };
        let transport = HttpTransport::new(&api).unwrap();
        assert_eq!(
            transport.url("/characters/1/").unwrap().as_str(),
            "http://127.0.0.1:8000/game/characters/1/"
        );
    }

    #[test]
    fn rejects_an_unparseable_base() {
        let api = ApiSettings {
            api_base: "not a url".into(),
            ..ApiSettings::default()
        };
        assert!(matches!(HttpTransport::new(&api), Err(ClientError::MalformedResponse(_))));
    }

    #[test]
    fn csrf_token_comes_from_the_jar() {
        let transport = HttpTransport::new(&ApiSettings::default()).unwrap();
        let url = transport.url("/characters/").unwrap();
        transport.jar.add_cookie_str("csrftoken=secret; Path=/", &url);
        assert_eq!(transport.csrf_token(&url).as_deref(), Some("secret"));
    }
}
