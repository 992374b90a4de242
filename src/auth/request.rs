//! Request/response seams the dispatcher works against, plus the axum adapter

use axum::{
    body::{to_bytes, Body},
    extract::{MatchedPath, Request},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Upper bound on buffered request bodies when reading credentials
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// What the dispatcher needs to know about the inbound request
pub trait RequestContext: Send + Sync {
    /// Header value by case-insensitive name
    fn header(&self, name: &str) -> Option<&str>;

    /// Whether a header with this name was sent, whatever its value
    fn has_header(&self, name: &str) -> bool;

    /// Request parameter (query for GET, body otherwise)
    fn param(&self, name: &str) -> Option<&str>;

    fn current_action_id(&self) -> &str;
}

pub trait ResponseSink: Send {
    fn set_status_code(&mut self, status: u16);
}

/// Records the status chosen on a failure path
#[derive(Debug, Default)]
pub struct StatusSink {
    status: Option<StatusCode>,
}

impl StatusSink {
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

impl ResponseSink for StatusSink {
    fn set_status_code(&mut self, status: u16) {
        self.status = StatusCode::from_u16(status).ok();
    }
}

/// [`RequestContext`] backed by an axum request
#[derive(Debug, Clone, Default)]
pub struct HttpRequestContext {
    headers: HeaderMap,
    params: HashMap<String, String>,
    action_id: String,
}

impl HttpRequestContext {
    pub fn new(headers: HeaderMap, params: HashMap<String, String>, action_id: impl Into<String>) -> Self {
        Self {
            headers,
            params,
            action_id: action_id.into(),
        }
    }

    /// Buffer the request, collect headers/params and hand back an equivalent
    /// request for the downstream handler.
    pub async fn from_request(req: Request) -> Result<(Self, Request), Response> {
        let action_id = action_id(&req);
        let (parts, body) = req.into_parts();

        let bytes = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
            tracing::debug!("Failed to read request body: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Unable to read request body" })),
            )
                .into_response()
        })?;

        let params = if parts.method == Method::GET || parts.method == Method::HEAD {
            parts.uri.query().map(parse_form).unwrap_or_default()
        } else {
            let content_type = parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if content_type.starts_with("application/json") {
                parse_json(&bytes)
            } else {
                parse_form(&String::from_utf8_lossy(&bytes))
            }
        };

        let context = Self::new(parts.headers.clone(), params, action_id);
        let req = Request::from_parts(parts, Body::from(bytes));

        Ok((context, req))
    }
}

impl RequestContext for HttpRequestContext {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn current_action_id(&self) -> &str {
        &self.action_id
    }
}

/// Last path segment of the matched route, e.g. `/auth/register` -> `register`
fn action_id(req: &Request) -> String {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str())
        .unwrap_or_else(|| req.uri().path());

    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn parse_form(input: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(input.as_bytes())
        .into_owned()
        .collect()
}

/// Scalar members of a JSON object body; nested values are ignored
fn parse_json(bytes: &[u8]) -> HashMap<String, String> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                Value::Number(n) => Some((k, n.to_string())),
                Value::Bool(b) => Some((k, b.to_string())),
                _ => None,
            })
            .collect(),
        _ => HashMap::new(),
    }
}
