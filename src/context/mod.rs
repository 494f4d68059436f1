//! Per-request context.
//!
//! # Responsibilities
//! - Expose request path, method, headers and merged parameters
//! - Carry the routing decision (action, output format) and response status
//! - Hold attributes written by actions and read by format renderers
//!
//! # Design Decisions
//! - One context per request, shared by the actions of a batch through `Arc`
//! - Mutable state is interior so concurrent actions need no external lock
//! - Nothing in a context outlives its request

pub mod params;

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::action::CredentialSet;

/// Parameter that lets a request declare its output format.
pub const FORMAT_PARAM: &str = "type";

/// State of a single request, from routing to rendering.
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    method: Method,
    path: String,
    headers: HeaderMap,
    credentials: CredentialSet,
    params: DashMap<String, Vec<String>>,
    attributes: DashMap<String, Value>,
    action: ArcSwapOption<String>,
    format: ArcSwapOption<String>,
    status: AtomicU16,
    uri_root: String,
}

impl RequestContext {
    pub fn builder(method: Method, path: impl Into<String>) -> RequestContextBuilder {
        RequestContextBuilder::new(method, path)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Credentials held by the requesting user.
    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    /// First value of a parameter.
    pub fn param(&self, key: &str) -> Option<String> {
        self.params.get(key).and_then(|values| values.first().cloned())
    }

    pub fn param_or(&self, key: &str, default: &str) -> String {
        self.param(key).unwrap_or_else(|| default.to_string())
    }

    /// Every value of a parameter, in arrival order.
    pub fn param_values(&self, key: &str) -> Vec<String> {
        self.params
            .get(key)
            .map(|values| values.clone())
            .unwrap_or_default()
    }

    /// Replace all values of a parameter.
    pub fn set_param(&self, key: impl Into<String>, values: Vec<String>) {
        self.params.insert(key.into(), values);
    }

    /// Append one value to a parameter.
    pub fn add_param(&self, key: impl Into<String>, value: impl Into<String>) {
        self.params.entry(key.into()).or_default().push(value.into());
    }

    pub fn param_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.params.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.attributes.get(key).map(|v| v.value().clone())
    }

    /// Identifier of the action selected by the router.
    pub fn action(&self) -> Option<Arc<String>> {
        self.action.load_full()
    }

    pub fn set_action(&self, action: impl Into<String>) {
        self.action.store(Some(Arc::new(action.into())));
    }

    /// Output format requested by a rule or by the request itself.
    pub fn format(&self) -> Option<Arc<String>> {
        self.format.load_full()
    }

    pub fn set_format(&self, format: impl Into<String>) {
        self.format.store(Some(Arc::new(format.into())));
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status.load(Ordering::Relaxed)).unwrap_or(StatusCode::OK)
    }

    pub fn set_status(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::Relaxed);
    }

    /// Path the application is mounted under, always with leading and trailing `/`.
    pub fn uri_root(&self) -> &str {
        &self.uri_root
    }

    /// Absolute address of the application root as the client sees it,
    /// e.g. `https://example.org/app/`. `None` without a Host header.
    pub fn request_base(&self) -> Option<String> {
        let host = self.header("x-forwarded-host").or_else(|| self.header("host"))?;
        let scheme = self.header("x-forwarded-proto").unwrap_or("http");
        Some(format!("{scheme}://{host}{}", self.uri_root))
    }
}

fn normalize_root(root: &str) -> String {
    let trimmed = root.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

/// Assembles a [`RequestContext`] from request pieces.
#[derive(Debug)]
pub struct RequestContextBuilder {
    request_id: Option<String>,
    method: Method,
    path: String,
    headers: HeaderMap,
    credentials: CredentialSet,
    params: Vec<(String, String)>,
    uri_root: String,
}

impl RequestContextBuilder {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: None,
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            credentials: CredentialSet::default(),
            params: Vec::new(),
            uri_root: "/".to_string(),
        }
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Add a header. Names or values that are not valid HTTP are dropped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn credentials(mut self, credentials: CredentialSet) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn uri_root(mut self, root: &str) -> Self {
        self.uri_root = normalize_root(root);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Merge parameters from a raw query string.
    pub fn query(mut self, raw: &str) -> Self {
        self.params.extend(params::parse_urlencoded(raw));
        self
    }

    /// Merge parameters from a request body.
    ///
    /// Urlencoded forms and JSON objects are understood; anything else is ignored.
    pub fn body(mut self, content_type: Option<&str>, body: &[u8]) -> Self {
        if body.is_empty() {
            return self;
        }
        let content_type = content_type.unwrap_or_default();
        if content_type.starts_with("application/x-www-form-urlencoded") {
            self.params
                .extend(params::parse_urlencoded(&String::from_utf8_lossy(body)));
        } else if let Some(pairs) = params::parse_json_object(body) {
            self.params.extend(pairs);
        } else {
            tracing::debug!(content_type, bytes = body.len(), "Request body carries no parameters");
        }
        self
    }

    pub fn build(self) -> RequestContext {
        let params: DashMap<String, Vec<String>> = DashMap::new();
        for (key, value) in self.params {
            params.entry(key).or_default().push(value);
        }

        let declared_format = params
            .get(FORMAT_PARAM)
            .and_then(|values| values.first().cloned())
            .map(Arc::new);

        RequestContext {
            request_id: self
                .request_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            method: self.method,
            path: self.path,
            headers: self.headers,
            credentials: self.credentials,
            params,
            attributes: DashMap::new(),
            action: ArcSwapOption::empty(),
            format: ArcSwapOption::from(declared_format),
            status: AtomicU16::new(StatusCode::OK.as_u16()),
            uri_root: self.uri_root,
        }
    }
}
