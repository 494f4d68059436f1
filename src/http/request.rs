//! Request handling.
//!
//! # Responsibilities
//! - Carry the request ID assigned by the request-id layer
//! - Read the body within the configured size limit
//! - Merge query, form and JSON parameters into a `RequestContext`
//! - Pick up credentials placed on the request by upstream auth
//!
//! # Design Decisions
//! - The body is read once, before routing; actions never see raw bytes
//! - An oversized body is rejected before any action runs

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::action::CredentialSet;
use crate::context::RequestContext;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Failure to turn a raw request into a context.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match self {
            RequestError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        };
        (status, self.to_string()).into_response()
    }
}

/// Build the per-request context from an axum request mounted under `uri_root`.
pub async fn context_from_request(
    request: Request<Body>,
    max_body_bytes: usize,
    uri_root: &str,
) -> Result<RequestContext, RequestError> {
    let (parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|_| RequestError::BodyTooLarge { limit: max_body_bytes })?;

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut builder = RequestContext::builder(parts.method.clone(), parts.uri.path())
        .query(parts.uri.query().unwrap_or_default())
        .body(content_type.as_deref(), &bytes)
        .uri_root(uri_root);

    if let Some(id) = parts.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok()) {
        builder = builder.request_id(id);
    }
    if let Some(credentials) = parts.extensions.get::<CredentialSet>() {
        builder = builder.credentials(credentials.clone());
    }

    Ok(builder.headers(parts.headers).build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[tokio::test]
    async fn test_context_from_request() {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/users/7?type=json&tag=a")
            .header(X_REQUEST_ID, "req-1")
            .header(header::HOST, "example.org")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("tag=b&name=Ada"))
            .unwrap();
        request
            .extensions_mut()
            .insert(CredentialSet::from_iter(["member"]));

        let ctx = context_from_request(request, 1024, "/app").await.unwrap();

        assert_eq!(ctx.request_id(), "req-1");
        assert_eq!(ctx.path(), "/users/7");
        assert_eq!(ctx.method(), Method::POST);
        assert_eq!(ctx.param_values("tag"), vec!["a", "b"]);
        assert_eq!(ctx.param("name").as_deref(), Some("Ada"));
        assert_eq!(ctx.format().as_deref().map(String::as_str), Some("json"));
        assert!(ctx.credentials().contains("member"));
        assert_eq!(ctx.request_base().as_deref(), Some("http://example.org/app/"));
    }

    #[tokio::test]
    async fn test_body_limit() {
        let request = Request::builder()
            .uri("/")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();

        let err = context_from_request(request, 16, "/").await.unwrap_err();
        assert!(matches!(err, RequestError::BodyTooLarge { limit: 16 }));
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
