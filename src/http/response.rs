//! Response handling.
//!
//! # Responsibilities
//! - Turn a `Rendered` result into status, headers and body
//! - Map controller errors to HTTP status codes
//!
//! # Design Decisions
//! - Server errors never leak internal detail to the client; the cause
//!   is logged where it happened
//! - A suppressed render produces an empty body, not an error

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::controller::ControllerError;
use crate::render::Rendered;

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body.map(Body::from).unwrap_or_else(Body::empty));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        if let Some(content_type) = self.content_type.as_deref().and_then(|v| HeaderValue::from_str(v).ok()) {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        if let Some(location) = self.location {
            match HeaderValue::from_str(&location) {
                Ok(value) => {
                    headers.insert(header::LOCATION, value);
                }
                Err(_) => tracing::warn!(location = %location, "Dropping invalid Location header"),
            }
        }

        response
    }
}

impl IntoResponse for ControllerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            self.to_string()
        };
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderError;

    #[test]
    fn test_rendered_headers() {
        let response = Rendered {
            status: StatusCode::FOUND,
            content_type: None,
            body: None,
            location: Some("/home".into()),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/home");
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_error_statuses() {
        let cases = [
            (ControllerError::NoMatch("/x".into()), StatusCode::NOT_FOUND),
            (ControllerError::UnknownAction("X".into()), StatusCode::NOT_FOUND),
            (ControllerError::CredentialDenied("X".into()), StatusCode::FORBIDDEN),
            (
                ControllerError::Render(RenderError::NoRendererResolved(Some("xml".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
