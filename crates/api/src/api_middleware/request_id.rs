//! Request ID middleware: generates or extracts a per-request identifier and
//! attaches it to a `RequestContext` stored in request extensions, so later
//! middleware (`sentinel_auth::auth_middleware`) and handlers can read and
//! extend the same context instead of each minting their own. Mirrors the
//! teacher's `request_id_middleware` shape, trimmed to the fields
//! `sentinel_core::RequestContext` actually carries (no source IP, user
//! agent or correlation ID enrichment — this `RequestContext` is identity +
//! request id only).

use axum::{
    extract::Request,
    http::{header::HeaderValue, HeaderName, StatusCode},
    middleware::Next,
    response::Response,
};
use sentinel_core::RequestContext;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn request_id_middleware(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let request_id = extract_or_generate_request_id(&request);

    let context = RequestContext::new().with_request_id(request_id.clone());
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_str(REQUEST_ID_HEADER).unwrap(), header_value);
    }

    debug!(request_id = %request_id, status = %response.status(), "request completed");

    Ok(response)
}

fn extract_or_generate_request_id(request: &Request) -> String {
    const CANDIDATE_HEADERS: &[&str] = &[REQUEST_ID_HEADER, "x-correlation-id", "x-trace-id", "request-id"];

    for header_name in CANDIDATE_HEADERS {
        if let Some(value) = request.headers().get(*header_name) {
            if let Ok(id_str) = value.to_str() {
                if is_valid_request_id(id_str) {
                    return id_str.to_string();
                }
            }
        }
    }

    Uuid::new_v4().to_string()
}

fn is_valid_request_id(id: &str) -> bool {
    if Uuid::from_str(id).is_ok() {
        return true;
    }
    id.len() <= 128 && id.len() >= 8 && id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

/// Convenience accessor used by handlers that want the request id without
/// pulling in the `RequestContext` extractor directly.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for Request {
    fn request_id(&self) -> Option<&str> {
        self.extensions().get::<RequestContext>().map(|ctx| ctx.request_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn generates_request_id_when_absent() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_id_middleware));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let header = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert!(is_valid_request_id(header));
    }

    #[tokio::test]
    async fn preserves_existing_request_id() {
        let existing_id = "test-request-id-12345";

        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_id_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, existing_id)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let returned = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert_eq!(returned, existing_id);
    }

    #[test]
    fn rejects_too_short_or_too_long_ids() {
        assert!(!is_valid_request_id("abc"));
        assert!(!is_valid_request_id(&"a".repeat(129)));
        assert!(is_valid_request_id("test-request-123"));
    }
}
