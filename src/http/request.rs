//! Request metadata.
//!
//! # Responsibilities
//! - Name the request-id header set by the tower-http request-id layers
//! - Derive the absolute service root used in `@odata.context` and `@odata.nextLink`

use axum::http::{header, HeaderMap};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request id assigned by `SetRequestIdLayer`, or `"n/a"` outside the stack.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a")
}

/// Absolute URL of the service root, e.g. `http://localhost:8080/odata/`.
pub fn service_base(headers: &HeaderMap, service_root: &str) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}{service_root}")
}
