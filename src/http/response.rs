//! OData response envelopes and error mapping.
//!
//! # Responsibilities
//! - Wrap payloads with `@odata.context`, `@odata.count` and `@odata.nextLink`
//! - Set `OData-Version: 4.0` and the minimal-metadata content type
//! - Map every layer's error onto a status code and the OData error body
//!   `{"error":{"code":"…","message":"…"}}`

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::books::ServiceError;
use crate::odata::{CollectionPage, PathError, QueryError};

pub const ODATA_VERSION: &str = "OData-Version";
pub const ODATA_JSON: &str = "application/json;odata.metadata=minimal";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("invalid request body: {0}")]
    Body(String),

    #[error("method {method} is not allowed on this resource")]
    MethodNotAllowed {
        method: String,
        allowed: &'static [&'static str],
    },

    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Path(PathError::UnknownSegment(_)) => StatusCode::NOT_FOUND,
            ApiError::Path(PathError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Service(ServiceError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::InvariantViolation(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable `error.code`.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Path(PathError::UnknownSegment(_)) => "ResourceNotFound",
            ApiError::Path(PathError::InvalidKey(_)) => "InvalidKey",
            ApiError::Query(_) => "InvalidQueryOption",
            ApiError::Service(ServiceError::NotFound(_)) => "EntityNotFound",
            ApiError::Service(ServiceError::InvalidInput(_)) => "InvalidInput",
            ApiError::Service(ServiceError::InvariantViolation(_)) => "InvariantViolation",
            ApiError::Body(_) => "InvalidRequestBody",
            ApiError::MethodNotAllowed { .. } => "MethodNotAllowed",
            ApiError::Serialization(_) => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }

        let mut response = error_response(status, self.code(), &self.to_string());
        if let ApiError::MethodNotAllowed { allowed, .. } = &self {
            if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}

/// OData error body with the given status.
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = json!({ "error": { "code": code, "message": message } });
    (status, [(ODATA_VERSION, "4.0")], Json(body)).into_response()
}

/// Any OData JSON document.
pub fn document(body: Value) -> Response {
    (
        [(header::CONTENT_TYPE.as_str(), ODATA_JSON), (ODATA_VERSION, "4.0")],
        body.to_string(),
    )
        .into_response()
}

/// Single entity: its properties next to `@odata.context`.
pub fn entity(context: String, value: Value) -> Response {
    let mut body = Map::new();
    body.insert("@odata.context".into(), Value::String(context));
    match value {
        Value::Object(properties) => body.extend(properties),
        other => {
            body.insert("value".into(), other);
        }
    }
    document(Value::Object(body))
}

/// Primitive result of a function, wrapped in `value`.
pub fn primitive(context: String, value: Value) -> Response {
    document(json!({ "@odata.context": context, "value": value }))
}

/// Collection page, with count and continuation when present.
pub fn collection(context: String, page: CollectionPage, next_link: Option<String>) -> Response {
    let mut body = Map::new();
    body.insert("@odata.context".into(), Value::String(context));
    if let Some(count) = page.count {
        body.insert("@odata.count".into(), json!(count));
    }
    body.insert("value".into(), Value::Array(page.items));
    if let Some(link) = next_link {
        body.insert("@odata.nextLink".into(), Value::String(link));
    }
    document(Value::Object(body))
}

/// Raw `/$count` response.
pub fn plain_count(count: usize) -> Response {
    (
        [
            (header::CONTENT_TYPE.as_str(), "text/plain"),
            (ODATA_VERSION, "4.0"),
        ],
        count.to_string(),
    )
        .into_response()
}
