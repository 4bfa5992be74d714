//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use troth_core::ErrorKind;

/// An error returned by an API handler. Wraps the core error and maps its
/// kind onto an HTTP status; the concrete message rides along in the body.
#[derive(Debug)]
pub struct ApiError(pub troth_core::Error);

impl From<troth_core::Error> for ApiError {
  fn from(e: troth_core::Error) -> Self { Self(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.0.kind();
    let status = match kind {
      ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
      ErrorKind::NotFound => StatusCode::NOT_FOUND,
      ErrorKind::Forbidden => StatusCode::FORBIDDEN,
      ErrorKind::Conflict => StatusCode::CONFLICT,
      ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
      ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
      status,
      Json(json!({
        "error": self.0.to_string(),
        "kind": kind.as_str(),
      })),
    )
      .into_response()
  }
}
