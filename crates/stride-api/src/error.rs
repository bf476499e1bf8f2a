//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;

use stride_core::error::ErrorKind;

/// An error returned by an API handler.
#[derive(Debug)]
pub enum ApiError {
  BadRequest(String),
  Unauthorized,
  NotFound(String),
  Conflict(String),
  Internal(String),
}

impl From<stride_core::Error> for ApiError {
  fn from(e: stride_core::Error) -> Self {
    let message = e.to_string();
    match e.kind() {
      ErrorKind::Validation => Self::BadRequest(message),
      ErrorKind::NotFound => Self::NotFound(message),
      ErrorKind::Conflict => Self::Conflict(message),
      ErrorKind::Storage => Self::Internal(message),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
      Self::NotFound(m) => (StatusCode::NOT_FOUND, m),
      Self::Conflict(m) => (StatusCode::CONFLICT, m),
      Self::Internal(m) => {
        tracing::error!("internal error: {m}");
        (StatusCode::INTERNAL_SERVER_ERROR, m)
      }
    };

    let mut response =
      (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static("Basic realm=\"stride\""),
      );
    }
    response
  }
}
