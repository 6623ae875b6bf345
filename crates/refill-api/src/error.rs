//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("messaging error: {0}")]
  Messaging(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map the domain taxonomy onto HTTP semantics. Illegal status
  /// transitions and validation failures are the caller's fault; a purge
  /// blocked by history is a conflict; everything "who?" is a 404.
  pub fn from_core(e: refill_core::Error) -> Self {
    use refill_core::Error as E;
    match e {
      E::Validation(_)
      | E::InvalidDosage(_)
      | E::CannotRefillStopped
      | E::OnlyStoppedCanResume
      | E::AlreadyStopped => ApiError::BadRequest(e.to_string()),
      E::MedicineNotFound(_)
      | E::PatientNotFound(_)
      | E::PharmacyNotFound(_)
      | E::NotificationNotFound(_) => ApiError::NotFound(e.to_string()),
      E::DeletionConflict(_) => ApiError::Conflict(e.to_string()),
    }
  }
}

/// Conversion seam between a backend's error type and [`ApiError`].
///
/// Handlers are generic over the store; this trait lets each backend decide
/// which of its failures are domain errors (with real HTTP statuses) and
/// which are plain 500s.
pub trait IntoApiError: std::error::Error + Send + Sync + Sized + 'static {
  fn into_api_error(self) -> ApiError;
}

impl IntoApiError for refill_store_sqlite::Error {
  fn into_api_error(self) -> ApiError {
    match self {
      refill_store_sqlite::Error::Core(core) => ApiError::from_core(core),
      other => ApiError::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(_) | ApiError::Messaging(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if let ApiError::Unauthorized = self {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"refill\""),
      );
    }
    res
  }
}
