//! Handler for pharmacy registration.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/pharmacies` | Body: [`RegisterBody`]; returns 201 + the pharmacy |
//!
//! Registration is the only unauthenticated write: everything else requires
//! Basic auth with the registered email and password.

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rand_core::OsRng;
use refill_core::{messenger::Messenger, pharmacy::NewPharmacy, store::RefillStore};
use serde::Deserialize;

use crate::{AppState, error::{ApiError, IntoApiError}};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

/// `POST /api/pharmacies` — the password is hashed here at the edge; the
/// store only ever sees the PHC string.
pub async fn register<S, M>(
  State(state): State<AppState<S, M>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  if body.password.len() < 8 {
    return Err(ApiError::BadRequest(
      "password must be at least 8 characters".into(),
    ));
  }

  let salt = SaltString::generate(&mut OsRng);
  let password_hash = Argon2::default()
    .hash_password(body.password.as_bytes(), &salt)
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))?
    .to_string();

  let pharmacy = state
    .store
    .add_pharmacy(NewPharmacy {
      name: body.name,
      email: body.email,
      password_hash,
    })
    .await
    .map_err(IntoApiError::into_api_error)?;

  tracing::info!(pharmacy_id = %pharmacy.pharmacy_id, "pharmacy registered");
  Ok((StatusCode::CREATED, Json(pharmacy)))
}
