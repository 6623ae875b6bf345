//! HTTP Basic-auth extractor resolving a pharmacy identity, plus the
//! shared-secret check for the scanner trigger endpoints.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use refill_core::{pharmacy::Pharmacy, store::RefillStore};

use crate::{AppState, error::{ApiError, IntoApiError}};

/// The authenticated pharmacy, resolved from Basic-auth credentials.
/// Present in a handler's arguments means the request was authenticated.
pub struct CurrentPharmacy(pub Pharmacy);

fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

/// Resolve and verify Basic-auth credentials against the stored pharmacy
/// record. An unknown email and a wrong password are indistinguishable to
/// the caller.
pub async fn verify_pharmacy<S>(
  headers: &HeaderMap,
  store: &S,
) -> Result<Pharmacy, ApiError>
where
  S: RefillStore,
  S::Error: IntoApiError,
{
  let (email, password) = basic_credentials(headers)?;

  let pharmacy = store
    .find_pharmacy_by_email(&email)
    .await
    .map_err(IntoApiError::into_api_error)?
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash =
    PasswordHash::new(&pharmacy.password_hash).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(pharmacy)
}

/// Shared-secret check for the scanner trigger endpoints: the `x-cron-key`
/// header must match the configured value exactly.
pub fn verify_cron_key(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
  let provided = headers
    .get("x-cron-key")
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;
  if provided != expected {
    return Err(ApiError::Unauthorized);
  }
  Ok(())
}

impl<S, M> FromRequestParts<AppState<S, M>> for CurrentPharmacy
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: refill_core::messenger::Messenger + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, M>,
  ) -> Result<Self, Self::Rejection> {
    let pharmacy = verify_pharmacy(&parts.headers, state.store.as_ref()).await?;
    Ok(CurrentPharmacy(pharmacy))
  }
}
