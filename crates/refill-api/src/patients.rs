//! Handlers for `/api/patients` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/api/patients` | All of the pharmacy's patients |
//! | `POST`   | `/api/patients` | Body: name + phone; returns 201 |
//! | `GET`    | `/api/patients/{id}` | Patient plus their medicines |
//! | `DELETE` | `/api/patients/{id}` | Soft delete, cascading to medicines |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use refill_core::{
  medicine::Medicine,
  messenger::Messenger,
  patient::{NewPatient, Patient},
  store::RefillStore,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentPharmacy,
  error::{ApiError, IntoApiError},
};

/// `GET /api/patients`
pub async fn list<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
) -> Result<Json<Vec<Patient>>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let patients = state
    .store
    .list_patients(pharmacy.pharmacy_id)
    .await
    .map_err(IntoApiError::into_api_error)?;
  Ok(Json(patients))
}

/// `POST /api/patients` — returns 201 + the stored patient with its
/// normalised phone number.
pub async fn create<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Json(body): Json<NewPatient>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let patient = state
    .store
    .add_patient(pharmacy.pharmacy_id, body)
    .await
    .map_err(IntoApiError::into_api_error)?;
  Ok((StatusCode::CREATED, Json(patient)))
}

#[derive(Debug, Serialize)]
pub struct PatientDetail {
  pub patient:   Patient,
  pub medicines: Vec<Medicine>,
}

/// `GET /api/patients/{id}` — 404 covers both "does not exist" and "owned
/// by another pharmacy".
pub async fn get_one<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Path(id): Path<Uuid>,
) -> Result<Json<PatientDetail>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let patient = state
    .store
    .get_patient(pharmacy.pharmacy_id, id)
    .await
    .map_err(IntoApiError::into_api_error)?
    .ok_or_else(|| ApiError::NotFound(format!("patient {id} not found")))?;

  let medicines = state
    .store
    .list_medicines(pharmacy.pharmacy_id, Some(id))
    .await
    .map_err(IntoApiError::into_api_error)?;

  Ok(Json(PatientDetail { patient, medicines }))
}

/// `DELETE /api/patients/{id}`
pub async fn delete_one<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  state
    .store
    .soft_delete_patient(pharmacy.pharmacy_id, id)
    .await
    .map_err(IntoApiError::into_api_error)?;
  Ok(StatusCode::NO_CONTENT)
}
