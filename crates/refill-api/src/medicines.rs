//! Handlers for `/api/medicines` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/api/medicines` | Optional `?patient_id=` filter |
//! | `POST`   | `/api/medicines` | Body: [`NewMedicine`]; returns 201 |
//! | `GET`    | `/api/medicines/{id}` | Single medicine |
//! | `PATCH`  | `/api/medicines/{id}/status` | Body: `{"action":"refill"\|"stop"\|"resume"}` |
//! | `GET`    | `/api/medicines/{id}/refills` | Refill history, newest first |
//! | `DELETE` | `/api/medicines/{id}` | Soft delete |
//! | `DELETE` | `/api/medicines/{id}/purge` | Hard delete; 409 while history exists |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use refill_core::{
  lifecycle::{self, RefillLog},
  medicine::{Medicine, NewMedicine, StatusAction},
  messenger::Messenger,
  schedule::utc_day,
  store::RefillStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentPharmacy,
  error::{ApiError, IntoApiError},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub patient_id: Option<Uuid>,
}

/// `GET /api/medicines[?patient_id=<id>]`
pub async fn list<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Medicine>>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let medicines = state
    .store
    .list_medicines(pharmacy.pharmacy_id, params.patient_id)
    .await
    .map_err(IntoApiError::into_api_error)?;
  Ok(Json(medicines))
}

/// `POST /api/medicines` — the refill date comes back computed; any value
/// supplied by the client is ignored by deserialisation.
pub async fn create<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Json(body): Json<NewMedicine>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let medicine = state
    .store
    .add_medicine(pharmacy.pharmacy_id, body)
    .await
    .map_err(IntoApiError::into_api_error)?;
  Ok((StatusCode::CREATED, Json(medicine)))
}

/// `GET /api/medicines/{id}`
pub async fn get_one<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Path(id): Path<Uuid>,
) -> Result<Json<Medicine>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let medicine = state
    .store
    .get_medicine(pharmacy.pharmacy_id, id)
    .await
    .map_err(IntoApiError::into_api_error)?
    .ok_or_else(|| ApiError::NotFound(format!("medicine {id} not found")))?;
  Ok(Json(medicine))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub action: StatusAction,
}

/// `PATCH /api/medicines/{id}/status` — plans the transition against the
/// current row, then applies it as one unit. Illegal transitions are 400s.
pub async fn update_status<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Medicine>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let medicine = state
    .store
    .get_medicine(pharmacy.pharmacy_id, id)
    .await
    .map_err(IntoApiError::into_api_error)?
    .ok_or_else(|| ApiError::NotFound(format!("medicine {id} not found")))?;

  let today = utc_day(Utc::now());
  let transition = lifecycle::plan_transition(&medicine, body.action, today)
    .map_err(ApiError::from_core)?;

  let updated = state
    .store
    .apply_transition(pharmacy.pharmacy_id, id, transition)
    .await
    .map_err(IntoApiError::into_api_error)?;

  tracing::info!(
    medicine_id = %id,
    action = %body.action,
    status = %updated.status,
    "status action applied"
  );
  Ok(Json(updated))
}

/// `GET /api/medicines/{id}/refills`
pub async fn refill_history<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<RefillLog>>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let logs = state
    .store
    .list_refill_logs(pharmacy.pharmacy_id, id)
    .await
    .map_err(IntoApiError::into_api_error)?;
  Ok(Json(logs))
}

/// `DELETE /api/medicines/{id}` — soft delete, always permitted.
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
    .soft_delete_medicine(pharmacy.pharmacy_id, id)
    .await
    .map_err(IntoApiError::into_api_error)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/medicines/{id}/purge` — refused with 409 while refill
/// history exists; the audit trail wins.
pub async fn purge_one<S, M>(
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
    .purge_medicine(pharmacy.pharmacy_id, id)
    .await
    .map_err(IntoApiError::into_api_error)?;
  Ok(StatusCode::NO_CONTENT)
}
