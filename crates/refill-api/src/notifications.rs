//! Handlers for the `/api/notifications` inbox.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/notifications` | Unread first, then newest; `?limit=` caps (default 20) |
//! | `POST` | `/api/notifications/{id}/read` | Mark one read |
//! | `POST` | `/api/notifications/read-all` | Mark all read |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use refill_core::{messenger::Messenger, notification::Notification, store::RefillStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentPharmacy,
  error::{ApiError, IntoApiError},
};

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct InboxView {
  pub notifications: Vec<Notification>,
  pub unread_count:  u64,
}

/// `GET /api/notifications[?limit=<n>]`
pub async fn list<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Query(params): Query<ListParams>,
) -> Result<Json<InboxView>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
  let notifications = state
    .store
    .list_notifications(pharmacy.pharmacy_id, limit)
    .await
    .map_err(IntoApiError::into_api_error)?;
  let unread_count = state
    .store
    .unread_count(pharmacy.pharmacy_id)
    .await
    .map_err(IntoApiError::into_api_error)?;

  Ok(Json(InboxView { notifications, unread_count }))
}

/// `POST /api/notifications/{id}/read`
pub async fn mark_read<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  state
    .store
    .mark_notification_read(pharmacy.pharmacy_id, id)
    .await
    .map_err(IntoApiError::into_api_error)?;
  Ok(Json(json!({ "ok": true })))
}

/// `POST /api/notifications/read-all`
pub async fn mark_all_read<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  state
    .store
    .mark_all_notifications_read(pharmacy.pharmacy_id)
    .await
    .map_err(IntoApiError::into_api_error)?;
  Ok(Json(json!({ "ok": true })))
}
