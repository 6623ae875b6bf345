//! Scanner trigger endpoints.
//!
//! The scanners have no internal clock; an external scheduler POSTs these
//! endpoints with the `x-cron-key` shared secret. Per-record failures are
//! reported inside the summary; only a scan-level store failure is an HTTP
//! error.
//!
//! | Method | Path | Scanner |
//! |--------|------|---------|
//! | `POST` | `/api/cron/mark-missed` | overdue `active` → `missed` + reminders |
//! | `POST` | `/api/cron/refills-today` | due-today reminders |
//! | `POST` | `/api/cron/refills-upcoming` | lookahead reminders |

use axum::{Json, extract::State, http::HeaderMap};
use chrono::Utc;
use refill_core::{messenger::Messenger, scan::{self, ScanSummary}, store::RefillStore};
use serde_json::json;

use crate::{
  AppState,
  auth::verify_cron_key,
  error::{ApiError, IntoApiError},
};

fn summary_response(name: &str, summary: ScanSummary) -> Json<serde_json::Value> {
  if !summary.errors.is_empty() {
    tracing::warn!(
      scanner = name,
      failed = summary.errors.len(),
      "scan completed with per-record failures"
    );
  }
  tracing::info!(
    scanner = name,
    examined = summary.examined,
    sent = summary.sent,
    skipped = summary.skipped,
    "scan finished"
  );
  Json(json!({
    "ok": true,
    "ran_at": Utc::now().to_rfc3339(),
    "summary": summary,
  }))
}

/// `POST /api/cron/mark-missed`
pub async fn mark_missed<S, M>(
  State(state): State<AppState<S, M>>,
  headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  verify_cron_key(&headers, &state.config.cron_key)?;
  let summary = scan::run_missed(
    state.store.as_ref(),
    state.messenger.as_ref(),
    Utc::now(),
    state.config.lookahead_days,
  )
  .await
  .map_err(IntoApiError::into_api_error)?;
  Ok(summary_response("mark-missed", summary))
}

/// `POST /api/cron/refills-today`
pub async fn refills_today<S, M>(
  State(state): State<AppState<S, M>>,
  headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  verify_cron_key(&headers, &state.config.cron_key)?;
  let summary = scan::run_due_today(
    state.store.as_ref(),
    state.messenger.as_ref(),
    Utc::now(),
    state.config.lookahead_days,
  )
  .await
  .map_err(IntoApiError::into_api_error)?;
  Ok(summary_response("refills-today", summary))
}

/// `POST /api/cron/refills-upcoming`
pub async fn refills_upcoming<S, M>(
  State(state): State<AppState<S, M>>,
  headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  verify_cron_key(&headers, &state.config.cron_key)?;
  let summary = scan::run_upcoming(
    state.store.as_ref(),
    state.messenger.as_ref(),
    Utc::now(),
    state.config.lookahead_days,
  )
  .await
  .map_err(IntoApiError::into_api_error)?;
  Ok(summary_response("refills-upcoming", summary))
}
