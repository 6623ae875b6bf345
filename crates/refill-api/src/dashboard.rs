//! Handler for `GET /api/dashboard/summary`.

use axum::{Json, extract::State};
use chrono::{Days, Utc};
use refill_core::{
  medicine::MedicineStatus,
  messenger::Messenger,
  schedule::utc_day,
  store::RefillStore,
};
use serde::Serialize;

use crate::{
  AppState,
  auth::CurrentPharmacy,
  error::{ApiError, IntoApiError},
};

#[derive(Debug, Serialize)]
pub struct Summary {
  pub patients:  usize,
  pub medicines: usize,
  /// Active medicines whose refill date is today's UTC civil day.
  pub due_today: usize,
  /// Active medicines due within the configured lookahead window
  /// (tomorrow up to and including today + lookahead).
  pub upcoming:  usize,
  pub missed:    usize,
}

/// `GET /api/dashboard/summary` — bucketed with the same UTC-civil-day
/// arithmetic the scanners use, so the dashboard and the reminder runs
/// never disagree about what "today" means.
pub async fn summary<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
) -> Result<Json<Summary>, ApiError>
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
  let medicines = state
    .store
    .list_medicines(pharmacy.pharmacy_id, None)
    .await
    .map_err(IntoApiError::into_api_error)?;

  let today = utc_day(Utc::now());
  let horizon = today.checked_add_days(Days::new(u64::from(state.config.lookahead_days)));

  let mut summary = Summary {
    patients:  patients.len(),
    medicines: medicines.len(),
    due_today: 0,
    upcoming:  0,
    missed:    0,
  };
  for m in &medicines {
    match m.status {
      MedicineStatus::Missed => summary.missed += 1,
      MedicineStatus::Active if m.refill_date == today => summary.due_today += 1,
      MedicineStatus::Active
        if m.refill_date > today && horizon.is_some_and(|h| m.refill_date <= h) =>
      {
        summary.upcoming += 1
      }
      _ => {}
    }
  }

  Ok(Json(summary))
}
