//! Batch scanners — the drivers of the passive status lifecycle.
//!
//! Three scanners, externally triggered, each idempotent: re-running within
//! the same dedup period produces no additional sends or status flips.
//! Records are processed sequentially; a failure on one record is captured
//! in the summary and never aborts the rest of the batch.

use chrono::{DateTime, Days, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  medicine::{Medicine, MedicineStatus},
  messenger::Messenger,
  notification::ReminderKind,
  patient::Patient,
  reminder::{self, ReminderOutcome},
  schedule::utc_day,
  store::{DueFilter, DuePredicate, RefillStore},
};

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Per-record failure detail, reported in the scan summary rather than
/// surfaced as a scan-level error.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRecordError {
  pub medicine_id:   Uuid,
  pub medicine_name: String,
  pub detail:        String,
}

/// The externally observable result of one scanner invocation.
#[derive(Debug, Default, Serialize)]
pub struct ScanSummary {
  /// Records matched by the date predicate.
  pub examined: usize,
  /// Status flips performed (missed scanner only; 0 for the others).
  pub marked_missed: usize,
  /// Outbound messages delivered.
  pub sent: usize,
  /// Records skipped: already sent within the dedup period, or no linked
  /// recipient.
  pub skipped: usize,
  /// Inbox notifications persisted.
  pub notifications_created: usize,
  pub errors: Vec<ScanRecordError>,
}

impl ScanSummary {
  fn record_error(&mut self, medicine: &Medicine, detail: impl ToString) {
    self.errors.push(ScanRecordError {
      medicine_id:   medicine.medicine_id,
      medicine_name: medicine.medicine_name.clone(),
      detail:        detail.to_string(),
    });
  }

  fn count(&mut self, outcome: ReminderOutcome) {
    match outcome {
      ReminderOutcome::Sent => {
        self.sent += 1;
        self.notifications_created += 1;
      }
      ReminderOutcome::NotifiedWithoutMessage => {
        self.skipped += 1;
        self.notifications_created += 1;
      }
      ReminderOutcome::AlreadySent | ReminderOutcome::NoRecipient => {
        self.skipped += 1;
      }
    }
  }
}

// ─── Shared per-record step ──────────────────────────────────────────────────

async fn resolve_patient<S: RefillStore>(
  store: &S,
  medicine: &Medicine,
  summary: &mut ScanSummary,
) -> Option<Patient> {
  match store.find_patient(medicine.patient_id).await {
    Ok(Some(patient)) => Some(patient),
    Ok(None) => {
      summary.record_error(
        medicine,
        format!("patient {} not found", medicine.patient_id),
      );
      None
    }
    Err(e) => {
      summary.record_error(medicine, e);
      None
    }
  }
}

// ─── Scanners ────────────────────────────────────────────────────────────────

/// Flip overdue `active` medicines to `missed` and issue a `missed`
/// reminder for each, deduped on notification existence.
pub async fn run_missed<S, M>(
  store: &S,
  messenger: &M,
  now: DateTime<Utc>,
  lookahead_days: u32,
) -> Result<ScanSummary, S::Error>
where
  S: RefillStore,
  M: Messenger,
{
  let today = utc_day(now);
  let matched = store
    .due_medicines(DueFilter {
      status: MedicineStatus::Active,
      due:    DuePredicate::Before(today),
    })
    .await?;

  let mut summary = ScanSummary { examined: matched.len(), ..Default::default() };

  for medicine in &matched {
    match store.mark_missed(medicine.medicine_id).await {
      Ok(true) => summary.marked_missed += 1,
      // Another run got there first; the reminder dedup below still applies.
      Ok(false) => {}
      Err(e) => {
        summary.record_error(medicine, e);
        continue;
      }
    }

    let Some(patient) = resolve_patient(store, medicine, &mut summary).await else {
      continue;
    };

    match reminder::process(
      store,
      messenger,
      medicine,
      &patient,
      ReminderKind::Missed,
      now,
      lookahead_days,
    )
    .await
    {
      Ok(outcome) => summary.count(outcome),
      Err(e) => summary.record_error(medicine, e),
    }
  }

  Ok(summary)
}

/// Remind for `active` medicines whose refill date is today, deduped on the
/// per-medicine `last_reminder_sent_at` stamp. Status is not changed.
pub async fn run_due_today<S, M>(
  store: &S,
  messenger: &M,
  now: DateTime<Utc>,
  lookahead_days: u32,
) -> Result<ScanSummary, S::Error>
where
  S: RefillStore,
  M: Messenger,
{
  let today = utc_day(now);
  let matched = store
    .due_medicines(DueFilter {
      status: MedicineStatus::Active,
      due:    DuePredicate::On(today),
    })
    .await?;

  let mut summary = ScanSummary { examined: matched.len(), ..Default::default() };

  for medicine in &matched {
    let Some(patient) = resolve_patient(store, medicine, &mut summary).await else {
      continue;
    };

    match reminder::process(
      store,
      messenger,
      medicine,
      &patient,
      ReminderKind::Today,
      now,
      lookahead_days,
    )
    .await
    {
      Ok(outcome) => summary.count(outcome),
      Err(e) => summary.record_error(medicine, e),
    }
  }

  Ok(summary)
}

/// Remind for `active` medicines due in `lookahead_days` days, deduped on
/// `last_upcoming_reminder_sent_at`. Status is not changed.
pub async fn run_upcoming<S, M>(
  store: &S,
  messenger: &M,
  now: DateTime<Utc>,
  lookahead_days: u32,
) -> Result<ScanSummary, S::Error>
where
  S: RefillStore,
  M: Messenger,
{
  let today = utc_day(now);
  let Some(target) = today.checked_add_days(Days::new(u64::from(lookahead_days))) else {
    return Ok(ScanSummary::default());
  };

  let matched = store
    .due_medicines(DueFilter {
      status: MedicineStatus::Active,
      due:    DuePredicate::On(target),
    })
    .await?;

  let mut summary = ScanSummary { examined: matched.len(), ..Default::default() };

  for medicine in &matched {
    let Some(patient) = resolve_patient(store, medicine, &mut summary).await else {
      continue;
    };

    match reminder::process(
      store,
      messenger,
      medicine,
      &patient,
      ReminderKind::Upcoming,
      now,
      lookahead_days,
    )
    .await
    {
      Ok(outcome) => summary.count(outcome),
      Err(e) => summary.record_error(medicine, e),
    }
  }

  Ok(summary)
}
