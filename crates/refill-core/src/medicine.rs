//! Medicine — the record the scheduling engine revolves around.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Enumerated condition category for a medicine.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum Condition {
  #[serde(rename = "BP")]
  #[strum(serialize = "BP")]
  Bp,
  Diabetes,
  Thyroid,
  Other,
}

/// Lifecycle status. `missed` is set only by the missed-refill scanner and
/// cleared the moment a refill succeeds; `stopped` is the only state a
/// medicine can be resumed from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MedicineStatus {
  Active,
  Missed,
  Stopped,
}

/// User-triggered status action; see [`crate::lifecycle::plan_transition`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatusAction {
  Refill,
  Stop,
  Resume,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
  pub medicine_id:   Uuid,
  pub pharmacy_id:   Uuid,
  pub patient_id:    Uuid,
  pub medicine_name: String,
  pub condition:     Condition,
  /// Doses consumed per day; strictly positive.
  pub dosage_per_day: f64,
  /// Units dispensed at the last refill event.
  pub tablets_given:  u32,
  pub start_date:     NaiveDate,
  /// Derived: `start_date + floor(tablets_given / dosage_per_day)` days.
  /// Recomputed on creation, refill, and resume; never client-supplied.
  pub refill_date:    NaiveDate,
  pub status:         MedicineStatus,
  /// Last "due today" reminder stamp; the per-calendar-day dedup field.
  pub last_reminder_sent_at: Option<DateTime<Utc>>,
  /// Last "due soon" reminder stamp.
  pub last_upcoming_reminder_sent_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Medicine {
  pub fn is_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }
}

/// Input to [`crate::store::RefillStore::add_medicine`].
///
/// `refill_date` and `status` are never accepted from callers: the store
/// computes the former and defaults the latter to `active`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMedicine {
  pub patient_id:     Uuid,
  pub medicine_name:  String,
  pub condition:      Condition,
  pub dosage_per_day: f64,
  pub tablets_given:  u32,
  pub start_date:     NaiveDate,
}

impl NewMedicine {
  pub fn validate(&self) -> crate::Result<()> {
    if self.medicine_name.trim().is_empty() {
      return Err(crate::Error::Validation("medicine name is required".into()));
    }
    if !(self.dosage_per_day > 0.0) {
      return Err(crate::Error::InvalidDosage(self.dosage_per_day));
    }
    Ok(())
  }
}
