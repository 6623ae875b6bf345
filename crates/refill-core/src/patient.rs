//! Patient — owned by exactly one pharmacy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
  pub patient_id:  Uuid,
  pub pharmacy_id: Uuid,
  pub name:        String,
  /// Digits-only with country-code prefix; see [`normalize_phone`].
  pub phone:       String,
  /// Chat recipient identifier, set once the patient completes the
  /// out-of-band linking step. `None` until then.
  pub chat_id:     Option<String>,
  pub created_at:  DateTime<Utc>,
  /// Soft-delete marker. A deleted patient is excluded from every scoped
  /// read, and its medicines are soft-deleted with it.
  pub deleted_at:  Option<DateTime<Utc>>,
}

impl Patient {
  pub fn is_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }
}

/// Input to [`crate::store::RefillStore::add_patient`].
/// The phone number is normalised by the store before persisting.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
  pub name:  String,
  pub phone: String,
}

impl NewPatient {
  pub fn validate(&self) -> crate::Result<()> {
    if self.name.trim().is_empty() {
      return Err(crate::Error::Validation("patient name is required".into()));
    }
    if !self.phone.chars().any(|c| c.is_ascii_digit()) {
      return Err(crate::Error::Validation("patient phone is required".into()));
    }
    Ok(())
  }
}

/// Canonical international-dialing form: digits only, with a 10-digit
/// number assumed domestic and prefixed with the country code.
pub fn normalize_phone(phone: &str) -> String {
  let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
  if digits.len() == 10 && !digits.starts_with("91") {
    format!("91{digits}")
  } else {
    digits
  }
}
