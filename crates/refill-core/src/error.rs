//! Error types for `refill-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or malformed input on a create/update operation.
  #[error("{0}")]
  Validation(String),

  /// Ownership checks are folded into lookups: a medicine owned by another
  /// pharmacy reports as not found, never as forbidden.
  #[error("medicine not found: {0}")]
  MedicineNotFound(Uuid),

  #[error("patient not found: {0}")]
  PatientNotFound(Uuid),

  #[error("pharmacy not found: {0}")]
  PharmacyNotFound(Uuid),

  #[error("notification not found: {0}")]
  NotificationNotFound(Uuid),

  /// A refill-date computation was requested with a non-positive divisor.
  #[error("invalid dosage per day: {0}")]
  InvalidDosage(f64),

  #[error("cannot refill a stopped medicine")]
  CannotRefillStopped,

  #[error("only stopped medicines can be resumed")]
  OnlyStoppedCanResume,

  #[error("medicine is already stopped")]
  AlreadyStopped,

  /// Hard delete requested for a medicine that has refill history.
  #[error("medicine {0} has refill history and cannot be purged")]
  DeletionConflict(Uuid),
}

impl Error {
  /// True for any status-action rejected by the lifecycle table.
  pub fn is_illegal_transition(&self) -> bool {
    matches!(
      self,
      Self::CannotRefillStopped | Self::OnlyStoppedCanResume | Self::AlreadyStopped
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
