//! Status lifecycle — legal transitions and the refill history record.
//!
//! [`plan_transition`] is a pure function from (medicine, action, today) to
//! a [`Transition`]; the store applies a transition as a single unit (status
//! write, refill-date write, history append). The passive `active → missed`
//! flip is the scanners' business, not a user action, and does not pass
//! through here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  medicine::{Medicine, MedicineStatus, StatusAction},
  schedule,
};

// ─── Refill history ──────────────────────────────────────────────────────────

/// Immutable, append-only record of one dispensing event. Written exactly
/// once per successful refill; never mutated or deleted. Doubles as the
/// guard against purging a medicine that has history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefillLog {
  pub log_id:        Uuid,
  pub pharmacy_id:   Uuid,
  pub patient_id:    Uuid,
  pub medicine_id:   Uuid,
  /// The civil date of this dispensing event.
  pub refill_date:   NaiveDate,
  pub tablets_given: u32,
  pub created_at:    DateTime<Utc>,
}

/// History entry carried inside a [`Transition`]. The owning ids are filled
/// in by the store from the medicine row it is updating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefillLog {
  pub refill_date:   NaiveDate,
  pub tablets_given: u32,
}

// ─── Transition ──────────────────────────────────────────────────────────────

/// The computed outcome of a legal status action.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
  pub status:      MedicineStatus,
  /// `Some` when the action recomputes the refill date (refill, resume).
  pub refill_date: Option<NaiveDate>,
  /// `Some` only for refill — resume is not a dispensing event.
  pub log:         Option<NewRefillLog>,
}

/// Decide what a status action does to `medicine`, or why it is illegal.
///
/// | action   | allowed from       | result                                      |
/// |----------|--------------------|---------------------------------------------|
/// | `refill` | `active`, `missed` | `active`, refill date from today, log entry |
/// | `stop`   | `active`, `missed` | `stopped`                                   |
/// | `resume` | `stopped`          | `active`, refill date from today, no log    |
pub fn plan_transition(
  medicine: &Medicine,
  action: StatusAction,
  today: NaiveDate,
) -> Result<Transition> {
  // Every action requires a refillable dosage, even `stop` — a medicine
  // with a corrupt dosage must be fixed, not shuffled between states.
  if !(medicine.dosage_per_day > 0.0) {
    return Err(Error::InvalidDosage(medicine.dosage_per_day));
  }

  match action {
    StatusAction::Refill => {
      if medicine.status == MedicineStatus::Stopped {
        return Err(Error::CannotRefillStopped);
      }
      let refill_date =
        schedule::compute_refill_date(today, medicine.tablets_given, medicine.dosage_per_day)?;
      Ok(Transition {
        status:      MedicineStatus::Active,
        refill_date: Some(refill_date),
        log:         Some(NewRefillLog {
          refill_date:   today,
          tablets_given: medicine.tablets_given,
        }),
      })
    }

    StatusAction::Stop => {
      if medicine.status == MedicineStatus::Stopped {
        return Err(Error::AlreadyStopped);
      }
      Ok(Transition {
        status:      MedicineStatus::Stopped,
        refill_date: None,
        log:         None,
      })
    }

    StatusAction::Resume => {
      if medicine.status != MedicineStatus::Stopped {
        return Err(Error::OnlyStoppedCanResume);
      }
      let refill_date =
        schedule::compute_refill_date(today, medicine.tablets_given, medicine.dosage_per_day)?;
      Ok(Transition {
        status:      MedicineStatus::Active,
        refill_date: Some(refill_date),
        log:         None,
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::medicine::Condition;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  fn medicine(status: MedicineStatus) -> Medicine {
    Medicine {
      medicine_id:   Uuid::new_v4(),
      pharmacy_id:   Uuid::new_v4(),
      patient_id:    Uuid::new_v4(),
      medicine_name: "Amlodipine".into(),
      condition:     Condition::Bp,
      dosage_per_day: 2.0,
      tablets_given:  30,
      start_date:     d(2024, 1, 1),
      refill_date:    d(2024, 1, 16),
      status,
      last_reminder_sent_at: None,
      last_upcoming_reminder_sent_at: None,
      created_at: Utc::now(),
      deleted_at: None,
    }
  }

  #[test]
  fn refill_from_active_recomputes_date_and_logs() {
    let t = plan_transition(&medicine(MedicineStatus::Active), StatusAction::Refill, d(2024, 2, 1))
      .unwrap();
    assert_eq!(t.status, MedicineStatus::Active);
    assert_eq!(t.refill_date, Some(d(2024, 2, 16)));
    assert_eq!(
      t.log,
      Some(NewRefillLog { refill_date: d(2024, 2, 1), tablets_given: 30 })
    );
  }

  #[test]
  fn refill_from_missed_returns_to_active() {
    let t = plan_transition(&medicine(MedicineStatus::Missed), StatusAction::Refill, d(2024, 2, 1))
      .unwrap();
    assert_eq!(t.status, MedicineStatus::Active);
    assert!(t.log.is_some());
  }

  #[test]
  fn refill_from_stopped_is_illegal() {
    let err =
      plan_transition(&medicine(MedicineStatus::Stopped), StatusAction::Refill, d(2024, 2, 1))
        .unwrap_err();
    assert!(matches!(err, Error::CannotRefillStopped));
    assert!(err.is_illegal_transition());
    assert_eq!(err.to_string(), "cannot refill a stopped medicine");
  }

  #[test]
  fn stop_from_active_and_missed() {
    for from in [MedicineStatus::Active, MedicineStatus::Missed] {
      let t = plan_transition(&medicine(from), StatusAction::Stop, d(2024, 2, 1)).unwrap();
      assert_eq!(t.status, MedicineStatus::Stopped);
      assert_eq!(t.refill_date, None);
      assert_eq!(t.log, None);
    }
  }

  #[test]
  fn stop_when_already_stopped_is_illegal() {
    let err = plan_transition(&medicine(MedicineStatus::Stopped), StatusAction::Stop, d(2024, 2, 1))
      .unwrap_err();
    assert!(err.is_illegal_transition());
  }

  #[test]
  fn resume_only_from_stopped() {
    let t = plan_transition(&medicine(MedicineStatus::Stopped), StatusAction::Resume, d(2024, 3, 1))
      .unwrap();
    assert_eq!(t.status, MedicineStatus::Active);
    assert_eq!(t.refill_date, Some(d(2024, 3, 16)));
    // Resume is not a dispensing event.
    assert_eq!(t.log, None);

    for from in [MedicineStatus::Active, MedicineStatus::Missed] {
      let err = plan_transition(&medicine(from), StatusAction::Resume, d(2024, 3, 1)).unwrap_err();
      assert!(matches!(err, Error::OnlyStoppedCanResume));
      assert_eq!(err.to_string(), "only stopped medicines can be resumed");
    }
  }

  #[test]
  fn every_action_rejects_non_positive_dosage() {
    for action in [StatusAction::Refill, StatusAction::Stop, StatusAction::Resume] {
      for status in [MedicineStatus::Active, MedicineStatus::Missed, MedicineStatus::Stopped] {
        let mut med = medicine(status);
        med.dosage_per_day = 0.0;
        assert!(matches!(
          plan_transition(&med, action, d(2024, 2, 1)),
          Err(Error::InvalidDosage(_))
        ));
      }
    }
  }
}
