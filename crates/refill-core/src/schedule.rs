//! Refill-date arithmetic — pure functions, no I/O.
//!
//! All "is it due today / overdue" decisions in this workspace compare UTC
//! civil dates produced by [`utc_day`]. Mixing local wall-clock days with UTC
//! days is how the predecessors of this code drifted by a day near midnight;
//! every comparison goes through the same normalisation.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::{Error, Result};

/// Truncate a timestamp to its UTC calendar date.
pub fn utc_day(at: DateTime<Utc>) -> NaiveDate {
  at.date_naive()
}

/// Whole days a dispensed quantity will last: `floor(tablets / dosage)`.
///
/// A remainder of tablets that does not cover a full day of doses is not
/// counted as an extra day.
pub fn supply_days(tablets_given: u32, dosage_per_day: f64) -> Result<u64> {
  if !(dosage_per_day > 0.0) {
    return Err(Error::InvalidDosage(dosage_per_day));
  }
  Ok((f64::from(tablets_given) / dosage_per_day).floor() as u64)
}

/// The date the supply dispensed on `start` runs out.
///
/// `tablets_given == 0` is valid and yields `start` (immediately due).
pub fn compute_refill_date(
  start: NaiveDate,
  tablets_given: u32,
  dosage_per_day: f64,
) -> Result<NaiveDate> {
  let days = supply_days(tablets_given, dosage_per_day)?;
  start
    .checked_add_days(Days::new(days))
    .ok_or_else(|| Error::Validation(format!("refill date out of range: {start} + {days} days")))
}
