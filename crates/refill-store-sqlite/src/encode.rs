//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, civil dates are ISO `YYYY-MM-DD` (which
//! compares correctly as TEXT), enums are their canonical strum strings, and
//! UUIDs are hyphenated lowercase.

use chrono::{DateTime, NaiveDate, Utc};
use refill_core::{
  lifecycle::RefillLog,
  medicine::{Condition, Medicine, MedicineStatus},
  notification::{Notification, ReminderKind},
  patient::Patient,
  pharmacy::Pharmacy,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamps and dates ────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  s.parse()
    .map_err(|e| Error::Decode(format!("bad date {s:?}: {e}")))
}

// ─── Enum strings ────────────────────────────────────────────────────────────

pub fn encode_status(s: MedicineStatus) -> String { s.to_string() }

pub fn decode_status(s: &str) -> Result<MedicineStatus> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown medicine status: {s:?}")))
}

pub fn encode_condition(c: Condition) -> String { c.to_string() }

pub fn decode_condition(s: &str) -> Result<Condition> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown condition: {s:?}")))
}

pub fn encode_kind(k: ReminderKind) -> String { k.to_string() }

pub fn decode_kind(s: &str) -> Result<ReminderKind> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown reminder kind: {s:?}")))
}

fn decode_tablets(n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(format!("bad tablet count: {n}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `pharmacies` row.
pub struct RawPharmacy {
  pub pharmacy_id:   String,
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawPharmacy {
  pub fn into_pharmacy(self) -> Result<Pharmacy> {
    Ok(Pharmacy {
      pharmacy_id:   decode_uuid(&self.pharmacy_id)?,
      name:          self.name,
      email:         self.email,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `patients` row.
pub struct RawPatient {
  pub patient_id:  String,
  pub pharmacy_id: String,
  pub name:        String,
  pub phone:       String,
  pub chat_id:     Option<String>,
  pub created_at:  String,
  pub deleted_at:  Option<String>,
}

impl RawPatient {
  pub fn into_patient(self) -> Result<Patient> {
    Ok(Patient {
      patient_id:  decode_uuid(&self.patient_id)?,
      pharmacy_id: decode_uuid(&self.pharmacy_id)?,
      name:        self.name,
      phone:       self.phone,
      chat_id:     self.chat_id,
      created_at:  decode_dt(&self.created_at)?,
      deleted_at:  self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from a `medicines` row.
pub struct RawMedicine {
  pub medicine_id:    String,
  pub pharmacy_id:    String,
  pub patient_id:     String,
  pub medicine_name:  String,
  pub condition:      String,
  pub dosage_per_day: f64,
  pub tablets_given:  i64,
  pub start_date:     String,
  pub refill_date:    String,
  pub status:         String,
  pub last_reminder_sent_at:          Option<String>,
  pub last_upcoming_reminder_sent_at: Option<String>,
  pub created_at:     String,
  pub deleted_at:     Option<String>,
}

impl RawMedicine {
  pub fn into_medicine(self) -> Result<Medicine> {
    Ok(Medicine {
      medicine_id:    decode_uuid(&self.medicine_id)?,
      pharmacy_id:    decode_uuid(&self.pharmacy_id)?,
      patient_id:     decode_uuid(&self.patient_id)?,
      medicine_name:  self.medicine_name,
      condition:      decode_condition(&self.condition)?,
      dosage_per_day: self.dosage_per_day,
      tablets_given:  decode_tablets(self.tablets_given)?,
      start_date:     decode_date(&self.start_date)?,
      refill_date:    decode_date(&self.refill_date)?,
      status:         decode_status(&self.status)?,
      last_reminder_sent_at: self
        .last_reminder_sent_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      last_upcoming_reminder_sent_at: self
        .last_upcoming_reminder_sent_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      created_at: decode_dt(&self.created_at)?,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from a `refill_logs` row.
pub struct RawRefillLog {
  pub log_id:        String,
  pub pharmacy_id:   String,
  pub patient_id:    String,
  pub medicine_id:   String,
  pub refill_date:   String,
  pub tablets_given: i64,
  pub created_at:    String,
}

impl RawRefillLog {
  pub fn into_log(self) -> Result<RefillLog> {
    Ok(RefillLog {
      log_id:        decode_uuid(&self.log_id)?,
      pharmacy_id:   decode_uuid(&self.pharmacy_id)?,
      patient_id:    decode_uuid(&self.patient_id)?,
      medicine_id:   decode_uuid(&self.medicine_id)?,
      refill_date:   decode_date(&self.refill_date)?,
      tablets_given: decode_tablets(self.tablets_given)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub pharmacy_id:     String,
  pub patient_id:      String,
  pub medicine_id:     String,
  pub kind:            String,
  pub message:         String,
  pub is_read:         bool,
  pub created_at:      String,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      pharmacy_id:     decode_uuid(&self.pharmacy_id)?,
      patient_id:      decode_uuid(&self.patient_id)?,
      medicine_id:     decode_uuid(&self.medicine_id)?,
      kind:            decode_kind(&self.kind)?,
      message:         self.message,
      is_read:         self.is_read,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
