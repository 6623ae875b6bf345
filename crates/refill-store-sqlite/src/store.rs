//! [`SqliteStore`] — the SQLite implementation of [`RefillStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use refill_core::{
  lifecycle::{RefillLog, Transition},
  medicine::{Medicine, MedicineStatus, NewMedicine},
  notification::{NewNotification, Notification, ReminderKind},
  patient::{self, NewPatient, Patient},
  pharmacy::{NewPharmacy, Pharmacy},
  schedule,
  store::{DueFilter, DuePredicate, RefillStore},
};

use crate::{
  Error, Result,
  encode::{
    RawMedicine, RawNotification, RawPatient, RawPharmacy, RawRefillLog,
    encode_condition, encode_date, encode_dt, encode_kind, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Row mappers ─────────────────────────────────────────────────────────────

/// Shared column list for medicine SELECTs. Every medicine read goes through
/// this list and the `deleted_at IS NULL` predicate below, so no caller can
/// forget to exclude soft-deleted rows.
const MEDICINE_COLS: &str = "medicine_id, pharmacy_id, patient_id, medicine_name, \
   condition, dosage_per_day, tablets_given, start_date, refill_date, status, \
   last_reminder_sent_at, last_upcoming_reminder_sent_at, created_at, deleted_at";

const PATIENT_COLS: &str =
  "patient_id, pharmacy_id, name, phone, chat_id, created_at, deleted_at";

fn medicine_row(row: &rusqlite::Row) -> rusqlite::Result<RawMedicine> {
  Ok(RawMedicine {
    medicine_id:    row.get(0)?,
    pharmacy_id:    row.get(1)?,
    patient_id:     row.get(2)?,
    medicine_name:  row.get(3)?,
    condition:      row.get(4)?,
    dosage_per_day: row.get(5)?,
    tablets_given:  row.get(6)?,
    start_date:     row.get(7)?,
    refill_date:    row.get(8)?,
    status:         row.get(9)?,
    last_reminder_sent_at:          row.get(10)?,
    last_upcoming_reminder_sent_at: row.get(11)?,
    created_at:     row.get(12)?,
    deleted_at:     row.get(13)?,
  })
}

fn patient_row(row: &rusqlite::Row) -> rusqlite::Result<RawPatient> {
  Ok(RawPatient {
    patient_id:  row.get(0)?,
    pharmacy_id: row.get(1)?,
    name:        row.get(2)?,
    phone:       row.get(3)?,
    chat_id:     row.get(4)?,
    created_at:  row.get(5)?,
    deleted_at:  row.get(6)?,
  })
}

fn notification_row(row: &rusqlite::Row) -> rusqlite::Result<RawNotification> {
  Ok(RawNotification {
    notification_id: row.get(0)?,
    pharmacy_id:     row.get(1)?,
    patient_id:      row.get(2)?,
    medicine_id:     row.get(3)?,
    kind:            row.get(4)?,
    message:         row.get(5)?,
    is_read:         row.get(6)?,
    created_at:      row.get(7)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A refill store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Outcome of the purge check+delete, resolved into a domain error outside
/// the connection closure.
enum PurgeOutcome {
  Purged,
  NotFound,
  HasHistory,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RefillStore impl ────────────────────────────────────────────────────────

impl RefillStore for SqliteStore {
  type Error = Error;

  // ── Pharmacies ────────────────────────────────────────────────────────────

  async fn add_pharmacy(&self, input: NewPharmacy) -> Result<Pharmacy> {
    input.validate().map_err(Error::Core)?;

    let pharmacy = Pharmacy {
      pharmacy_id:   Uuid::new_v4(),
      name:          input.name.trim().to_owned(),
      email:         input.email.trim().to_lowercase(),
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    let id_str   = encode_uuid(pharmacy.pharmacy_id);
    let at_str   = encode_dt(pharmacy.created_at);
    let name     = pharmacy.name.clone();
    let email    = pharmacy.email.clone();
    let hash     = pharmacy.password_hash.clone();

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM pharmacies WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO pharmacies (pharmacy_id, name, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, email, hash, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::Core(refill_core::Error::Validation(format!(
        "email already registered: {}",
        pharmacy.email
      ))));
    }
    Ok(pharmacy)
  }

  async fn get_pharmacy(&self, id: Uuid) -> Result<Option<Pharmacy>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPharmacy> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT pharmacy_id, name, email, password_hash, created_at
               FROM pharmacies WHERE pharmacy_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawPharmacy {
                  pharmacy_id:   row.get(0)?,
                  name:          row.get(1)?,
                  email:         row.get(2)?,
                  password_hash: row.get(3)?,
                  created_at:    row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPharmacy::into_pharmacy).transpose()
  }

  async fn find_pharmacy_by_email<'a>(&'a self, email: &'a str) -> Result<Option<Pharmacy>> {
    let email = email.trim().to_lowercase();

    let raw: Option<RawPharmacy> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT pharmacy_id, name, email, password_hash, created_at
               FROM pharmacies WHERE email = ?1",
              rusqlite::params![email],
              |row| {
                Ok(RawPharmacy {
                  pharmacy_id:   row.get(0)?,
                  name:          row.get(1)?,
                  email:         row.get(2)?,
                  password_hash: row.get(3)?,
                  created_at:    row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPharmacy::into_pharmacy).transpose()
  }

  // ── Patients ──────────────────────────────────────────────────────────────

  async fn add_patient(&self, pharmacy_id: Uuid, input: NewPatient) -> Result<Patient> {
    input.validate().map_err(Error::Core)?;

    let patient = Patient {
      patient_id:  Uuid::new_v4(),
      pharmacy_id,
      name:        input.name.trim().to_owned(),
      phone:       patient::normalize_phone(&input.phone),
      chat_id:     None,
      created_at:  Utc::now(),
      deleted_at:  None,
    };

    let id_str       = encode_uuid(patient.patient_id);
    let pharm_id_str = encode_uuid(pharmacy_id);
    let name         = patient.name.clone();
    let phone        = patient.phone.clone();
    let at_str       = encode_dt(patient.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO patients (patient_id, pharmacy_id, name, phone, chat_id, created_at, deleted_at)
           VALUES (?1, ?2, ?3, ?4, NULL, ?5, NULL)",
          rusqlite::params![id_str, pharm_id_str, name, phone, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(patient)
  }

  async fn get_patient(&self, pharmacy_id: Uuid, patient_id: Uuid) -> Result<Option<Patient>> {
    let id_str       = encode_uuid(patient_id);
    let pharm_id_str = encode_uuid(pharmacy_id);

    let raw: Option<RawPatient> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PATIENT_COLS} FROM patients
                 WHERE patient_id = ?1 AND pharmacy_id = ?2 AND deleted_at IS NULL"
              ),
              rusqlite::params![id_str, pharm_id_str],
              patient_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPatient::into_patient).transpose()
  }

  async fn find_patient(&self, patient_id: Uuid) -> Result<Option<Patient>> {
    let id_str = encode_uuid(patient_id);

    let raw: Option<RawPatient> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PATIENT_COLS} FROM patients
                 WHERE patient_id = ?1 AND deleted_at IS NULL"
              ),
              rusqlite::params![id_str],
              patient_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPatient::into_patient).transpose()
  }

  async fn list_patients(&self, pharmacy_id: Uuid) -> Result<Vec<Patient>> {
    let pharm_id_str = encode_uuid(pharmacy_id);

    let raws: Vec<RawPatient> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PATIENT_COLS} FROM patients
           WHERE pharmacy_id = ?1 AND deleted_at IS NULL
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![pharm_id_str], patient_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPatient::into_patient).collect()
  }

  async fn link_chat(&self, patient_id: Uuid, chat_id: String) -> Result<Patient> {
    let id_str = encode_uuid(patient_id);

    let affected: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE patients SET chat_id = ?1
           WHERE patient_id = ?2 AND deleted_at IS NULL",
          rusqlite::params![chat_id, id_str],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::Core(refill_core::Error::PatientNotFound(patient_id)));
    }
    self
      .find_patient(patient_id)
      .await?
      .ok_or(Error::Core(refill_core::Error::PatientNotFound(patient_id)))
  }

  async fn soft_delete_patient(&self, pharmacy_id: Uuid, patient_id: Uuid) -> Result<()> {
    let id_str       = encode_uuid(patient_id);
    let pharm_id_str = encode_uuid(pharmacy_id);
    let at_str       = encode_dt(Utc::now());

    let affected: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let affected = tx.execute(
          "UPDATE patients SET deleted_at = ?1
           WHERE patient_id = ?2 AND pharmacy_id = ?3 AND deleted_at IS NULL",
          rusqlite::params![at_str, id_str, pharm_id_str],
        )?;
        if affected == 1 {
          // Cascade: a deleted patient's medicines must never match a scan.
          tx.execute(
            "UPDATE medicines SET deleted_at = ?1
             WHERE patient_id = ?2 AND deleted_at IS NULL",
            rusqlite::params![at_str, id_str],
          )?;
        }
        tx.commit()?;
        Ok(affected)
      })
      .await?;

    if affected == 0 {
      return Err(Error::Core(refill_core::Error::PatientNotFound(patient_id)));
    }
    Ok(())
  }

  // ── Medicines ─────────────────────────────────────────────────────────────

  async fn add_medicine(&self, pharmacy_id: Uuid, input: NewMedicine) -> Result<Medicine> {
    input.validate().map_err(Error::Core)?;

    // Ownership folded into the lookup: a patient owned by another pharmacy
    // reports as not found.
    let patient = self
      .get_patient(pharmacy_id, input.patient_id)
      .await?
      .ok_or(Error::Core(refill_core::Error::PatientNotFound(input.patient_id)))?;

    let refill_date = schedule::compute_refill_date(
      input.start_date,
      input.tablets_given,
      input.dosage_per_day,
    )
    .map_err(Error::Core)?;

    let medicine = Medicine {
      medicine_id:    Uuid::new_v4(),
      pharmacy_id,
      patient_id:     patient.patient_id,
      medicine_name:  input.medicine_name.trim().to_owned(),
      condition:      input.condition,
      dosage_per_day: input.dosage_per_day,
      tablets_given:  input.tablets_given,
      start_date:     input.start_date,
      refill_date,
      status:         MedicineStatus::Active,
      last_reminder_sent_at: None,
      last_upcoming_reminder_sent_at: None,
      created_at: Utc::now(),
      deleted_at: None,
    };

    let id_str        = encode_uuid(medicine.medicine_id);
    let pharm_id_str  = encode_uuid(pharmacy_id);
    let patient_id_str = encode_uuid(medicine.patient_id);
    let name          = medicine.medicine_name.clone();
    let condition_str = encode_condition(medicine.condition);
    let dosage        = medicine.dosage_per_day;
    let tablets       = i64::from(medicine.tablets_given);
    let start_str     = encode_date(medicine.start_date);
    let refill_str    = encode_date(medicine.refill_date);
    let status_str    = encode_status(medicine.status);
    let at_str        = encode_dt(medicine.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO medicines (
             medicine_id, pharmacy_id, patient_id, medicine_name, condition,
             dosage_per_day, tablets_given, start_date, refill_date, status,
             last_reminder_sent_at, last_upcoming_reminder_sent_at,
             created_at, deleted_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, NULL, ?11, NULL)",
          rusqlite::params![
            id_str,
            pharm_id_str,
            patient_id_str,
            name,
            condition_str,
            dosage,
            tablets,
            start_str,
            refill_str,
            status_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(medicine)
  }

  async fn get_medicine(&self, pharmacy_id: Uuid, medicine_id: Uuid) -> Result<Option<Medicine>> {
    let id_str       = encode_uuid(medicine_id);
    let pharm_id_str = encode_uuid(pharmacy_id);

    let raw: Option<RawMedicine> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {MEDICINE_COLS} FROM medicines
                 WHERE medicine_id = ?1 AND pharmacy_id = ?2 AND deleted_at IS NULL"
              ),
              rusqlite::params![id_str, pharm_id_str],
              medicine_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMedicine::into_medicine).transpose()
  }

  async fn list_medicines(
    &self,
    pharmacy_id: Uuid,
    patient_id: Option<Uuid>,
  ) -> Result<Vec<Medicine>> {
    let pharm_id_str   = encode_uuid(pharmacy_id);
    let patient_id_str = patient_id.map(encode_uuid);

    let raws: Vec<RawMedicine> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(pid) = patient_id_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {MEDICINE_COLS} FROM medicines
             WHERE pharmacy_id = ?1 AND patient_id = ?2 AND deleted_at IS NULL
             ORDER BY created_at DESC"
          ))?;
          stmt
            .query_map(rusqlite::params![pharm_id_str, pid], medicine_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {MEDICINE_COLS} FROM medicines
             WHERE pharmacy_id = ?1 AND deleted_at IS NULL
             ORDER BY created_at DESC"
          ))?;
          stmt
            .query_map(rusqlite::params![pharm_id_str], medicine_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMedicine::into_medicine).collect()
  }

  async fn apply_transition(
    &self,
    pharmacy_id: Uuid,
    medicine_id: Uuid,
    transition: Transition,
  ) -> Result<Medicine> {
    let id_str       = encode_uuid(medicine_id);
    let pharm_id_str = encode_uuid(pharmacy_id);
    let status_str   = encode_status(transition.status);
    let refill_str   = transition.refill_date.map(encode_date);
    let log_params   = transition.log.map(|log| {
      (
        encode_uuid(Uuid::new_v4()),
        encode_date(log.refill_date),
        i64::from(log.tablets_given),
        encode_dt(Utc::now()),
      )
    });

    let affected: usize = self
      .conn
      .call(move |conn| {
        // Status write, refill-date write, and history append commit as one
        // unit or not at all.
        let tx = conn.transaction()?;
        let affected = tx.execute(
          "UPDATE medicines
           SET status = ?1, refill_date = COALESCE(?2, refill_date)
           WHERE medicine_id = ?3 AND pharmacy_id = ?4 AND deleted_at IS NULL",
          rusqlite::params![status_str, refill_str, id_str, pharm_id_str],
        )?;
        if affected == 1
          && let Some((log_id, date_str, tablets, at_str)) = log_params
        {
          let patient_id: String = tx.query_row(
            "SELECT patient_id FROM medicines WHERE medicine_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )?;
          tx.execute(
            "INSERT INTO refill_logs (
               log_id, pharmacy_id, patient_id, medicine_id,
               refill_date, tablets_given, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
              log_id,
              pharm_id_str,
              patient_id,
              id_str,
              date_str,
              tablets,
              at_str
            ],
          )?;
        }
        tx.commit()?;
        Ok(affected)
      })
      .await?;

    if affected == 0 {
      return Err(Error::Core(refill_core::Error::MedicineNotFound(medicine_id)));
    }
    self
      .get_medicine(pharmacy_id, medicine_id)
      .await?
      .ok_or(Error::Core(refill_core::Error::MedicineNotFound(medicine_id)))
  }

  async fn mark_missed(&self, medicine_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(medicine_id);

    let affected: usize = self
      .conn
      .call(move |conn| {
        // Conditional on the row still being active, so overlapping scanner
        // runs flip at most once.
        Ok(conn.execute(
          "UPDATE medicines SET status = 'missed'
           WHERE medicine_id = ?1 AND status = 'active' AND deleted_at IS NULL",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(affected == 1)
  }

  async fn stamp_reminder(
    &self,
    medicine_id: Uuid,
    kind: ReminderKind,
    at: DateTime<Utc>,
  ) -> Result<()> {
    let column = match kind {
      ReminderKind::Today => "last_reminder_sent_at",
      ReminderKind::Upcoming => "last_upcoming_reminder_sent_at",
      // Missed reminders dedup on notification existence; nothing to stamp.
      ReminderKind::Missed => return Ok(()),
    };

    let id_str = encode_uuid(medicine_id);
    let at_str = encode_dt(at);
    let sql = format!(
      "UPDATE medicines SET {column} = ?1
       WHERE medicine_id = ?2 AND deleted_at IS NULL"
    );

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params![at_str, id_str])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn due_medicines(&self, filter: DueFilter) -> Result<Vec<Medicine>> {
    let status_str = encode_status(filter.status);
    // ISO dates compare correctly as TEXT.
    let (op, date_str) = match filter.due {
      DuePredicate::Before(d) => ("<", encode_date(d)),
      DuePredicate::On(d) => ("=", encode_date(d)),
    };
    let sql = format!(
      "SELECT {MEDICINE_COLS} FROM medicines
       WHERE status = ?1 AND refill_date {op} ?2 AND deleted_at IS NULL"
    );

    let raws: Vec<RawMedicine> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![status_str, date_str], medicine_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMedicine::into_medicine).collect()
  }

  async fn soft_delete_medicine(&self, pharmacy_id: Uuid, medicine_id: Uuid) -> Result<()> {
    let id_str       = encode_uuid(medicine_id);
    let pharm_id_str = encode_uuid(pharmacy_id);
    let at_str       = encode_dt(Utc::now());

    let affected: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE medicines SET deleted_at = ?1
           WHERE medicine_id = ?2 AND pharmacy_id = ?3 AND deleted_at IS NULL",
          rusqlite::params![at_str, id_str, pharm_id_str],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::Core(refill_core::Error::MedicineNotFound(medicine_id)));
    }
    Ok(())
  }

  async fn purge_medicine(&self, pharmacy_id: Uuid, medicine_id: Uuid) -> Result<()> {
    let id_str       = encode_uuid(medicine_id);
    let pharm_id_str = encode_uuid(pharmacy_id);

    let outcome: PurgeOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Purge applies to soft-deleted rows too, so no deleted_at filter.
        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM medicines WHERE medicine_id = ?1 AND pharmacy_id = ?2",
            rusqlite::params![id_str, pharm_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(PurgeOutcome::NotFound);
        }

        let history: i64 = tx.query_row(
          "SELECT COUNT(*) FROM refill_logs WHERE medicine_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        if history > 0 {
          return Ok(PurgeOutcome::HasHistory);
        }

        tx.execute(
          "DELETE FROM notifications WHERE medicine_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM medicines WHERE medicine_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(PurgeOutcome::Purged)
      })
      .await?;

    match outcome {
      PurgeOutcome::Purged => Ok(()),
      PurgeOutcome::NotFound => {
        Err(Error::Core(refill_core::Error::MedicineNotFound(medicine_id)))
      }
      PurgeOutcome::HasHistory => {
        Err(Error::Core(refill_core::Error::DeletionConflict(medicine_id)))
      }
    }
  }

  // ── Refill history ────────────────────────────────────────────────────────

  async fn list_refill_logs(&self, pharmacy_id: Uuid, medicine_id: Uuid) -> Result<Vec<RefillLog>> {
    let id_str       = encode_uuid(medicine_id);
    let pharm_id_str = encode_uuid(pharmacy_id);

    let raws: Vec<RawRefillLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT log_id, pharmacy_id, patient_id, medicine_id,
                  refill_date, tablets_given, created_at
           FROM refill_logs
           WHERE medicine_id = ?1 AND pharmacy_id = ?2
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, pharm_id_str], |row| {
            Ok(RawRefillLog {
              log_id:        row.get(0)?,
              pharmacy_id:   row.get(1)?,
              patient_id:    row.get(2)?,
              medicine_id:   row.get(3)?,
              refill_date:   row.get(4)?,
              tablets_given: row.get(5)?,
              created_at:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRefillLog::into_log).collect()
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn add_notification(&self, input: NewNotification) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      pharmacy_id:     input.pharmacy_id,
      patient_id:      input.patient_id,
      medicine_id:     input.medicine_id,
      kind:            input.kind,
      message:         input.message,
      is_read:         false,
      created_at:      Utc::now(),
    };

    let id_str         = encode_uuid(notification.notification_id);
    let pharm_id_str   = encode_uuid(notification.pharmacy_id);
    let patient_id_str = encode_uuid(notification.patient_id);
    let med_id_str     = encode_uuid(notification.medicine_id);
    let kind_str       = encode_kind(notification.kind);
    let message        = notification.message.clone();
    let at_str         = encode_dt(notification.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (
             notification_id, pharmacy_id, patient_id, medicine_id,
             kind, message, is_read, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
          rusqlite::params![
            id_str,
            pharm_id_str,
            patient_id_str,
            med_id_str,
            kind_str,
            message,
            at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn notification_exists(
    &self,
    pharmacy_id: Uuid,
    medicine_id: Uuid,
    kind: ReminderKind,
    since: Option<DateTime<Utc>>,
  ) -> Result<bool> {
    let pharm_id_str = encode_uuid(pharmacy_id);
    let med_id_str   = encode_uuid(medicine_id);
    let kind_str     = encode_kind(kind);
    let since_str    = since.map(encode_dt);

    let exists: bool = self
      .conn
      .call(move |conn| {
        let found = if let Some(since) = since_str {
          conn
            .query_row(
              "SELECT 1 FROM notifications
               WHERE pharmacy_id = ?1 AND medicine_id = ?2 AND kind = ?3
                 AND created_at >= ?4",
              rusqlite::params![pharm_id_str, med_id_str, kind_str, since],
              |_| Ok(true),
            )
            .optional()?
        } else {
          conn
            .query_row(
              "SELECT 1 FROM notifications
               WHERE pharmacy_id = ?1 AND medicine_id = ?2 AND kind = ?3",
              rusqlite::params![pharm_id_str, med_id_str, kind_str],
              |_| Ok(true),
            )
            .optional()?
        };
        Ok(found.unwrap_or(false))
      })
      .await?;

    Ok(exists)
  }

  async fn list_notifications(&self, pharmacy_id: Uuid, limit: usize) -> Result<Vec<Notification>> {
    let pharm_id_str = encode_uuid(pharmacy_id);
    let limit_val    = limit as i64;

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT notification_id, pharmacy_id, patient_id, medicine_id,
                  kind, message, is_read, created_at
           FROM notifications
           WHERE pharmacy_id = ?1
           ORDER BY is_read ASC, created_at DESC
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pharm_id_str, limit_val], notification_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawNotification::into_notification)
      .collect()
  }

  async fn unread_count(&self, pharmacy_id: Uuid) -> Result<u64> {
    let pharm_id_str = encode_uuid(pharmacy_id);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM notifications WHERE pharmacy_id = ?1 AND is_read = 0",
          rusqlite::params![pharm_id_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }

  async fn mark_notification_read(&self, pharmacy_id: Uuid, notification_id: Uuid) -> Result<()> {
    let id_str       = encode_uuid(notification_id);
    let pharm_id_str = encode_uuid(pharmacy_id);

    let affected: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1
           WHERE notification_id = ?1 AND pharmacy_id = ?2",
          rusqlite::params![id_str, pharm_id_str],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::Core(refill_core::Error::NotificationNotFound(notification_id)));
    }
    Ok(())
  }

  async fn mark_all_notifications_read(&self, pharmacy_id: Uuid) -> Result<()> {
    let pharm_id_str = encode_uuid(pharmacy_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE notifications SET is_read = 1
           WHERE pharmacy_id = ?1 AND is_read = 0",
          rusqlite::params![pharm_id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
