//! The `RefillStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `refill-store-sqlite`).
//! Higher layers (`refill-api`, the scanners) depend on this abstraction,
//! not on any concrete backend.
//!
//! Tenancy rule: every read or write that acts on behalf of a pharmacy takes
//! that pharmacy's id and MUST fold it into the lookup — an entity owned by
//! someone else reports as not found. The only unscoped surface is the
//! scanner query ([`RefillStore::due_medicines`]) and the patient-linking
//! lookups, which run as global background work.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  lifecycle::{RefillLog, Transition},
  medicine::{Medicine, MedicineStatus, NewMedicine},
  notification::{NewNotification, Notification, ReminderKind},
  patient::{NewPatient, Patient},
  pharmacy::{NewPharmacy, Pharmacy},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Date predicate for the scanner query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuePredicate {
  /// `refill_date` strictly before this civil date (overdue).
  Before(NaiveDate),
  /// `refill_date` equal to this civil date.
  On(NaiveDate),
}

/// Parameters for [`RefillStore::due_medicines`]. Soft-deleted records are
/// always excluded; the backend applies that predicate, not the caller.
#[derive(Debug, Clone, Copy)]
pub struct DueFilter {
  pub status: MedicineStatus,
  pub due:    DuePredicate,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a refill-service storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RefillStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Pharmacies ────────────────────────────────────────────────────────

  /// Persist a new pharmacy. The email must be unique.
  fn add_pharmacy(
    &self,
    input: NewPharmacy,
  ) -> impl Future<Output = Result<Pharmacy, Self::Error>> + Send + '_;

  fn get_pharmacy(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Pharmacy>, Self::Error>> + Send + '_;

  /// Credential lookup for the auth layer. The email is matched lowercased.
  fn find_pharmacy_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Pharmacy>, Self::Error>> + Send + 'a;

  // ── Patients ──────────────────────────────────────────────────────────

  /// Persist a new patient under `pharmacy_id`, normalising the phone
  /// number first.
  fn add_patient(
    &self,
    pharmacy_id: Uuid,
    input: NewPatient,
  ) -> impl Future<Output = Result<Patient, Self::Error>> + Send + '_;

  /// Owner-scoped point lookup; excludes soft-deleted patients.
  fn get_patient(
    &self,
    pharmacy_id: Uuid,
    patient_id: Uuid,
  ) -> impl Future<Output = Result<Option<Patient>, Self::Error>> + Send + '_;

  /// Unscoped lookup used by the scanners (recipient resolution) and the
  /// chat-linking webhook. Excludes soft-deleted patients.
  fn find_patient(
    &self,
    patient_id: Uuid,
  ) -> impl Future<Output = Result<Option<Patient>, Self::Error>> + Send + '_;

  fn list_patients(
    &self,
    pharmacy_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Patient>, Self::Error>> + Send + '_;

  /// Record the chat recipient identifier once the patient completes the
  /// out-of-band linking step. Fails if the patient is missing or deleted.
  fn link_chat(
    &self,
    patient_id: Uuid,
    chat_id: String,
  ) -> impl Future<Output = Result<Patient, Self::Error>> + Send + '_;

  /// Soft-delete the patient and cascade to all of their medicines.
  fn soft_delete_patient(
    &self,
    pharmacy_id: Uuid,
    patient_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Medicines ─────────────────────────────────────────────────────────

  /// Validate and persist a new medicine with status `active`. The store
  /// computes the refill date; it is never accepted from callers.
  fn add_medicine(
    &self,
    pharmacy_id: Uuid,
    input: NewMedicine,
  ) -> impl Future<Output = Result<Medicine, Self::Error>> + Send + '_;

  /// Owner-scoped point lookup; excludes soft-deleted medicines.
  fn get_medicine(
    &self,
    pharmacy_id: Uuid,
    medicine_id: Uuid,
  ) -> impl Future<Output = Result<Option<Medicine>, Self::Error>> + Send + '_;

  /// List the pharmacy's medicines, optionally restricted to one patient.
  fn list_medicines(
    &self,
    pharmacy_id: Uuid,
    patient_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Medicine>, Self::Error>> + Send + '_;

  /// Apply a planned [`Transition`] as one unit: status write, optional
  /// refill-date write, optional history append.
  fn apply_transition(
    &self,
    pharmacy_id: Uuid,
    medicine_id: Uuid,
    transition: Transition,
  ) -> impl Future<Output = Result<Medicine, Self::Error>> + Send + '_;

  /// Passive scanner flip `active → missed`. Conditional on the row still
  /// being `active`, so overlapping runs flip at most once.
  fn mark_missed(
    &self,
    medicine_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Stamp the per-medicine dedup field for `kind` with `at`.
  /// `missed` reminders dedup on notification existence and have no stamp.
  fn stamp_reminder(
    &self,
    medicine_id: Uuid,
    kind: ReminderKind,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Scanner query: medicines matching `filter`, across all pharmacies,
  /// excluding soft-deleted records.
  fn due_medicines(
    &self,
    filter: DueFilter,
  ) -> impl Future<Output = Result<Vec<Medicine>, Self::Error>> + Send + '_;

  /// Soft delete — always permitted, regardless of history.
  fn soft_delete_medicine(
    &self,
    pharmacy_id: Uuid,
    medicine_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Hard delete — rejected while refill history exists for the medicine.
  fn purge_medicine(
    &self,
    pharmacy_id: Uuid,
    medicine_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Refill history ────────────────────────────────────────────────────

  fn list_refill_logs(
    &self,
    pharmacy_id: Uuid,
    medicine_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RefillLog>, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  fn add_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Existence-of-prior-notification dedup check. With `since`, only
  /// notifications created at or after that instant count.
  fn notification_exists(
    &self,
    pharmacy_id: Uuid,
    medicine_id: Uuid,
    kind: ReminderKind,
    since: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Inbox listing: unread first, then newest first, capped at `limit`.
  fn list_notifications(
    &self,
    pharmacy_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  fn unread_count(
    &self,
    pharmacy_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn mark_notification_read(
    &self,
    pharmacy_id: Uuid,
    notification_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn mark_all_notifications_read(
    &self,
    pharmacy_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
