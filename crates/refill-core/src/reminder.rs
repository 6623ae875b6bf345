//! Reminder deduplication and delivery for a single candidate event.
//!
//! Two dedup strategies, selected by kind:
//! - `today` / `upcoming`: per-medicine timestamp stamp. Skip when the
//!   stamp's UTC civil day equals today's; otherwise send and restamp.
//! - `missed`: existence of a prior `missed` notification for the medicine.
//!
//! Either way, at most one outbound message and one inbox notification per
//! (medicine, kind) per dedup period. For `today`/`upcoming` the send
//! happens before the notification insert and the stamp update, so a failed
//! delivery leaves no dedup state behind and the next run retries. For
//! `missed` the inbox notification is persisted before the send: the
//! scanner never revisits a row once it leaves `active`, so the miss must
//! be on record even when delivery fails.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
  medicine::Medicine,
  messenger::Messenger,
  notification::{self, NewNotification, ReminderKind},
  patient::Patient,
  schedule::utc_day,
  store::RefillStore,
};

#[derive(Debug, Error)]
pub enum ReminderError<SE, ME>
where
  SE: std::error::Error,
  ME: std::error::Error,
{
  #[error("store error: {0}")]
  Store(#[source] SE),

  /// Outbound delivery failed. Recoverable: scanners record it per-record
  /// and continue.
  #[error("message delivery failed: {0}")]
  Messaging(#[source] ME),
}

/// What happened to one candidate reminder. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderOutcome {
  /// Message delivered and notification recorded.
  Sent,
  /// A reminder of this kind was already issued within the dedup period.
  AlreadySent,
  /// The patient has no linked chat recipient; nothing was recorded.
  NoRecipient,
  /// Missed reminders still record the inbox notification when the patient
  /// has no linked chat — the pharmacy must learn about the miss.
  NotifiedWithoutMessage,
}

/// Run the dedup check, deliver, and persist for one (medicine, kind) pair.
pub async fn process<S, M>(
  store: &S,
  messenger: &M,
  medicine: &Medicine,
  patient: &Patient,
  kind: ReminderKind,
  now: DateTime<Utc>,
  lookahead_days: u32,
) -> Result<ReminderOutcome, ReminderError<S::Error, M::Error>>
where
  S: RefillStore,
  M: Messenger,
{
  let today = utc_day(now);

  // Dedup check, as close as possible to the eventual write.
  let already_sent = match kind {
    ReminderKind::Today => medicine
      .last_reminder_sent_at
      .is_some_and(|at| utc_day(at) == today),
    ReminderKind::Upcoming => medicine
      .last_upcoming_reminder_sent_at
      .is_some_and(|at| utc_day(at) == today),
    ReminderKind::Missed => store
      .notification_exists(medicine.pharmacy_id, medicine.medicine_id, kind, None)
      .await
      .map_err(ReminderError::Store)?,
  };
  if already_sent {
    return Ok(ReminderOutcome::AlreadySent);
  }

  let inbox =
    notification::inbox_message(kind, &medicine.medicine_name, lookahead_days);
  let notification = NewNotification {
    pharmacy_id: medicine.pharmacy_id,
    patient_id:  medicine.patient_id,
    medicine_id: medicine.medicine_id,
    kind,
    message: inbox,
  };

  let Some(chat_id) = patient.chat_id.as_deref() else {
    return match kind {
      ReminderKind::Missed => {
        store
          .add_notification(notification)
          .await
          .map_err(ReminderError::Store)?;
        Ok(ReminderOutcome::NotifiedWithoutMessage)
      }
      _ => Ok(ReminderOutcome::NoRecipient),
    };
  };

  let text = notification::chat_message(
    kind,
    &patient.name,
    &medicine.medicine_name,
    lookahead_days,
  );

  match kind {
    ReminderKind::Missed => {
      // Inbox first: the miss stays recorded even if delivery fails below.
      store
        .add_notification(notification)
        .await
        .map_err(ReminderError::Store)?;
      messenger
        .send(chat_id, &text)
        .await
        .map_err(ReminderError::Messaging)?;
    }
    ReminderKind::Today | ReminderKind::Upcoming => {
      messenger
        .send(chat_id, &text)
        .await
        .map_err(ReminderError::Messaging)?;
      store
        .add_notification(notification)
        .await
        .map_err(ReminderError::Store)?;
      store
        .stamp_reminder(medicine.medicine_id, kind, now)
        .await
        .map_err(ReminderError::Store)?;
    }
  }

  Ok(ReminderOutcome::Sent)
}
