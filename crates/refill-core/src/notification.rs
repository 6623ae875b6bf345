//! Inbox notifications and reminder message templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// The kind of reminder event a notification records.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReminderKind {
  Today,
  Upcoming,
  Missed,
}

/// A pharmacy-inbox entry created by the reminder layer. Mutated only to
/// flip `is_read`; never deleted for correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub pharmacy_id:     Uuid,
  pub patient_id:      Uuid,
  pub medicine_id:     Uuid,
  pub kind:            ReminderKind,
  pub message:         String,
  pub is_read:         bool,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::RefillStore::add_notification`].
#[derive(Debug, Clone)]
pub struct NewNotification {
  pub pharmacy_id: Uuid,
  pub patient_id:  Uuid,
  pub medicine_id: Uuid,
  pub kind:        ReminderKind,
  pub message:     String,
}

// ─── Templates ───────────────────────────────────────────────────────────────

/// Short text stored on the inbox notification.
pub fn inbox_message(kind: ReminderKind, medicine_name: &str, lookahead_days: u32) -> String {
  match kind {
    ReminderKind::Today => format!("Refill due today for {medicine_name}"),
    ReminderKind::Upcoming => {
      format!("{medicine_name} refill due in {lookahead_days} days")
    }
    ReminderKind::Missed => format!("Missed refill for {medicine_name}"),
  }
}

/// Long-form chat text sent to the patient's linked recipient. HTML bold
/// markup, rendered by the messaging platform.
pub fn chat_message(
  kind: ReminderKind,
  patient_name: &str,
  medicine_name: &str,
  lookahead_days: u32,
) -> String {
  match kind {
    ReminderKind::Today => format!(
      "💊 <b>Refill Reminder</b>\n\nHello {patient_name},\n\n\
       \"<b>{medicine_name}</b>\" is due for a refill today. Please visit \
       your pharmacy to collect it and keep your treatment on schedule."
    ),
    ReminderKind::Upcoming => format!(
      "💊 <b>Upcoming Refill Reminder</b>\n\nHello {patient_name},\n\n\
       This is a gentle reminder that \"<b>{medicine_name}</b>\" will require \
       a refill in {lookahead_days} days.\n\nWe recommend arranging this in \
       advance to ensure uninterrupted treatment.\n\nIf already planned, \
       please disregard this message.\n\nWishing you continued good health."
    ),
    ReminderKind::Missed => format!(
      "💊 <b>Missed Refill</b>\n\nHello {patient_name},\n\n\
       Our records show \"<b>{medicine_name}</b>\" was due for a refill and \
       has not been collected yet. Please visit your pharmacy soon to avoid \
       interrupting your treatment."
    ),
  }
}
