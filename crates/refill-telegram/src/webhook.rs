//! Inbound webhook payload types and the `/start` deep-link parser.
//!
//! Patients link their chat by opening the bot with a deep link that carries
//! their patient id: Telegram delivers it as a `/start <patient-id>` message.
//! Only the fields the linking flow reads are modelled; everything else in
//! the update is ignored.

use serde::Deserialize;
use uuid::Uuid;

/// One incoming Bot API update. Non-message updates deserialize with
/// `message: None` and are ignored by the webhook handler.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
  pub update_id: i64,
  #[serde(default)]
  pub message:   Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
  pub chat: Chat,
  #[serde(default)]
  pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
  /// Numeric chat identifier; stored stringified as the patient's
  /// recipient id.
  pub id: i64,
}

/// Extract the patient id from a `/start <patient-id>` command, tolerating
/// the `/start@botname` form. Returns `None` for any other text.
pub fn parse_start_command(text: &str) -> Option<Uuid> {
  let mut words = text.split_whitespace();
  let command = words.next()?;
  if command != "/start" && !command.starts_with("/start@") {
    return None;
  }
  words.next()?.parse().ok()
}
