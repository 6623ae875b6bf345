//! Telegram webhook (chat linking) and the direct-send endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/telegram/web-hook` | Bot API update; always 200 |
//! | `POST` | `/api/telegram/send` | Basic auth; free-text message to one patient |

use axum::{Json, extract::State};
use refill_core::{messenger::Messenger, store::RefillStore};
use refill_telegram::webhook::{Update, parse_start_command};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentPharmacy,
  error::{ApiError, IntoApiError},
};

const LINKED_REPLY: &str =
  "✅ You're all set! Refill reminders for your medicines will arrive in this chat.";
const INVALID_LINK_REPLY: &str =
  "This link looks invalid or expired. Please ask your pharmacy for a new one.";
const GUIDANCE_REPLY: &str =
  "To link your refill reminders, open the link your pharmacy sent you.";

/// Best-effort reply; the webhook must answer 200 regardless, or Telegram
/// keeps redelivering the update.
async fn reply<M: Messenger>(messenger: &M, chat_id: &str, text: &str) {
  if let Err(e) = messenger.send(chat_id, text).await {
    tracing::warn!(chat_id, error = %e, "webhook reply failed");
  }
}

/// `POST /api/telegram/web-hook` — handles `/start <patient-id>` deep links
/// by recording the chat id on the patient. Everything else is ignored.
pub async fn web_hook<S, M>(
  State(state): State<AppState<S, M>>,
  Json(update): Json<Update>,
) -> Json<serde_json::Value>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let Some(message) = update.message else {
    return Json(json!({ "ok": true }));
  };
  let Some(text) = message.text.as_deref() else {
    return Json(json!({ "ok": true }));
  };
  let chat_id = message.chat.id.to_string();

  match parse_start_command(text) {
    Some(patient_id) => {
      match state.store.link_chat(patient_id, chat_id.clone()).await {
        Ok(patient) => {
          tracing::info!(patient_id = %patient.patient_id, "chat linked");
          reply(state.messenger.as_ref(), &chat_id, LINKED_REPLY).await;
        }
        Err(e) => {
          tracing::warn!(patient_id = %patient_id, error = %e, "chat link failed");
          reply(state.messenger.as_ref(), &chat_id, INVALID_LINK_REPLY).await;
        }
      }
    }
    None if text.trim_start().starts_with("/start") => {
      reply(state.messenger.as_ref(), &chat_id, GUIDANCE_REPLY).await;
    }
    None => {}
  }

  Json(json!({ "ok": true }))
}

#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub patient_id: Uuid,
  pub message:    String,
}

/// `POST /api/telegram/send` — ad-hoc message to one of the pharmacy's
/// patients, outside the scanner flows.
pub async fn send_direct<S, M>(
  State(state): State<AppState<S, M>>,
  CurrentPharmacy(pharmacy): CurrentPharmacy,
  Json(body): Json<SendBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  let patient = state
    .store
    .get_patient(pharmacy.pharmacy_id, body.patient_id)
    .await
    .map_err(IntoApiError::into_api_error)?
    .ok_or_else(|| ApiError::NotFound(format!("patient {} not found", body.patient_id)))?;

  let Some(chat_id) = patient.chat_id.as_deref() else {
    return Err(ApiError::BadRequest("patient has no linked chat".into()));
  };

  state
    .messenger
    .send(chat_id, &body.message)
    .await
    .map_err(|e| ApiError::Messaging(Box::new(e)))?;

  Ok(Json(json!({ "ok": true })))
}
