//! JSON REST API and server wiring for the refill reminder service.
//!
//! Exposes an axum [`Router`] generic over any [`RefillStore`] backend and
//! any [`Messenger`] delivery channel; the `server` binary wires in
//! [`refill_store_sqlite::SqliteStore`] and
//! [`refill_telegram::TelegramMessenger`].

pub mod auth;
pub mod cron;
pub mod dashboard;
pub mod error;
pub mod medicines;
pub mod notifications;
pub mod patients;
pub mod pharmacies;
pub mod telegram;

pub use error::{ApiError, IntoApiError};

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, patch, post},
};
use refill_core::{messenger::Messenger, store::RefillStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_lookahead_days() -> u32 {
  2
}

/// Runtime server configuration, deserialised from `config.toml` merged
/// with `REFILL_`-prefixed environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Shared secret expected in the `x-cron-key` header on scanner triggers.
  pub cron_key:   String,
  /// How many days ahead the upcoming scanner looks. Also the dashboard's
  /// "upcoming" window.
  #[serde(default = "default_lookahead_days")]
  pub lookahead_days: u32,
  pub telegram_bot_token: String,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RefillStore, M: Messenger> {
  pub store:     Arc<S>,
  pub messenger: Arc<M>,
  pub config:    Arc<ServerConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S, M>(state: AppState<S, M>) -> Router
where
  S: RefillStore + Clone + Send + Sync + 'static,
  S::Error: IntoApiError,
  M: Messenger + Clone + Send + Sync + 'static,
{
  Router::new()
    // Registration (unauthenticated)
    .route("/api/pharmacies", post(pharmacies::register::<S, M>))
    // Patients
    .route(
      "/api/patients",
      get(patients::list::<S, M>).post(patients::create::<S, M>),
    )
    .route(
      "/api/patients/{id}",
      get(patients::get_one::<S, M>).delete(patients::delete_one::<S, M>),
    )
    // Medicines
    .route(
      "/api/medicines",
      get(medicines::list::<S, M>).post(medicines::create::<S, M>),
    )
    .route(
      "/api/medicines/{id}",
      get(medicines::get_one::<S, M>).delete(medicines::delete_one::<S, M>),
    )
    .route("/api/medicines/{id}/status", patch(medicines::update_status::<S, M>))
    .route("/api/medicines/{id}/refills", get(medicines::refill_history::<S, M>))
    .route("/api/medicines/{id}/purge", delete(medicines::purge_one::<S, M>))
    // Notifications
    .route("/api/notifications", get(notifications::list::<S, M>))
    .route("/api/notifications/{id}/read", post(notifications::mark_read::<S, M>))
    .route("/api/notifications/read-all", post(notifications::mark_all_read::<S, M>))
    // Dashboard
    .route("/api/dashboard/summary", get(dashboard::summary::<S, M>))
    // Scanner triggers (x-cron-key)
    .route("/api/cron/mark-missed", post(cron::mark_missed::<S, M>))
    .route("/api/cron/refills-today", post(cron::refills_today::<S, M>))
    .route("/api/cron/refills-upcoming", post(cron::refills_upcoming::<S, M>))
    // Telegram
    .route("/api/telegram/web-hook", post(telegram::web_hook::<S, M>))
    .route("/api/telegram/send", post(telegram::send_direct::<S, M>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use std::{
    future::Future,
    sync::{Arc, Mutex},
  };

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use chrono::{Days, Utc};
  use refill_core::schedule::utc_day;
  use refill_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const CRON_KEY: &str = "cron-secret";
  const EMAIL: &str = "desk@central.example";
  const PASSWORD: &str = "super-secret";

  #[derive(Debug, thiserror::Error)]
  #[error("delivery refused")]
  struct DeliveryRefused;

  /// Records every outbound send; shared across clones.
  #[derive(Clone, Default)]
  struct RecordingMessenger {
    sent: Arc<Mutex<Vec<(String, String)>>>,
  }

  impl Messenger for RecordingMessenger {
    type Error = DeliveryRefused;

    fn send<'a>(
      &'a self,
      recipient: &'a str,
      text: &'a str,
    ) -> impl Future<Output = Result<(), DeliveryRefused>> + Send + 'a {
      async move {
        self
          .sent
          .lock()
          .unwrap()
          .push((recipient.to_owned(), text.to_owned()));
        Ok(())
      }
    }
  }

  type State = AppState<SqliteStore, RecordingMessenger>;

  async fn make_state() -> State {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store:     Arc::new(store),
      messenger: Arc::new(RecordingMessenger::default()),
      config:    Arc::new(ServerConfig {
        host:               "127.0.0.1".to_string(),
        port:               8080,
        store_path:         ":memory:".into(),
        cron_key:           CRON_KEY.to_string(),
        lookahead_days:     2,
        telegram_bot_token: "test-token".to_string(),
      }),
    }
  }

  fn basic(email: &str, password: &str) -> String {
    format!("Basic {}", B64.encode(format!("{email}:{password}")))
  }

  async fn call(
    state: &State,
    method: &str,
    uri: &str,
    auth: Option<(&str, &str)>,
    cron_key: Option<&str>,
    body: Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((email, password)) = auth {
      builder = builder.header(header::AUTHORIZATION, basic(email, password));
    }
    if let Some(key) = cron_key {
      builder = builder.header("x-cron-key", key);
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn register_pharmacy(state: &State) {
    let resp = call(
      state,
      "POST",
      "/api/pharmacies",
      None,
      None,
      Some(json!({ "name": "Central Pharmacy", "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  async fn create_patient(state: &State) -> Uuid {
    let resp = call(
      state,
      "POST",
      "/api/patients",
      Some((EMAIL, PASSWORD)),
      None,
      Some(json!({ "name": "Asha Rao", "phone": "9876543210" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    body["patient_id"].as_str().unwrap().parse().unwrap()
  }

  /// 30 tablets at 2/day starting 15 days ago: refill date is today.
  async fn create_due_today_medicine(state: &State, patient_id: Uuid) -> Uuid {
    let start = utc_day(Utc::now()).checked_sub_days(Days::new(15)).unwrap();
    let resp = call(
      state,
      "POST",
      "/api/medicines",
      Some((EMAIL, PASSWORD)),
      None,
      Some(json!({
        "patient_id": patient_id,
        "medicine_name": "Metformin",
        "condition": "Diabetes",
        "dosage_per_day": 2.0,
        "tablets_given": 30,
        "start_date": start.to_string(),
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["refill_date"].as_str().unwrap(), utc_day(Utc::now()).to_string());
    body["medicine_id"].as_str().unwrap().parse().unwrap()
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_request_returns_401_with_challenge() {
    let state = make_state().await;
    let resp = call(&state, "GET", "/api/patients", None, None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn wrong_password_returns_401() {
    let state = make_state().await;
    register_pharmacy(&state).await;
    let resp = call(&state, "GET", "/api/patients", Some((EMAIL, "wrong")), None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn registration_rejects_short_password_and_duplicate_email() {
    let state = make_state().await;
    let resp = call(
      &state,
      "POST",
      "/api/pharmacies",
      None,
      None,
      Some(json!({ "name": "P", "email": EMAIL, "password": "short" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    register_pharmacy(&state).await;
    let resp = call(
      &state,
      "POST",
      "/api/pharmacies",
      None,
      None,
      Some(json!({ "name": "P", "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn registration_response_omits_password_hash() {
    let state = make_state().await;
    let resp = call(
      &state,
      "POST",
      "/api/pharmacies",
      None,
      None,
      Some(json!({ "name": "Central Pharmacy", "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    let body = json_body(resp).await;
    assert!(body.get("password_hash").is_none(), "body: {body}");
  }

  // ── Patients and medicines ────────────────────────────────────────────────

  #[tokio::test]
  async fn patient_create_list_and_detail() {
    let state = make_state().await;
    register_pharmacy(&state).await;
    let patient_id = create_patient(&state).await;
    create_due_today_medicine(&state, patient_id).await;

    let resp = call(&state, "GET", "/api/patients", Some((EMAIL, PASSWORD)), None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["phone"], "919876543210");

    let resp = call(
      &state,
      "GET",
      &format!("/api/patients/{patient_id}"),
      Some((EMAIL, PASSWORD)),
      None,
      None,
    )
    .await;
    let body = json_body(resp).await;
    assert_eq!(body["medicines"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn foreign_pharmacy_sees_404_not_the_record() {
    let state = make_state().await;
    register_pharmacy(&state).await;
    let patient_id = create_patient(&state).await;
    let medicine_id = create_due_today_medicine(&state, patient_id).await;

    call(
      &state,
      "POST",
      "/api/pharmacies",
      None,
      None,
      Some(json!({ "name": "Rival", "email": "rival@example.com", "password": PASSWORD })),
    )
    .await;

    let resp = call(
      &state,
      "GET",
      &format!("/api/medicines/{medicine_id}"),
      Some(("rival@example.com", PASSWORD)),
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn status_actions_refill_stop_resume() {
    let state = make_state().await;
    register_pharmacy(&state).await;
    let patient_id = create_patient(&state).await;
    let medicine_id = create_due_today_medicine(&state, patient_id).await;
    let uri = format!("/api/medicines/{medicine_id}/status");

    let resp = call(
      &state, "PATCH", &uri,
      Some((EMAIL, PASSWORD)), None,
      Some(json!({ "action": "refill" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "active");
    let expected = utc_day(Utc::now()).checked_add_days(Days::new(15)).unwrap();
    assert_eq!(body["refill_date"].as_str().unwrap(), expected.to_string());

    let resp = call(
      &state,
      "GET",
      &format!("/api/medicines/{medicine_id}/refills"),
      Some((EMAIL, PASSWORD)),
      None,
      None,
    )
    .await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);

    let resp = call(
      &state, "PATCH", &uri,
      Some((EMAIL, PASSWORD)), None,
      Some(json!({ "action": "stop" })),
    )
    .await;
    assert_eq!(json_body(resp).await["status"], "stopped");

    // Refilling a stopped medicine is a 400 with the canonical message.
    let resp = call(
      &state, "PATCH", &uri,
      Some((EMAIL, PASSWORD)), None,
      Some(json!({ "action": "refill" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(
      body["error"].as_str().unwrap().contains("cannot refill a stopped medicine"),
      "body: {body}"
    );

    let resp = call(
      &state, "PATCH", &uri,
      Some((EMAIL, PASSWORD)), None,
      Some(json!({ "action": "resume" })),
    )
    .await;
    assert_eq!(json_body(resp).await["status"], "active");
  }

  #[tokio::test]
  async fn purge_conflicts_while_history_exists_soft_delete_does_not() {
    let state = make_state().await;
    register_pharmacy(&state).await;
    let patient_id = create_patient(&state).await;
    let medicine_id = create_due_today_medicine(&state, patient_id).await;

    call(
      &state,
      "PATCH",
      &format!("/api/medicines/{medicine_id}/status"),
      Some((EMAIL, PASSWORD)),
      None,
      Some(json!({ "action": "refill" })),
    )
    .await;

    let resp = call(
      &state,
      "DELETE",
      &format!("/api/medicines/{medicine_id}/purge"),
      Some((EMAIL, PASSWORD)),
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = call(
      &state,
      "DELETE",
      &format!("/api/medicines/{medicine_id}"),
      Some((EMAIL, PASSWORD)),
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  }

  // ── Dashboard ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn dashboard_buckets_due_today() {
    let state = make_state().await;
    register_pharmacy(&state).await;
    let patient_id = create_patient(&state).await;
    create_due_today_medicine(&state, patient_id).await;

    let resp = call(
      &state,
      "GET",
      "/api/dashboard/summary",
      Some((EMAIL, PASSWORD)),
      None,
      None,
    )
    .await;
    let body = json_body(resp).await;
    assert_eq!(body["patients"], 1);
    assert_eq!(body["medicines"], 1);
    assert_eq!(body["due_today"], 1);
    assert_eq!(body["upcoming"], 0);
    assert_eq!(body["missed"], 0);
  }

  // ── Cron triggers ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn cron_requires_the_shared_secret() {
    let state = make_state().await;
    let resp = call(&state, "POST", "/api/cron/mark-missed", None, None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp =
      call(&state, "POST", "/api/cron/mark-missed", None, Some("wrong"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn today_scan_sends_to_linked_patient_and_fills_inbox() {
    let state = make_state().await;
    register_pharmacy(&state).await;
    let patient_id = create_patient(&state).await;
    create_due_today_medicine(&state, patient_id).await;

    // Link the patient's chat through the webhook.
    let resp = call(
      &state,
      "POST",
      "/api/telegram/web-hook",
      None,
      None,
      Some(json!({
        "update_id": 1,
        "message": { "chat": { "id": 777 }, "text": format!("/start {patient_id}") }
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(
      &state,
      "POST",
      "/api/cron/refills-today",
      None,
      Some(CRON_KEY),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["summary"]["examined"], 1);
    assert_eq!(body["summary"]["sent"], 1);

    // One webhook confirmation + one reminder, both to chat 777.
    let sent = state.messenger.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(chat, _)| chat == "777"));
    assert!(sent[1].1.contains("Metformin"), "reminder text: {}", sent[1].1);

    let resp = call(
      &state,
      "GET",
      "/api/notifications",
      Some((EMAIL, PASSWORD)),
      None,
      None,
    )
    .await;
    let body = json_body(resp).await;
    assert_eq!(body["unread_count"], 1);
    assert_eq!(body["notifications"][0]["kind"], "today");

    // Re-running the scan the same day is a no-op.
    let resp = call(
      &state,
      "POST",
      "/api/cron/refills-today",
      None,
      Some(CRON_KEY),
      None,
    )
    .await;
    let body = json_body(resp).await;
    assert_eq!(body["summary"]["sent"], 0);
    assert_eq!(body["summary"]["skipped"], 1);
  }

  #[tokio::test]
  async fn webhook_replies_to_invalid_link_and_bare_start() {
    let state = make_state().await;

    let resp = call(
      &state,
      "POST",
      "/api/telegram/web-hook",
      None,
      None,
      Some(json!({
        "update_id": 1,
        "message": { "chat": { "id": 5 }, "text": format!("/start {}", Uuid::new_v4()) }
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    call(
      &state,
      "POST",
      "/api/telegram/web-hook",
      None,
      None,
      Some(json!({
        "update_id": 2,
        "message": { "chat": { "id": 5 }, "text": "/start" }
      })),
    )
    .await;

    let sent = state.messenger.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.contains("invalid"), "reply: {}", sent[0].1);
    assert!(sent[1].1.contains("link"), "reply: {}", sent[1].1);
  }

  #[tokio::test]
  async fn direct_send_requires_linked_chat() {
    let state = make_state().await;
    register_pharmacy(&state).await;
    let patient_id = create_patient(&state).await;

    let resp = call(
      &state,
      "POST",
      "/api/telegram/send",
      Some((EMAIL, PASSWORD)),
      None,
      Some(json!({ "patient_id": patient_id, "message": "hello" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }
}
