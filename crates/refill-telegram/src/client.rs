//! Outbound Bot API client.

use std::{future::Future, time::Duration};

use refill_core::messenger::Messenger;
use reqwest::Client;
use serde::Serialize;

use crate::{Error, Result};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessageBody<'a> {
  chat_id:    &'a str,
  text:       &'a str,
  parse_mode: &'static str,
}

/// Sends reminder texts through the Telegram Bot API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct TelegramMessenger {
  client:   Client,
  api_base: String,
  token:    String,
}

impl TelegramMessenger {
  pub fn new(token: impl Into<String>) -> Result<Self> {
    Self::with_api_base(token, DEFAULT_API_BASE)
  }

  /// Point the client at a different API host — used by tests and by
  /// self-hosted Bot API deployments.
  pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self {
      client,
      api_base: api_base.into(),
      token: token.into(),
    })
  }

  fn method_url(&self, method: &str) -> String {
    format!(
      "{}/bot{}/{method}",
      self.api_base.trim_end_matches('/'),
      self.token
    )
  }

  async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
    let resp = self
      .client
      .post(self.method_url("sendMessage"))
      .json(&SendMessageBody { chat_id, text, parse_mode: "HTML" })
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let description = resp.text().await.unwrap_or_default();
      return Err(Error::Api { status, description });
    }
    Ok(())
  }
}

impl Messenger for TelegramMessenger {
  type Error = Error;

  fn send<'a>(
    &'a self,
    recipient: &'a str,
    text: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a {
    self.send_message(recipient, text)
  }
}
