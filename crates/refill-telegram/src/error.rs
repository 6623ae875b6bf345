//! Error type for `refill-telegram`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("HTTP transport error: {0}")]
  Http(#[from] reqwest::Error),

  /// The Bot API answered with a non-success status.
  #[error("Telegram API error ({status}): {description}")]
  Api {
    status:      reqwest::StatusCode,
    description: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
