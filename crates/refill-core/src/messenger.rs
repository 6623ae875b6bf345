//! The outbound-messaging collaborator seam.
//!
//! The core never talks to a messaging platform directly; it sends through
//! this trait and treats any error as a per-record recoverable failure.

use std::future::Future;

/// A channel that can deliver a text message to an opaque recipient
/// identifier (e.g. a chat id issued by the messaging platform).
pub trait Messenger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    recipient: &'a str,
    text: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
