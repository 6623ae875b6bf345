//! Telegram delivery channel for the refill reminder service.
//!
//! Two halves: the outbound [`TelegramMessenger`] (the [`Messenger`]
//! implementation used by the scanners) and the inbound webhook payload
//! types used by the chat-linking endpoint.
//!
//! [`Messenger`]: refill_core::messenger::Messenger

pub mod client;
pub mod error;
pub mod webhook;

pub use client::TelegramMessenger;
pub use error::{Error, Result};
