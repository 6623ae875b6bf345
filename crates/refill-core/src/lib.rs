//! Core domain types, the scheduling and lifecycle logic, and the trait
//! seams of the refill reminder service.
//!
//! Deliberately free of HTTP and database dependencies; every other crate
//! in the workspace depends on this one.

// Backend impls write these trait methods as native `async fn`; suppress
// the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod lifecycle;
pub mod medicine;
pub mod messenger;
pub mod notification;
pub mod patient;
pub mod pharmacy;
pub mod reminder;
pub mod scan;
pub mod schedule;
pub mod store;

pub use error::{Error, Result};
