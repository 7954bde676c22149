//! Access to the Skyvern browser-automation task API.
//!
//! [`SkyvernClient`] speaks the HTTP API; [`TaskSubmitter`] layers the audit
//! goals on top of any [`TaskApi`](skyaudit_core::TaskApi).

pub mod client;
pub mod retry;
pub mod submitter;

pub use client::{SkyvernClient, DEFAULT_BASE_URL};
pub use retry::{retry_transient, RetryPolicy};
pub use submitter::TaskSubmitter;
