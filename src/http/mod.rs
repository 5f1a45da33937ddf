//! Authenticated request context with re-authentication on 401/403.

mod client;
mod retry;

pub use client::ConnectClient;
pub use retry::{MAX_ATTEMPTS, RETRY_DELAY_MS, RetryPolicy};
