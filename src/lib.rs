pub mod auth;
pub mod config;
pub mod embedded;
pub mod error;
pub mod http;
pub mod runtime;

pub use auth::{Token, TokenRefresher};
pub use config::{AuthParameters, Config, CredentialSource};
pub use embedded::extract_embedded_json;
pub use error::ConnectError;
pub use http::{ConnectClient, RetryPolicy};
