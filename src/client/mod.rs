//! Client side of the session: token persistence and an authenticated HTTP
//! wrapper used by front ends talking to this service.

pub mod session;
pub mod token_store;

pub use session::AuthSession;
pub use token_store::{FileStorage, MemoryStorage, SessionStorage, TokenManager};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Session expired, please log in again")]
    SessionExpired,
}

pub type ClientResult<T> = Result<T, ClientError>;
