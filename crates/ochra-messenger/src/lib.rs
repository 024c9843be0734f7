//! # ochra-messenger
//!
//! The decentralized messenger orchestration engine.
//!
//! This crate is the asynchronous core that coordinates identity/session
//! management, a DHT-backed mailbox protocol, listener fan-out, delivery
//! watermarks, and an outbound message queue, behind a task-submission API.
//! It treats the low-level DHT node ([`ochra_dht`]) and the post-quantum and
//! classical crypto primitives ([`ochra_crypto`]) as external collaborators
//! reached only through the narrow facades defined here.
//!
//! ## Modules
//!
//! - [`fingerprint`] — the 128-hex participant identifier and its derivation.
//! - [`vault`] — encrypted identity key files and session password handling.
//! - [`dht`] — the narrow `DhtClient` facade over the DHT mailbox protocol.
//! - [`keyserver`] — profile publish/lookup and name registration.
//! - [`outbox`] — per-contact outbox listeners with day-bucket rotation.
//! - [`delivery`] — per-contact delivery watermark tracking.
//! - [`sendqueue`] — the fire-and-forget outbound message queue.
//! - [`events`] — the single-observer event bus.
//! - [`task`] — the task queue, worker pool, and the closed task-type set.
//! - [`handlers`] — business logic for each task type.
//! - [`profile`] — the in-memory + persisted profile cache.
//! - [`store`] — per-identity SQLite facades for contacts, messages, and profiles.
//! - [`engine`] — the `Engine` that wires all of the above together.

pub mod config;
pub mod delivery;
pub mod dht;
pub mod engine;
pub mod events;
pub mod fingerprint;
pub mod handlers;
pub mod keyserver;
pub mod outbox;
pub mod profile;
pub mod sendqueue;
pub mod store;
pub mod task;
pub mod vault;

/// Stable error codes surfaced across the task-completion boundary (Section 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Ok,
    Init,
    NotInitialized,
    Network,
    Database,
    Timeout,
    Busy,
    NoIdentity,
    AlreadyExists,
    Permission,
    PasswordRequired,
    WrongPassword,
    InvalidSignature,
    InvalidArg,
    NotFound,
    Crypto,
    Internal,
    InvalidParam,
    NotImplemented,
}

/// The engine's internal error type; maps onto [`ErrorCode`] at the
/// task-completion boundary via `From<EngineError> for ErrorCode`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no identity is currently loaded")]
    NoIdentity,

    #[error("identity already exists")]
    AlreadyExists,

    #[error("a session password is required")]
    PasswordRequired,

    #[error("wrong password")]
    WrongPassword,

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("invalid argument: {0}")]
    InvalidArg(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] ochra_db::DbError),

    #[error("crypto error: {0}")]
    Crypto(#[from] ochra_crypto::CryptoError),

    #[error("dht error: {0}")]
    Dht(#[from] ochra_dht::DhtError),

    #[error("network unavailable, try again later")]
    Network,

    #[error("engine is busy")]
    Busy,

    #[error("task queue is not initialized")]
    NotInitialized,

    #[error("operation not implemented in the messenger core")]
    NotImplemented,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<&EngineError> for ErrorCode {
    fn from(e: &EngineError) -> Self {
        match e {
            EngineError::NoIdentity => ErrorCode::NoIdentity,
            EngineError::AlreadyExists => ErrorCode::AlreadyExists,
            EngineError::PasswordRequired => ErrorCode::PasswordRequired,
            EngineError::WrongPassword => ErrorCode::WrongPassword,
            EngineError::InvalidSignature => ErrorCode::InvalidSignature,
            EngineError::InvalidArg(_) => ErrorCode::InvalidArg,
            EngineError::NotFound(_) => ErrorCode::NotFound,
            EngineError::Database(_) => ErrorCode::Database,
            EngineError::Crypto(_) => ErrorCode::Crypto,
            EngineError::Dht(_) => ErrorCode::Network,
            EngineError::Network => ErrorCode::Network,
            EngineError::Busy => ErrorCode::Busy,
            EngineError::NotInitialized => ErrorCode::NotInitialized,
            EngineError::NotImplemented => ErrorCode::NotImplemented,
            EngineError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<EngineError> for ErrorCode {
    fn from(e: EngineError) -> Self {
        ErrorCode::from(&e)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(ErrorCode::from(EngineError::WrongPassword), ErrorCode::WrongPassword);
        assert_eq!(ErrorCode::from(EngineError::NoIdentity), ErrorCode::NoIdentity);
    }
}
