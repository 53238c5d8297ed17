//! Discriminated error and outcome types for the relay hot path.
//!
//! Hot-path code never throws; it returns one of these. Only startup
//! (`Config::from_env`) treats `RelayError::InvalidConfig` as fatal.

use thiserror::Error;

/// The six error kinds of the relay engine, plus allocator exhaustion.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Event refers to a channel outside the registry. Must never carry message content.
    #[error("event refers to a non-registered channel")]
    Privacy,

    /// Allocator or orchestrator detected this source message was already processed.
    #[error("duplicate source message")]
    Duplicate,

    /// Setup validation failed, or a banned/automod-blocked actor attempted an action.
    #[error("policy violation: {0}")]
    Policy(String),

    /// A platform send/edit/delete/react call failed. Never retried within the same event.
    #[error("transient target failure: {0}")]
    Transient(String),

    /// The persistence store failed a read or write. The event is abandoned, not cached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    /// Missing or malformed configuration. Fatal at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The fingerprint allocator could not find a free CC-ID within its retry bound.
    #[error("allocator exhausted after {0} attempts")]
    AllocatorExhausted(u32),
}

pub type RelayResult<T> = Result<T, RelayError>;

/// The orchestrator's terminal result for one ingress event (§7, §4.9 step 14).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Delivered to at least one target, or already handled by another replica.
    Processed { cc_id: String, delivered: usize },
    /// Ingress ran to completion but zero targets were reachable.
    Failed { cc_id: String },
    /// Automod blocked the message before delivery.
    Blocked { reason: String },
    /// Author is banned.
    Banned,
    /// Author's source server is banned.
    ServerBanned,
}
