//! # Submission Sink
//!
//! Where submit hands a signed, hashed transaction. The contract is small:
//!
//! - `accept` is idempotent on the transaction hash. Accepting a hash that
//!   is already held is a successful no-op reported as
//!   [`Acceptance::AlreadyKnown`].
//! - `accept` recomputes the hash of the content and refuses a transaction
//!   whose declared `id` differs.
//! - `accept` is safe to call concurrently.
//! - `reserve` holds a hash while its broadcast is in flight. A second
//!   submit of a held hash is refused with a retriable
//!   [`MempoolError::BroadcastInFlight`] until the holder calls `confirm`
//!   (the entry becomes an ordinary accepted one) or `release` (it is
//!   gone and the next submit starts over).
//!
//! [`Mempool`] is the implementation the server runs.

mod pool;

use std::fmt;

pub use pool::{Mempool, MempoolConfig, MempoolEntry};

use crate::error::ConstructionError;
use crate::transaction::NativeTransaction;

/// Outcome of a successful `accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// First time this hash was seen.
    Accepted,
    /// The hash was already held. Nothing changed.
    AlreadyKnown,
}

impl Acceptance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::AlreadyKnown => "duplicate",
        }
    }
}

/// Receives signed transactions from the submit stage.
pub trait SubmissionSink: Send + Sync {
    /// Registers a signed transaction whose `id` is its hash.
    fn accept(&self, tx: &NativeTransaction) -> Result<Acceptance, MempoolError>;

    /// Holds a signed transaction while it is broadcast. The entry counts
    /// against capacity but is not handed out until [`confirm`].
    ///
    /// [`confirm`]: SubmissionSink::confirm
    fn reserve(&self, tx: &NativeTransaction) -> Result<Acceptance, MempoolError>;

    /// Turns a reserved entry into an accepted one. Returns whether the
    /// hash was still held.
    fn confirm(&self, hash: &str) -> bool;

    /// Drops an accepted or reserved transaction. Returns whether it was held.
    fn release(&self, hash: &str) -> bool;
}

/// Reasons a sink refuses a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MempoolError {
    /// The transaction carries no `id`.
    MissingHash,

    /// The transaction carries no signature.
    Unsigned,

    /// The declared `id` is not the hash of the content.
    HashMismatch { declared: String, computed: String },

    /// The content could not be hashed.
    Encoding(String),

    /// The offered gas price is below the pool minimum.
    GasPriceTooLow { min: u128, got: u128 },

    /// The sender already has too many pending transactions.
    SenderLimitExceeded { sender: String, limit: usize },

    /// The pool is at capacity and the incoming transaction does not outbid
    /// the lowest-priced entry.
    MempoolFull { size: usize },

    /// Another submit of the same hash is still waiting on the node.
    BroadcastInFlight { hash: String },
}

impl MempoolError {
    /// Capacity conditions clear as transactions leave the pool; an
    /// in-flight broadcast settles one way or the other.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::SenderLimitExceeded { .. }
                | Self::MempoolFull { .. }
                | Self::BroadcastInFlight { .. }
        )
    }
}

impl fmt::Display for MempoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHash => write!(f, "transaction has no hash assigned"),
            Self::Unsigned => write!(f, "transaction is not signed"),
            Self::HashMismatch { declared, computed } => write!(
                f,
                "declared hash {} does not match content hash {}",
                declared, computed
            ),
            Self::Encoding(msg) => write!(f, "cannot hash transaction: {}", msg),
            Self::GasPriceTooLow { min, got } => {
                write!(f, "gas price too low: minimum {}, got {}", min, got)
            }
            Self::SenderLimitExceeded { sender, limit } => {
                write!(
                    f,
                    "sender {} exceeded per-sender limit of {}",
                    sender, limit
                )
            }
            Self::MempoolFull { size } => {
                write!(f, "mempool is full ({} transactions)", size)
            }
            Self::BroadcastInFlight { hash } => {
                write!(f, "transaction {} is already being broadcast", hash)
            }
        }
    }
}

impl std::error::Error for MempoolError {}

impl From<MempoolError> for ConstructionError {
    fn from(err: MempoolError) -> Self {
        match err {
            MempoolError::HashMismatch { declared, computed } => {
                ConstructionError::HashMismatch { declared, computed }
            }
            MempoolError::Encoding(msg) => ConstructionError::HashComputation(msg),
            other => ConstructionError::SubmissionRejected {
                reason: other.to_string(),
                retriable: other.is_retriable(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_errors_are_retriable() {
        let full: ConstructionError = MempoolError::MempoolFull { size: 10 }.into();
        assert_eq!(full.code(), 14);
        assert!(full.retriable());

        let busy = MempoolError::SenderLimitExceeded {
            sender: "zil1x".into(),
            limit: 1,
        };
        assert!(busy.is_retriable());

        let in_flight: ConstructionError = MempoolError::BroadcastInFlight {
            hash: "ab".repeat(32),
        }
        .into();
        assert_eq!(in_flight.code(), 14);
        assert!(in_flight.retriable());
    }

    #[test]
    fn integrity_errors_are_not_retriable() {
        let err: ConstructionError = MempoolError::HashMismatch {
            declared: "aa".into(),
            computed: "bb".into(),
        }
        .into();
        assert!(matches!(err, ConstructionError::HashMismatch { .. }));
        assert!(!err.retriable());

        let err: ConstructionError = MempoolError::GasPriceTooLow { min: 2, got: 1 }.into();
        assert!(matches!(
            err,
            ConstructionError::SubmissionRejected { retriable: false, .. }
        ));
    }

    #[test]
    fn acceptance_status_strings() {
        assert_eq!(Acceptance::Accepted.as_str(), "accepted");
        assert_eq!(Acceptance::AlreadyKnown.as_str(), "duplicate");
    }
}
