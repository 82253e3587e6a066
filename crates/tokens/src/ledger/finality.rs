//! Finalisation collaborator.

use std::fmt;

use ledger_core::MemberName;

use crate::contract::ContractViolation;
use crate::token::{StateRef, TxId, UnspentTokenRef};

use super::LedgerTransaction;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A transaction accepted by the notary and every counterparty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTransaction {
    /// Id of the finalised transaction.
    pub id: TxId,

    /// Records created by the transaction, now unspent.
    pub outputs: Vec<UnspentTokenRef>,
}

/// Why finalisation failed. Never retried by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalityError {
    /// An input was already consumed by another finalised transaction.
    DoubleSpend(StateRef),

    /// An input does not refer to a known record.
    UnknownInput(StateRef),

    /// The transaction names a notary other than the one its inputs are bound to.
    NotaryMismatch {
        expected: MemberName,
        actual: MemberName,
    },

    /// The time window closed before finalisation.
    TimeWindowExpired,

    /// A counterparty or the notary found a contract violation.
    Contract(ContractViolation),

    /// A counterparty refused the transaction.
    Rejected(String),

    /// The ledger could not be reached or its state is unusable.
    LedgerUnavailable,
}

impl fmt::Display for FinalityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleSpend(r) => write!(f, "input {r} has already been consumed"),
            Self::UnknownInput(r) => write!(f, "input {r} is unknown"),
            Self::NotaryMismatch { expected, actual } => {
                write!(f, "notary mismatch: expected {expected}, got {actual}")
            }
            Self::TimeWindowExpired => write!(f, "transaction time window has expired"),
            Self::Contract(v) => write!(f, "contract verification failed: {v}"),
            Self::Rejected(reason) => write!(f, "counterparty rejected transaction: {reason}"),
            Self::LedgerUnavailable => write!(f, "ledger unavailable"),
        }
    }
}

impl std::error::Error for FinalityError {}

impl From<ContractViolation> for FinalityError {
    fn from(v: ContractViolation) -> Self {
        Self::Contract(v)
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Collects signatures, notarises and records a transaction.
///
/// Every member in `counterparties` re-verifies the transaction before it is
/// committed; a refusal by any of them aborts finalisation.
pub trait Finalizer: Send + Sync {
    fn finalize(
        &self,
        tx: LedgerTransaction,
        counterparties: &[MemberName],
    ) -> impl std::future::Future<Output = Result<FinalizedTransaction, FinalityError>> + Send;
}
