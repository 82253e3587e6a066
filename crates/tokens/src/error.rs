//! Token engine error types.
//!
//! [`TokenError`] is the unified error type for all token operations. Every
//! variant is detected synchronously and aborts composition: no partially
//! built transaction plan is ever returned alongside an error.

use std::fmt;

use ledger_core::{MemberNameError, Quantity, QuantityError};

use crate::contract::ContractViolation;
use crate::ledger::FinalityError;

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

/// The party a flow expects to be running as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Issue flows must be started by the issuer.
    Issuer,
    /// Transfer, redeem and balance flows must be started by the owner.
    Owner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issuer => write!(f, "issuer"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

/// A request that names the same party on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfTransaction {
    /// Issuer and recipient are the same member.
    Issue,
    /// Owner and new owner are the same member.
    Transfer,
}

// ---------------------------------------------------------------------------
// TokenError
// ---------------------------------------------------------------------------

/// Errors from token operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Two quantities with different scales were combined. Internal error:
    /// unreachable while every record uses the configured token scale.
    ScaleMismatch { left: u32, right: u32 },

    /// A requested amount has more fractional digits than the token scale,
    /// or does not fit the decimal range.
    InvalidAmount(QuantityError),

    /// A transfer or redeem amount is zero or negative.
    InvalidQuantity(Quantity),

    /// The owner's unspent records cannot cover the target.
    InsufficientBalance { target: Quantity, available: Quantity },

    /// The flow was started by a party other than the expected one.
    RoleMismatch { expected: Role },

    /// Issuer equals owner (issue) or owner equals new owner (transfer).
    SelfTransactionRejected(SelfTransaction),

    /// The selected inputs are owned by more than one key.
    AmbiguousSignatory,

    /// The selected inputs are bound to more than one notary.
    AmbiguousNotary,

    /// A member name could not be parsed.
    InvalidMemberName(MemberNameError),

    /// A member name is not known to the network.
    MemberNotFound(String),

    /// No notary, or more than one, is available for a new issuance.
    NotaryNotFound,

    /// Key material for a member could not be derived.
    KeyDerivationFailed,

    /// A member with the same name is already registered.
    DuplicateEntry,

    /// The composed transaction breaks a contract rule.
    ContractViolation(ContractViolation),

    /// The finalisation collaborator rejected the transaction.
    Finality(FinalityError),

    /// The vault query collaborator failed.
    QueryFailed,

    /// The request body could not be decoded.
    InvalidRequest(String),

    /// The service has been shut down (cancellation token fired).
    Cancelled,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScaleMismatch { left, right } => {
                write!(f, "quantity scale mismatch: {left} vs {right}")
            }
            Self::InvalidAmount(e) => write!(f, "invalid amount: {e}"),
            Self::InvalidQuantity(q) => write!(f, "quantity must be positive, got {q}"),
            Self::InsufficientBalance { target, available } => write!(
                f,
                "Insufficient token balance: Target = {target}, Available = {available}."
            ),
            Self::RoleMismatch { expected } => {
                write!(f, "{} should be initiator", capitalised(&expected.to_string()))
            }
            Self::SelfTransactionRejected(SelfTransaction::Issue) => {
                write!(f, "Cannot issue token to yourself.")
            }
            Self::SelfTransactionRejected(SelfTransaction::Transfer) => {
                write!(f, "Cannot transfer token to yourself.")
            }
            Self::AmbiguousSignatory => write!(f, "selected inputs have more than one owner"),
            Self::AmbiguousNotary => write!(f, "selected inputs have more than one notary"),
            Self::InvalidMemberName(e) => write!(f, "invalid member name: {e}"),
            Self::MemberNotFound(name) => write!(
                f,
                "Failed to obtain member information for the specified name: {name}."
            ),
            Self::NotaryNotFound => write!(f, "Notary not found."),
            Self::KeyDerivationFailed => write!(f, "key derivation failed"),
            Self::DuplicateEntry => write!(f, "duplicate entry"),
            Self::ContractViolation(v) => write!(f, "contract violation: {v}"),
            Self::Finality(e) => write!(f, "finality failed: {e}"),
            Self::QueryFailed => write!(f, "vault query failed"),
            Self::InvalidRequest(reason) => write!(f, "invalid request: {reason}"),
            Self::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<QuantityError> for TokenError {
    fn from(e: QuantityError) -> Self {
        match e {
            QuantityError::ScaleMismatch { left, right } => Self::ScaleMismatch { left, right },
            other => Self::InvalidAmount(other),
        }
    }
}

impl From<MemberNameError> for TokenError {
    fn from(e: MemberNameError) -> Self {
        Self::InvalidMemberName(e)
    }
}

impl From<ContractViolation> for TokenError {
    fn from(v: ContractViolation) -> Self {
        Self::ContractViolation(v)
    }
}

impl From<FinalityError> for TokenError {
    fn from(e: FinalityError) -> Self {
        Self::Finality(e)
    }
}

fn capitalised(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
