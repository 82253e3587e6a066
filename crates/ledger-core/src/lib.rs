//! Core types for the fungible token ledger.
//!
//! This crate provides foundational types shared by every ledger crate:
//!
//! - [`Quantity`] -- exact fixed-point amount with a scale fixed at creation
//! - [`LedgerKey`] -- compressed secp256k1 public key identifying a party on the ledger
//! - [`KeyHash`] -- SHA-256 digest of a ledger key, used as an owner filter
//! - [`MemberName`] -- X.500-style distinguished name of a network member
//!
//! `ledger-core` has no runtime dependencies (no async, no I/O), so it can be
//! used freely as a leaf dependency.

pub mod key;
pub mod member_name;
pub mod quantity;

pub use key::{KeyHash, LedgerKey};
pub use member_name::{MemberName, MemberNameError};
pub use quantity::{Quantity, QuantityError};
