//! Ledger collaborators: vault queries, identity, and finalisation.
//!
//! The engine talks to the outside world only through the traits here:
//!
//! - [`UnspentQuery`] -- unspent token records by owner key hash
//! - [`MemberLookup`] / [`NotaryLookup`] -- member and notary resolution
//! - [`Finalizer`] -- signature collection, notarisation and recording
//!
//! [`InMemoryMembership`] and [`InMemoryLedger`] implement them for a local
//! network. They do not persist and do not run consensus.

mod finality;
mod identity;
mod membership;
mod memory;
mod query;
mod transaction;

pub use finality::{FinalityError, FinalizedTransaction, Finalizer};
pub use identity::{MemberInfo, MemberLookup, NotaryLookup};
pub use membership::{InMemoryMembership, NodeIdentity};
pub use memory::InMemoryLedger;
pub use query::{UnspentQuery, UnspentQueryParams};
pub use transaction::LedgerTransaction;
