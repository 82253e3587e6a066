//! Fungible token records, balance aggregation and coin selection.
//!
//! Everything here is synchronous and pure: functions take a snapshot of
//! candidate records and return values. Vault access lives in
//! [`crate::ledger`].

mod balance;
mod record;
mod selection;

pub use balance::{TokenFilter, aggregate_balance};
pub use record::{StateRef, TokenRecord, TxId, UnspentTokenRef};
pub use selection::{ChangeTemplate, SelectionResult, SmallestFirst, TokenSelector};
