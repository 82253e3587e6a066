//! Balance aggregation and owner/issuer filtering.

use ledger_core::{LedgerKey, Quantity};

use super::record::{TokenRecord, UnspentTokenRef};
use crate::TokenError;

// ---------------------------------------------------------------------------
// TokenFilter
// ---------------------------------------------------------------------------

/// Keeps only records minted by one issuer and held by one owner.
///
/// A member may hold several ledger keys; a record matches if its issuer
/// key is any of the issuer's keys and its owner key is any of the owner's.
#[derive(Debug, Clone)]
pub struct TokenFilter<'a> {
    /// Accepted issuer keys.
    pub issuer_keys: &'a [LedgerKey],

    /// Accepted owner keys.
    pub owner_keys: &'a [LedgerKey],
}

impl TokenFilter<'_> {
    /// Returns `true` if `record` was minted by the issuer and is held by the owner.
    pub fn matches(&self, record: &TokenRecord) -> bool {
        self.issuer_keys.contains(&record.issuer) && self.owner_keys.contains(&record.owner)
    }

    /// Drops every candidate that does not match, preserving arrival order.
    pub fn apply(&self, candidates: Vec<UnspentTokenRef>) -> Vec<UnspentTokenRef> {
        candidates
            .into_iter()
            .filter(|c| self.matches(&c.record))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Sums the quantities of `records` at `scale`.
///
/// Pure fold. An empty input yields zero at `scale`: an owner with no
/// holdings has a zero balance, not an error.
///
/// # Errors
///
/// [`TokenError::ScaleMismatch`] if a record is not at `scale`.
pub fn aggregate_balance<'a, I>(records: I, scale: u32) -> Result<Quantity, TokenError>
where
    I: IntoIterator<Item = &'a TokenRecord>,
{
    Ok(Quantity::sum(records.into_iter().map(|r| &r.quantity), scale)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
