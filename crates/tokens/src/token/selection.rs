//! Token record selection strategies.
//!
//! [`TokenSelector`] is the trait that all selection algorithms implement.
//! The service stores the active strategy as `Arc<dyn TokenSelector>` and
//! delegates all record picking to it. Strategies can be swapped at runtime
//! via [`crate::TokenService::set_token_selector`].
//!
//! # Built-in strategies
//!
//! - [`SmallestFirst`]: ascending greedy pick (default).

use ledger_core::{LedgerKey, MemberName, Quantity};

use super::record::{TokenRecord, UnspentTokenRef};
use crate::TokenError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Owner and issuer identity stamped on a change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTemplate {
    /// Name of the issuer of the selected records.
    pub issuer_name: MemberName,

    /// Issuer's canonical ledger key.
    pub issuer: LedgerKey,

    /// Owner's canonical ledger key; change goes back to this key.
    pub owner: LedgerKey,
}

impl ChangeTemplate {
    fn record(&self, quantity: Quantity) -> TokenRecord {
        TokenRecord {
            issuer_name: self.issuer_name.clone(),
            issuer: self.issuer,
            owner: self.owner,
            quantity,
        }
    }
}

/// Outcome of a selection: the inputs to consume and the change to return.
///
/// Invariants: `selected >= target`; `change` is present iff
/// `selected > target`, and then `change.quantity == selected - target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    inputs: Vec<UnspentTokenRef>,
    selected: Quantity,
    change: Option<TokenRecord>,
}

impl SelectionResult {
    /// Selected records in consumption order (ascending quantity).
    pub fn inputs(&self) -> &[UnspentTokenRef] {
        &self.inputs
    }

    /// Sum of the selected records.
    pub fn selected(&self) -> Quantity {
        self.selected
    }

    /// Change record returned to the owner, if the selection overshoots.
    pub fn change(&self) -> Option<&TokenRecord> {
        self.change.as_ref()
    }

    /// Splits the result into inputs and change.
    pub fn into_parts(self) -> (Vec<UnspentTokenRef>, Option<TokenRecord>) {
        (self.inputs, self.change)
    }
}

// ---------------------------------------------------------------------------
// TokenSelector trait
// ---------------------------------------------------------------------------

/// Strategy for selecting unspent records to cover a target quantity.
///
/// Implementations receive candidates already filtered to one owner/issuer
/// pair, in the order the vault returned them, and must not assume that
/// order means anything.
pub trait TokenSelector: Send + Sync {
    /// Select records whose total meets or exceeds `target`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InsufficientBalance`] if all candidates together fall
    ///   short of `target`. Nothing is selected.
    /// - [`TokenError::ScaleMismatch`] if a candidate is not at `target`'s scale.
    fn select(
        &self,
        candidates: &[UnspentTokenRef],
        target: Quantity,
        change: &ChangeTemplate,
    ) -> Result<SelectionResult, TokenError>;
}

// ---------------------------------------------------------------------------
// SmallestFirst
// ---------------------------------------------------------------------------

/// Smallest-first greedy selection. Stateless, zero-sized.
///
/// Stable-sorts candidates ascending by quantity (ties keep vault order)
/// and takes the shortest prefix whose sum reaches the target. Spends dust
/// first; not guaranteed to use the fewest records overall.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmallestFirst;

impl TokenSelector for SmallestFirst {
    fn select(
        &self,
        candidates: &[UnspentTokenRef],
        target: Quantity,
        change: &ChangeTemplate,
    ) -> Result<SelectionResult, TokenError> {
        let scale = target.scale();
        let zero = Quantity::zero(scale);

        let mut ordered: Vec<&UnspentTokenRef> = candidates.iter().collect();
        ordered.sort_by(|a, b| a.record.quantity.cmp(&b.record.quantity));

        let available = Quantity::sum(ordered.iter().map(|c| &c.record.quantity), scale)?;
        if available < target {
            return Err(TokenError::InsufficientBalance { target, available });
        }

        let mut inputs = Vec::new();
        let mut selected = zero;
        for candidate in ordered {
            if target.checked_sub(selected)? <= zero {
                break;
            }
            selected = selected.checked_add(candidate.quantity())?;
            inputs.push(candidate.clone());
        }

        let change_quantity = selected.checked_sub(target)?;
        let change = change_quantity
            .is_positive()
            .then(|| change.record(change_quantity));

        Ok(SelectionResult {
            inputs,
            selected,
            change,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
