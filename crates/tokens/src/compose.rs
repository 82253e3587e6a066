//! Transaction composition.
//!
//! Pure functions that turn validated request data (and, for transfer and
//! redeem, a [`SelectionResult`]) into an immutable [`TransactionPlan`]: the
//! records to consume, the records to create, the keys that must sign, and
//! the members to notify.
//!
//! Request-level preconditions (`validate_*_request`) run before any vault
//! query or selection work, so a malformed request never touches the vault.

use ledger_core::{LedgerKey, MemberName, Quantity};

use crate::contract::Command;
use crate::error::{Role, SelfTransaction};
use crate::token::{SelectionResult, TokenRecord, UnspentTokenRef};
use crate::TokenError;

// ---------------------------------------------------------------------------
// TransactionPlan
// ---------------------------------------------------------------------------

/// What a valid transaction must contain. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPlan {
    command: Command,
    inputs: Vec<UnspentTokenRef>,
    outputs: Vec<TokenRecord>,
    signatories: Vec<LedgerKey>,
    counterparties: Vec<MemberName>,
    notary: Option<MemberName>,
}

impl TransactionPlan {
    pub fn command(&self) -> Command {
        self.command
    }

    /// Records to consume, in selection order.
    pub fn inputs(&self) -> &[UnspentTokenRef] {
        &self.inputs
    }

    /// Records to create, in output order.
    pub fn outputs(&self) -> &[TokenRecord] {
        &self.outputs
    }

    /// Keys that must sign. Deduplicated, in first-required order.
    pub fn signatories(&self) -> &[LedgerKey] {
        &self.signatories
    }

    /// Members that must receive and check the finalised transaction.
    pub fn counterparties(&self) -> &[MemberName] {
        &self.counterparties
    }

    /// Notary shared by every input. `None` when nothing is consumed.
    pub fn notary(&self) -> Option<&MemberName> {
        self.notary.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Resolved inputs for an issue.
#[derive(Debug, Clone)]
pub struct IssueParams {
    pub issuer_name: MemberName,
    pub issuer: LedgerKey,
    pub owner_name: MemberName,
    pub owner: LedgerKey,
    pub quantity: Quantity,
}

/// Resolved inputs for a transfer.
#[derive(Debug, Clone)]
pub struct TransferParams {
    pub issuer_name: MemberName,
    pub issuer: LedgerKey,
    pub new_owner_name: MemberName,
    pub new_owner: LedgerKey,
    pub quantity: Quantity,
}

/// Resolved inputs for a redeem.
#[derive(Debug, Clone)]
pub struct RedeemParams {
    pub issuer_name: MemberName,
    pub issuer: LedgerKey,
    pub redeemer_name: MemberName,
}

// ---------------------------------------------------------------------------
// Request preconditions
// ---------------------------------------------------------------------------

/// Issue: recipient differs from issuer, flow runs as the issuer, amount > 0.
pub fn validate_issue_request(
    initiator: &MemberName,
    issuer: &MemberName,
    owner: &MemberName,
    quantity: Quantity,
) -> Result<(), TokenError> {
    if issuer == owner {
        return Err(TokenError::SelfTransactionRejected(SelfTransaction::Issue));
    }
    if initiator != issuer {
        return Err(TokenError::RoleMismatch {
            expected: Role::Issuer,
        });
    }
    require_positive(quantity)
}

/// Transfer: new owner differs from owner, flow runs as the owner, amount > 0.
pub fn validate_transfer_request(
    initiator: &MemberName,
    owner: &MemberName,
    new_owner: &MemberName,
    quantity: Quantity,
) -> Result<(), TokenError> {
    if owner == new_owner {
        return Err(TokenError::SelfTransactionRejected(
            SelfTransaction::Transfer,
        ));
    }
    require_owner(initiator, owner)?;
    require_positive(quantity)
}

/// Redeem: flow runs as the owner, amount > 0.
pub fn validate_redeem_request(
    initiator: &MemberName,
    owner: &MemberName,
    quantity: Quantity,
) -> Result<(), TokenError> {
    require_owner(initiator, owner)?;
    require_positive(quantity)
}

/// Balance: flow runs as the owner.
pub fn validate_balance_request(
    initiator: &MemberName,
    owner: &MemberName,
) -> Result<(), TokenError> {
    require_owner(initiator, owner)
}

fn require_owner(initiator: &MemberName, owner: &MemberName) -> Result<(), TokenError> {
    if initiator == owner {
        Ok(())
    } else {
        Err(TokenError::RoleMismatch {
            expected: Role::Owner,
        })
    }
}

fn require_positive(quantity: Quantity) -> Result<(), TokenError> {
    if quantity.is_positive() {
        Ok(())
    } else {
        Err(TokenError::InvalidQuantity(quantity))
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Mint `quantity` for the recipient.
///
/// Both issuer and recipient sign, so the recipient accepts the new record
/// at mint time.
pub fn compose_issue(params: IssueParams) -> TransactionPlan {
    let output = TokenRecord {
        issuer_name: params.issuer_name,
        issuer: params.issuer,
        owner: params.owner,
        quantity: params.quantity,
    };

    TransactionPlan {
        command: Command::Issue,
        inputs: Vec::new(),
        outputs: vec![output],
        signatories: dedup(vec![params.issuer, params.owner]),
        counterparties: vec![params.owner_name],
        notary: None,
    }
}

/// Move `quantity` to the new owner, returning any change to the current owner.
///
/// # Errors
///
/// - [`TokenError::AmbiguousSignatory`] if the inputs have zero or several owners.
/// - [`TokenError::AmbiguousNotary`] if the inputs are bound to several notaries.
pub fn compose_transfer(
    selection: SelectionResult,
    params: TransferParams,
) -> Result<TransactionPlan, TokenError> {
    let (inputs, change) = selection.into_parts();
    let owner = single_owner(&inputs)?;
    let notary = single_notary(&inputs)?;

    let mut outputs = vec![TokenRecord {
        issuer_name: params.issuer_name,
        issuer: params.issuer,
        owner: params.new_owner,
        quantity: params.quantity,
    }];
    outputs.extend(change);

    Ok(TransactionPlan {
        command: Command::Transfer,
        inputs,
        outputs,
        signatories: vec![owner],
        counterparties: vec![params.new_owner_name],
        notary: Some(notary),
    })
}

/// Burn the selected records, re-creating only the change.
///
/// The issuer co-signs and is notified unless it is the redeemer itself.
///
/// # Errors
///
/// - [`TokenError::AmbiguousSignatory`] if the inputs have zero or several owners.
/// - [`TokenError::AmbiguousNotary`] if the inputs are bound to several notaries.
pub fn compose_redeem(
    selection: SelectionResult,
    params: RedeemParams,
) -> Result<TransactionPlan, TokenError> {
    let (inputs, change) = selection.into_parts();
    let owner = single_owner(&inputs)?;
    let notary = single_notary(&inputs)?;

    let mut signatories = vec![owner];
    let mut counterparties = Vec::new();
    if params.issuer_name != params.redeemer_name {
        signatories.push(params.issuer);
        counterparties.push(params.issuer_name);
    }

    Ok(TransactionPlan {
        command: Command::Redeem,
        inputs,
        outputs: change.into_iter().collect(),
        signatories: dedup(signatories),
        counterparties,
        notary: Some(notary),
    })
}

/// The one owner key shared by every input.
fn single_owner(inputs: &[UnspentTokenRef]) -> Result<LedgerKey, TokenError> {
    let owners = dedup(inputs.iter().map(|i| i.record.owner).collect());
    match owners.as_slice() {
        [owner] => Ok(*owner),
        _ => Err(TokenError::AmbiguousSignatory),
    }
}

/// The one notary shared by every input.
fn single_notary(inputs: &[UnspentTokenRef]) -> Result<MemberName, TokenError> {
    let mut notaries = inputs.iter().map(|i| &i.notary);
    let first = notaries.next().ok_or(TokenError::AmbiguousNotary)?;
    if notaries.all(|n| n == first) {
        Ok(first.clone())
    } else {
        Err(TokenError::AmbiguousNotary)
    }
}

/// Removes repeated keys, keeping the first occurrence.
fn dedup(keys: Vec<LedgerKey>) -> Vec<LedgerKey> {
    let mut out: Vec<LedgerKey> = Vec::with_capacity(keys.len());
    for key in keys {
        if !out.contains(&key) {
            out.push(key);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
