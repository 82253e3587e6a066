//! Token contract: the rules every party checks before accepting a transaction.
//!
//! [`verify`] is the authoritative, re-checkable contract. The composer
//! computes signatories so that its plans pass it, the initiating flow runs
//! it before finalisation, and every counterparty runs it again on receipt
//! (see [`crate::operations::responder`]).
//!
//! # Rules
//!
//! Structural rules per command:
//!
//! | Command | Inputs | Outputs | Value |
//! |---------|--------|---------|-------|
//! | Issue | none | at least one | every output > 0 |
//! | Transfer | at least one | at least one | per issuer, inputs == outputs |
//! | Redeem | at least one | any | per issuer, inputs > outputs |
//!
//! No input may appear twice in one transaction.
//!
//! Signatory rules:
//!
//! - Issue: every output's issuer signs ([`ISSUE_SIGNATORY_RULE`]).
//! - Transfer: every input's owner signs ([`TRANSFER_SIGNATORY_RULE`]).
//! - Redeem: every input's issuer and owner sign ([`REDEEM_SIGNATORY_RULE`]).

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use ledger_core::{LedgerKey, Quantity};

use crate::ledger::LedgerTransaction;
use crate::token::TokenRecord;

// ---------------------------------------------------------------------------
// Rule text
// ---------------------------------------------------------------------------

pub const ISSUE_SIGNATORY_RULE: &str = "On token(s) minting, the issuer must sign the transaction.";

pub const TRANSFER_SIGNATORY_RULE: &str =
    "On token(s) moving, the owner must sign the transaction.";

pub const REDEEM_SIGNATORY_RULE: &str =
    "On token(s) burning, the issuer and owner must sign the transaction.";

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// The three token state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Mint new records. Consumes nothing.
    Issue,
    /// Move value to a new owner, possibly with change.
    Transfer,
    /// Burn value. Only change is re-created.
    Redeem,
}

impl Command {
    /// Stable single-byte tag used in transaction hashing.
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Issue => 0x01,
            Self::Transfer => 0x02,
            Self::Redeem => 0x03,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issue => write!(f, "issue"),
            Self::Transfer => write!(f, "transfer"),
            Self::Redeem => write!(f, "redeem"),
        }
    }
}

// ---------------------------------------------------------------------------
// ContractViolation
// ---------------------------------------------------------------------------

/// A broken contract rule. Fatal to the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
    /// An issue output's issuer is not a signatory.
    IssueSignatories,

    /// A transfer input's owner is not a signatory.
    TransferSignatories,

    /// A redeem input's issuer or owner is not a signatory.
    RedeemSignatories,

    /// An issue consumes existing records.
    IssueConsumesInputs,

    /// A transfer or redeem consumes nothing.
    MissingInputs,

    /// The same input is listed more than once.
    DuplicateInput,

    /// An issue or transfer creates nothing.
    MissingOutputs,

    /// An output carries a zero or negative quantity.
    NonPositiveOutput,

    /// A transfer creates or destroys value for the given issuer.
    TransferNotConserved { issuer: LedgerKey },

    /// A redeem does not remove value for the given issuer.
    RedeemNotReducing { issuer: LedgerKey },

    /// Quantities in the transaction use different scales.
    InconsistentScale,
}

impl ContractViolation {
    /// Human-readable rule text.
    pub fn message(&self) -> &'static str {
        match self {
            Self::IssueSignatories => ISSUE_SIGNATORY_RULE,
            Self::TransferSignatories => TRANSFER_SIGNATORY_RULE,
            Self::RedeemSignatories => REDEEM_SIGNATORY_RULE,
            Self::IssueConsumesInputs => "On token(s) minting, no tokens may be consumed.",
            Self::MissingInputs => "On token(s) moving or burning, at least one token must be consumed.",
            Self::DuplicateInput => "A token may be consumed at most once per transaction.",
            Self::MissingOutputs => "On token(s) minting or moving, at least one token must be created.",
            Self::NonPositiveOutput => "Created token quantities must be greater than zero.",
            Self::TransferNotConserved { .. } => {
                "On token(s) moving, the sum of consumed and created quantities must be equal."
            }
            Self::RedeemNotReducing { .. } => {
                "On token(s) burning, the sum of consumed quantities must exceed the sum of created quantities."
            }
            Self::InconsistentScale => "Token quantities must share a single scale.",
        }
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ContractViolation {}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Checks `tx` against the token contract.
///
/// Structural rules are checked before signatory rules.
pub fn verify(tx: &LedgerTransaction) -> Result<(), ContractViolation> {
    let inputs: Vec<&TokenRecord> = tx.inputs().iter().map(|i| &i.record).collect();
    let outputs = tx.outputs();
    let signatories = tx.signatories();

    let mut seen = HashSet::with_capacity(tx.inputs().len());
    if !tx.inputs().iter().all(|i| seen.insert(i.state_ref)) {
        return Err(ContractViolation::DuplicateInput);
    }

    if outputs.iter().any(|o| !o.quantity.is_positive()) {
        return Err(ContractViolation::NonPositiveOutput);
    }

    match tx.command() {
        Command::Issue => {
            if !inputs.is_empty() {
                return Err(ContractViolation::IssueConsumesInputs);
            }
            if outputs.is_empty() {
                return Err(ContractViolation::MissingOutputs);
            }
            if !outputs.iter().all(|o| signatories.contains(&o.issuer)) {
                return Err(ContractViolation::IssueSignatories);
            }
        }
        Command::Transfer => {
            if inputs.is_empty() {
                return Err(ContractViolation::MissingInputs);
            }
            if outputs.is_empty() {
                return Err(ContractViolation::MissingOutputs);
            }
            let consumed = sum_by_issuer(inputs.iter().copied())?;
            let created = sum_by_issuer(outputs.iter())?;
            for issuer in consumed.keys().chain(created.keys()) {
                let (input, output) = (consumed.get(issuer), created.get(issuer));
                if let (Some(i), Some(o)) = (input, output) {
                    if i.scale() != o.scale() {
                        return Err(ContractViolation::InconsistentScale);
                    }
                }
                if input != output {
                    return Err(ContractViolation::TransferNotConserved { issuer: *issuer });
                }
            }
            if !inputs.iter().all(|i| signatories.contains(&i.owner)) {
                return Err(ContractViolation::TransferSignatories);
            }
        }
        Command::Redeem => {
            if inputs.is_empty() {
                return Err(ContractViolation::MissingInputs);
            }
            let consumed = sum_by_issuer(inputs.iter().copied())?;
            let created = sum_by_issuer(outputs.iter())?;
            if let Some(issuer) = created.keys().find(|k| !consumed.contains_key(*k)) {
                return Err(ContractViolation::RedeemNotReducing { issuer: *issuer });
            }
            for (issuer, input) in &consumed {
                if let Some(output) = created.get(issuer) {
                    if output.scale() != input.scale() {
                        return Err(ContractViolation::InconsistentScale);
                    }
                    if output >= input {
                        return Err(ContractViolation::RedeemNotReducing { issuer: *issuer });
                    }
                }
            }
            let all_signed = inputs
                .iter()
                .all(|i| signatories.contains(&i.issuer) && signatories.contains(&i.owner));
            if !all_signed {
                return Err(ContractViolation::RedeemSignatories);
            }
        }
    }

    Ok(())
}

/// Per-issuer totals. All quantities for one issuer must share a scale.
fn sum_by_issuer<'a, I>(records: I) -> Result<BTreeMap<LedgerKey, Quantity>, ContractViolation>
where
    I: Iterator<Item = &'a TokenRecord>,
{
    let mut totals: BTreeMap<LedgerKey, Quantity> = BTreeMap::new();
    for record in records {
        match totals.get_mut(&record.issuer) {
            Some(total) => {
                *total = total
                    .checked_add(record.quantity)
                    .map_err(|_| ContractViolation::InconsistentScale)?;
            }
            None => {
                totals.insert(record.issuer, record.quantity);
            }
        }
    }
    Ok(totals)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_fixtures::{key, notary, record, unspent};
    use crate::token::UnspentTokenRef;

    const ISSUER: u8 = 1;
    const OWNER: u8 = 2;
    const NEW_OWNER: u8 = 3;

    fn tx(
        command: Command,
        inputs: Vec<UnspentTokenRef>,
        outputs: Vec<TokenRecord>,
        signatories: &[u8],
    ) -> LedgerTransaction {
        LedgerTransaction::new(
            command,
            inputs,
            outputs,
            signatories.iter().map(|&b| key(b)).collect(),
            notary(),
            SystemTime::now() + Duration::from_secs(60),
        )
    }

    // -- Issue ---------------------------------------------------------------

    #[test]
    fn issue_signed_by_issuer_passes() {
        let t = tx(
            Command::Issue,
            vec![],
            vec![record(ISSUER, OWNER, dec!(100))],
            &[ISSUER, OWNER],
        );
        assert_eq!(verify(&t), Ok(()));
    }

    #[test]
    fn issue_without_issuer_signature_fails() {
        let t = tx(
            Command::Issue,
            vec![],
            vec![record(ISSUER, OWNER, dec!(100))],
            &[OWNER],
        );
        let err = verify(&t).unwrap_err();
        assert_eq!(err, ContractViolation::IssueSignatories);
        assert_eq!(err.to_string(), ISSUE_SIGNATORY_RULE);
    }

    #[test]
    fn issue_must_not_consume() {
        let t = tx(
            Command::Issue,
            vec![unspent(0, ISSUER, OWNER, dec!(1))],
            vec![record(ISSUER, OWNER, dec!(1))],
            &[ISSUER, OWNER],
        );
        assert_eq!(verify(&t), Err(ContractViolation::IssueConsumesInputs));
    }

    #[test]
    fn issue_must_create() {
        let t = tx(Command::Issue, vec![], vec![], &[ISSUER]);
        assert_eq!(verify(&t), Err(ContractViolation::MissingOutputs));
    }

    #[test]
    fn zero_output_rejected() {
        let t = tx(
            Command::Issue,
            vec![],
            vec![record(ISSUER, OWNER, dec!(0))],
            &[ISSUER, OWNER],
        );
        assert_eq!(verify(&t), Err(ContractViolation::NonPositiveOutput));
    }

    // -- Transfer ------------------------------------------------------------

    #[test]
    fn transfer_signed_by_owner_passes() {
        let t = tx(
            Command::Transfer,
            vec![unspent(0, ISSUER, OWNER, dec!(100))],
            vec![
                record(ISSUER, NEW_OWNER, dec!(60)),
                record(ISSUER, OWNER, dec!(40)),
            ],
            &[OWNER],
        );
        assert_eq!(verify(&t), Ok(()));
    }

    #[test]
    fn transfer_without_owner_signature_fails() {
        let t = tx(
            Command::Transfer,
            vec![unspent(0, ISSUER, OWNER, dec!(100))],
            vec![record(ISSUER, NEW_OWNER, dec!(100))],
            &[ISSUER, NEW_OWNER],
        );
        let err = verify(&t).unwrap_err();
        assert_eq!(err, ContractViolation::TransferSignatories);
        assert_eq!(err.message(), TRANSFER_SIGNATORY_RULE);
    }

    #[test]
    fn transfer_must_conserve_value() {
        let t = tx(
            Command::Transfer,
            vec![unspent(0, ISSUER, OWNER, dec!(100))],
            vec![record(ISSUER, NEW_OWNER, dec!(100.01))],
            &[OWNER],
        );
        assert_eq!(
            verify(&t),
            Err(ContractViolation::TransferNotConserved {
                issuer: key(ISSUER)
            })
        );
    }

    #[test]
    fn transfer_cannot_swap_issuers() {
        let t = tx(
            Command::Transfer,
            vec![unspent(0, ISSUER, OWNER, dec!(10))],
            vec![record(9, NEW_OWNER, dec!(10))],
            &[OWNER],
        );
        assert!(matches!(
            verify(&t),
            Err(ContractViolation::TransferNotConserved { .. })
        ));
    }

    #[test]
    fn transfer_must_consume() {
        let t = tx(
            Command::Transfer,
            vec![],
            vec![record(ISSUER, NEW_OWNER, dec!(1))],
            &[OWNER],
        );
        assert_eq!(verify(&t), Err(ContractViolation::MissingInputs));
    }

    #[test]
    fn transfer_listing_one_input_twice_fails() {
        let input = unspent(0, ISSUER, OWNER, dec!(10));
        let t = tx(
            Command::Transfer,
            vec![input.clone(), input],
            vec![record(ISSUER, NEW_OWNER, dec!(20))],
            &[OWNER],
        );
        assert_eq!(verify(&t), Err(ContractViolation::DuplicateInput));
    }

    #[test]
    fn redeem_listing_one_input_twice_fails() {
        let input = unspent(0, ISSUER, OWNER, dec!(10));
        let t = tx(
            Command::Redeem,
            vec![input.clone(), input],
            vec![record(ISSUER, OWNER, dec!(15))],
            &[ISSUER, OWNER],
        );
        assert_eq!(verify(&t), Err(ContractViolation::DuplicateInput));
    }

    // -- Redeem --------------------------------------------------------------

    #[test]
    fn redeem_signed_by_issuer_and_owner_passes() {
        let t = tx(
            Command::Redeem,
            vec![unspent(0, ISSUER, OWNER, dec!(100))],
            vec![record(ISSUER, OWNER, dec!(25))],
            &[OWNER, ISSUER],
        );
        assert_eq!(verify(&t), Ok(()));
    }

    #[test]
    fn redeem_without_issuer_signature_fails() {
        let t = tx(
            Command::Redeem,
            vec![unspent(0, ISSUER, OWNER, dec!(100))],
            vec![],
            &[OWNER],
        );
        let err = verify(&t).unwrap_err();
        assert_eq!(err, ContractViolation::RedeemSignatories);
        assert_eq!(err.message(), REDEEM_SIGNATORY_RULE);
    }

    #[test]
    fn redeem_without_owner_signature_fails() {
        let t = tx(
            Command::Redeem,
            vec![unspent(0, ISSUER, OWNER, dec!(100))],
            vec![],
            &[ISSUER],
        );
        assert_eq!(verify(&t), Err(ContractViolation::RedeemSignatories));
    }

    #[test]
    fn redeem_by_issuer_holding_own_tokens() {
        // Issuer and owner are the same key: one signature satisfies both.
        let t = tx(
            Command::Redeem,
            vec![unspent(0, ISSUER, ISSUER, dec!(10))],
            vec![],
            &[ISSUER],
        );
        assert_eq!(verify(&t), Ok(()));
    }

    #[test]
    fn redeem_must_reduce_value() {
        let t = tx(
            Command::Redeem,
            vec![unspent(0, ISSUER, OWNER, dec!(10))],
            vec![record(ISSUER, OWNER, dec!(10))],
            &[ISSUER, OWNER],
        );
        assert_eq!(
            verify(&t),
            Err(ContractViolation::RedeemNotReducing {
                issuer: key(ISSUER)
            })
        );
    }

    #[test]
    fn redeem_cannot_mint_other_issuer() {
        let t = tx(
            Command::Redeem,
            vec![unspent(0, ISSUER, OWNER, dec!(10))],
            vec![record(9, OWNER, dec!(1))],
            &[ISSUER, OWNER],
        );
        assert_eq!(
            verify(&t),
            Err(ContractViolation::RedeemNotReducing { issuer: key(9) })
        );
    }

    #[test]
    fn mixed_scales_rejected() {
        let mut odd = record(ISSUER, NEW_OWNER, dec!(10));
        odd.quantity = Quantity::new(dec!(10), 3).unwrap();
        let t = tx(
            Command::Transfer,
            vec![unspent(0, ISSUER, OWNER, dec!(10))],
            vec![odd],
            &[OWNER],
        );
        assert_eq!(verify(&t), Err(ContractViolation::InconsistentScale));
    }
}
