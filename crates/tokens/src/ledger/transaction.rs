//! The transaction handed to finalisation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bitcoin::hashes::{Hash, HashEngine, sha256};
use ledger_core::{LedgerKey, MemberName};

use crate::compose::TransactionPlan;
use crate::contract::Command;
use crate::token::{StateRef, TokenRecord, TxId, UnspentTokenRef};

/// Distinguishes otherwise identical transactions (two equal issues, say).
static NEXT_NONCE: AtomicU64 = AtomicU64::new(0);

// ---------------------------------------------------------------------------
// LedgerTransaction
// ---------------------------------------------------------------------------

/// A plan bound to a notary and a time window, ready to be finalised.
///
/// The id is the SHA-256 of the transaction's content plus a process-wide
/// nonce, so it is unique even for repeated identical requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    id: TxId,
    command: Command,
    inputs: Vec<UnspentTokenRef>,
    outputs: Vec<TokenRecord>,
    signatories: Vec<LedgerKey>,
    notary: MemberName,
    time_window_until: SystemTime,
}

impl LedgerTransaction {
    pub fn new(
        command: Command,
        inputs: Vec<UnspentTokenRef>,
        outputs: Vec<TokenRecord>,
        signatories: Vec<LedgerKey>,
        notary: MemberName,
        time_window_until: SystemTime,
    ) -> Self {
        let nonce = NEXT_NONCE.fetch_add(1, Ordering::Relaxed);
        let id = compute_id(
            command,
            &inputs,
            &outputs,
            &signatories,
            &notary,
            time_window_until,
            nonce,
        );
        Self {
            id,
            command,
            inputs,
            outputs,
            signatories,
            notary,
            time_window_until,
        }
    }

    /// Binds `plan` to `notary`, valid until `time_window_until`.
    pub fn from_plan(
        plan: &TransactionPlan,
        notary: MemberName,
        time_window_until: SystemTime,
    ) -> Self {
        Self::new(
            plan.command(),
            plan.inputs().to_vec(),
            plan.outputs().to_vec(),
            plan.signatories().to_vec(),
            notary,
            time_window_until,
        )
    }

    pub fn id(&self) -> TxId {
        self.id
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn inputs(&self) -> &[UnspentTokenRef] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TokenRecord] {
        &self.outputs
    }

    pub fn signatories(&self) -> &[LedgerKey] {
        &self.signatories
    }

    pub fn notary(&self) -> &MemberName {
        &self.notary
    }

    /// Upper bound of the validity window. Finalising after it fails.
    pub fn time_window_until(&self) -> SystemTime {
        self.time_window_until
    }

    /// References the outputs will have once finalised, in output order.
    pub fn output_refs(&self) -> impl Iterator<Item = (StateRef, &TokenRecord)> {
        let tx_id = self.id;
        self.outputs.iter().zip(0u32..).map(move |(record, index)| {
            (StateRef { tx_id, index }, record)
        })
    }
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

fn compute_id(
    command: Command,
    inputs: &[UnspentTokenRef],
    outputs: &[TokenRecord],
    signatories: &[LedgerKey],
    notary: &MemberName,
    until: SystemTime,
    nonce: u64,
) -> TxId {
    let mut engine = sha256::Hash::engine();
    engine.input(&[command.tag()]);

    engine.input(&(inputs.len() as u32).to_be_bytes());
    for input in inputs {
        engine.input(&input.state_ref.tx_id.0);
        engine.input(&input.state_ref.index.to_be_bytes());
    }

    engine.input(&(outputs.len() as u32).to_be_bytes());
    for output in outputs {
        input_str(&mut engine, &output.issuer_name.to_string());
        engine.input(output.issuer.as_bytes());
        engine.input(output.owner.as_bytes());
        input_str(&mut engine, &output.quantity.to_string());
    }

    engine.input(&(signatories.len() as u32).to_be_bytes());
    for key in signatories {
        engine.input(key.as_bytes());
    }

    input_str(&mut engine, &notary.to_string());
    let until_secs = until
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    engine.input(&until_secs.to_be_bytes());
    engine.input(&nonce.to_be_bytes());

    TxId(sha256::Hash::from_engine(engine).to_byte_array())
}

/// Length-prefixed so adjacent strings cannot run together.
fn input_str(engine: &mut sha256::HashEngine, s: &str) {
    engine.input(&(s.len() as u32).to_be_bytes());
    engine.input(s.as_bytes());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_fixtures::{key, notary, record, unspent};

    fn transfer(until: SystemTime) -> LedgerTransaction {
        LedgerTransaction::new(
            Command::Transfer,
            vec![unspent(0, 1, 2, dec!(10))],
            vec![record(1, 3, dec!(4)), record(1, 2, dec!(6))],
            vec![key(2)],
            notary(),
            until,
        )
    }

    #[test]
    fn identical_content_gets_distinct_ids() {
        let until = SystemTime::now() + Duration::from_secs(60);
        assert_ne!(transfer(until).id(), transfer(until).id());
    }

    #[test]
    fn output_refs_follow_output_order() {
        let tx = transfer(SystemTime::now());
        let refs: Vec<(StateRef, TokenRecord)> =
            tx.output_refs().map(|(r, rec)| (r, rec.clone())).collect();

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].0.tx_id, tx.id());
        assert_eq!(refs[0].0.index, 0);
        assert_eq!(refs[0].1.owner, key(3));
        assert_eq!(refs[1].0.index, 1);
        assert_eq!(refs[1].1.owner, key(2));
    }
}
