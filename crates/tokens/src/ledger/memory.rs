//! In-memory vault and notary backed by a single `RwLock`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use config::constants::TOKEN_STATE_TYPE;
use ledger_core::MemberName;
use tracing::{debug, warn};

use super::finality::{FinalityError, FinalizedTransaction, Finalizer};
use super::identity::NotaryLookup;
use super::membership::InMemoryMembership;
use super::query::{UnspentQuery, UnspentQueryParams};
use super::transaction::LedgerTransaction;
use crate::TokenError;
use crate::contract;
use crate::operations::responder;
use crate::token::{StateRef, UnspentTokenRef};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

struct StoredRecord {
    entry: UnspentTokenRef,
    recorded_at: SystemTime,
}

#[derive(Default)]
struct VaultState {
    /// Unspent records keyed by insertion sequence, so queries page stably.
    unspent: BTreeMap<u64, StoredRecord>,
    /// StateRef -> sequence number in `unspent`.
    index: HashMap<StateRef, u64>,
    /// Every input ever consumed.
    consumed: HashSet<StateRef>,
    next_seq: u64,
}

// ---------------------------------------------------------------------------
// InMemoryLedger
// ---------------------------------------------------------------------------

/// Shared vault plus notary for a local network.
///
/// Cheap to clone; every node of the network holds a clone. Finalisation is
/// atomic under one write lock: the first transaction to consume an input
/// wins and later ones fail with [`FinalityError::DoubleSpend`].
#[derive(Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<VaultState>>,
    membership: InMemoryMembership,
}

impl InMemoryLedger {
    /// Creates an empty ledger that resolves counterparties and notaries
    /// through `membership`.
    pub fn new(membership: InMemoryMembership) -> Self {
        Self {
            state: Arc::new(RwLock::new(VaultState::default())),
            membership,
        }
    }

    /// Returns `true` if `state_ref` has been consumed.
    pub fn is_consumed(&self, state_ref: &StateRef) -> bool {
        self.state
            .read()
            .map(|s| s.consumed.contains(state_ref))
            .unwrap_or(false)
    }

    /// Number of unspent records across all owners.
    pub fn unspent_count(&self) -> usize {
        self.state.read().map(|s| s.unspent.len()).unwrap_or(0)
    }

    fn commit(
        &self,
        tx: &LedgerTransaction,
        counterparties: &[MemberName],
    ) -> Result<FinalizedTransaction, FinalityError> {
        if SystemTime::now() > tx.time_window_until() {
            return Err(FinalityError::TimeWindowExpired);
        }

        if !self.membership.notaries().contains(tx.notary()) {
            return Err(FinalityError::Rejected(format!(
                "unknown notary {}",
                tx.notary()
            )));
        }

        contract::verify(tx)?;

        let mut state = self
            .state
            .write()
            .map_err(|_| FinalityError::LedgerUnavailable)?;

        let mut seen = HashSet::with_capacity(tx.inputs().len());
        for input in tx.inputs() {
            let state_ref = input.state_ref;
            if state.consumed.contains(&state_ref) || !seen.insert(state_ref) {
                return Err(FinalityError::DoubleSpend(state_ref));
            }
            let stored = state
                .index
                .get(&state_ref)
                .and_then(|seq| state.unspent.get(seq))
                .ok_or(FinalityError::UnknownInput(state_ref))?;
            if stored.entry.record != input.record {
                return Err(FinalityError::UnknownInput(state_ref));
            }
            if &stored.entry.notary != tx.notary() {
                return Err(FinalityError::NotaryMismatch {
                    expected: stored.entry.notary.clone(),
                    actual: tx.notary().clone(),
                });
            }
        }

        for counterparty in counterparties {
            if self.membership.lookup(counterparty).is_none() {
                return Err(FinalityError::Rejected(format!(
                    "unknown counterparty {counterparty}"
                )));
            }
            responder::receive_finality(tx, counterparty)?;
        }

        for input in tx.inputs() {
            if let Some(seq) = state.index.remove(&input.state_ref) {
                state.unspent.remove(&seq);
            }
            state.consumed.insert(input.state_ref);
        }

        let now = SystemTime::now();
        let mut outputs = Vec::with_capacity(tx.outputs().len());
        for (state_ref, record) in tx.output_refs() {
            let entry = UnspentTokenRef {
                record: record.clone(),
                state_ref,
                notary: tx.notary().clone(),
            };
            let seq = state.next_seq;
            state.next_seq += 1;
            state.index.insert(state_ref, seq);
            state.unspent.insert(
                seq,
                StoredRecord {
                    entry: entry.clone(),
                    recorded_at: now,
                },
            );
            outputs.push(entry);
        }

        Ok(FinalizedTransaction {
            id: tx.id(),
            outputs,
        })
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("unspent", &self.unspent_count())
            .finish()
    }
}

impl UnspentQuery for InMemoryLedger {
    fn query_unspent(
        &self,
        params: &UnspentQueryParams,
    ) -> Result<Vec<UnspentTokenRef>, TokenError> {
        if params.state_type != TOKEN_STATE_TYPE {
            return Ok(Vec::new());
        }
        let state = self.state.read().map_err(|_| TokenError::QueryFailed)?;
        Ok(state
            .unspent
            .values()
            .filter(|s| s.recorded_at <= params.as_of)
            .filter(|s| s.entry.record.owner.hash() == params.owner_key_hash)
            .skip(params.offset)
            .take(params.limit)
            .map(|s| s.entry.clone())
            .collect())
    }
}

impl Finalizer for InMemoryLedger {
    fn finalize(
        &self,
        tx: LedgerTransaction,
        counterparties: &[MemberName],
    ) -> impl std::future::Future<Output = Result<FinalizedTransaction, FinalityError>> + Send
    {
        let result = self.commit(&tx, counterparties);
        match &result {
            Ok(done) => debug!(
                tx_id = %done.id,
                command = %tx.command(),
                outputs = done.outputs.len(),
                "transaction finalised"
            ),
            Err(e) => warn!(tx_id = %tx.id(), error = %e, "finalisation rejected"),
        }
        std::future::ready(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ledger_core::LedgerKey;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::contract::{Command, ContractViolation};
    use crate::test_fixtures::{alice, bob, notary, q};
    use crate::token::TokenRecord;

    struct Net {
        ledger: InMemoryLedger,
        alice: LedgerKey,
        bob: LedgerKey,
    }

    fn net() -> Net {
        let membership = InMemoryMembership::new();
        let alice = membership.register(alice()).unwrap().canonical_key();
        let bob = membership.register(bob()).unwrap().canonical_key();
        membership.register_notary(notary()).unwrap();
        Net {
            ledger: InMemoryLedger::new(membership),
            alice,
            bob,
        }
    }

    fn later() -> SystemTime {
        SystemTime::now() + Duration::from_secs(3600)
    }

    fn params(owner: LedgerKey) -> UnspentQueryParams {
        UnspentQueryParams {
            owner_key_hash: owner.hash(),
            state_type: TOKEN_STATE_TYPE,
            limit: 50,
            offset: 0,
            as_of: SystemTime::now() + Duration::from_secs(1),
        }
    }

    fn token(net: &Net, owner: LedgerKey, amount: rust_decimal::Decimal) -> TokenRecord {
        TokenRecord {
            issuer_name: alice(),
            issuer: net.alice,
            owner,
            quantity: q(amount),
        }
    }

    fn issue(net: &Net, amount: rust_decimal::Decimal) -> FinalizedTransaction {
        let tx = LedgerTransaction::new(
            Command::Issue,
            vec![],
            vec![token(net, net.bob, amount)],
            vec![net.alice, net.bob],
            notary(),
            later(),
        );
        net.ledger.commit(&tx, &[bob()]).unwrap()
    }

    #[test]
    fn issued_records_are_queryable_by_owner() {
        let net = net();
        issue(&net, dec!(10));
        issue(&net, dec!(20));

        let found = net.ledger.query_unspent(&params(net.bob)).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|u| u.notary == notary()));
        assert!(net.ledger.query_unspent(&params(net.alice)).unwrap().is_empty());
    }

    #[test]
    fn query_pages_with_offset_and_limit() {
        let net = net();
        for _ in 0..5 {
            issue(&net, dec!(1));
        }
        let mut p = params(net.bob);
        p.limit = 2;
        p.offset = 4;
        assert_eq!(net.ledger.query_unspent(&p).unwrap().len(), 1);
        p.offset = 0;
        assert_eq!(net.ledger.query_unspent(&p).unwrap().len(), 2);
    }

    #[test]
    fn query_ignores_other_state_types_and_future_records() {
        let net = net();
        issue(&net, dec!(1));

        let mut p = params(net.bob);
        p.state_type = "something.Else";
        assert!(net.ledger.query_unspent(&p).unwrap().is_empty());

        let mut p = params(net.bob);
        p.as_of = SystemTime::UNIX_EPOCH;
        assert!(net.ledger.query_unspent(&p).unwrap().is_empty());
    }

    #[test]
    fn second_spend_of_same_input_fails() {
        let net = net();
        let issued = issue(&net, dec!(10));
        let input = issued.outputs[0].clone();

        let spend = || {
            LedgerTransaction::new(
                Command::Transfer,
                vec![input.clone()],
                vec![token(&net, net.alice, dec!(10))],
                vec![net.bob],
                notary(),
                later(),
            )
        };

        net.ledger.commit(&spend(), &[alice()]).unwrap();
        assert!(net.ledger.is_consumed(&input.state_ref));
        assert_eq!(
            net.ledger.commit(&spend(), &[alice()]),
            Err(FinalityError::DoubleSpend(input.state_ref))
        );
    }

    #[test]
    fn input_listed_twice_does_not_mint() {
        let net = net();
        let issued = issue(&net, dec!(10));
        let input = issued.outputs[0].clone();

        let tx = LedgerTransaction::new(
            Command::Transfer,
            vec![input.clone(), input.clone()],
            vec![token(&net, net.alice, dec!(20))],
            vec![net.bob],
            notary(),
            later(),
        );
        assert_eq!(
            net.ledger.commit(&tx, &[alice()]),
            Err(FinalityError::Contract(ContractViolation::DuplicateInput))
        );
        assert!(!net.ledger.is_consumed(&input.state_ref));
        assert_eq!(net.ledger.query_unspent(&params(net.bob)).unwrap(), vec![input]);
        assert!(net.ledger.query_unspent(&params(net.alice)).unwrap().is_empty());
    }

    #[test]
    fn contract_violation_is_rejected_before_commit() {
        let net = net();
        let tx = LedgerTransaction::new(
            Command::Issue,
            vec![],
            vec![token(&net, net.bob, dec!(10))],
            vec![net.bob],
            notary(),
            later(),
        );
        assert_eq!(
            net.ledger.commit(&tx, &[bob()]),
            Err(FinalityError::Contract(ContractViolation::IssueSignatories))
        );
        assert_eq!(net.ledger.unspent_count(), 0);
    }

    #[test]
    fn expired_window_rejected() {
        let net = net();
        let tx = LedgerTransaction::new(
            Command::Issue,
            vec![],
            vec![token(&net, net.bob, dec!(10))],
            vec![net.alice, net.bob],
            notary(),
            SystemTime::UNIX_EPOCH,
        );
        assert_eq!(
            net.ledger.commit(&tx, &[bob()]),
            Err(FinalityError::TimeWindowExpired)
        );
    }

    #[test]
    fn unknown_input_rejected() {
        let net = net();
        let issued = issue(&net, dec!(10));
        let mut forged = issued.outputs[0].clone();
        forged.state_ref.index = 9;

        let tx = LedgerTransaction::new(
            Command::Transfer,
            vec![forged.clone()],
            vec![token(&net, net.alice, dec!(10))],
            vec![net.bob],
            notary(),
            later(),
        );
        assert_eq!(
            net.ledger.commit(&tx, &[alice()]),
            Err(FinalityError::UnknownInput(forged.state_ref))
        );
    }

    #[test]
    fn unknown_counterparty_rejected() {
        let net = net();
        let tx = LedgerTransaction::new(
            Command::Issue,
            vec![],
            vec![token(&net, net.bob, dec!(10))],
            vec![net.alice, net.bob],
            notary(),
            later(),
        );
        let stranger: MemberName = "CN=Mallory, O=Evil, L=Paris, C=FR".parse().unwrap();
        assert!(matches!(
            net.ledger.commit(&tx, &[stranger]),
            Err(FinalityError::Rejected(_))
        ));
    }
}
