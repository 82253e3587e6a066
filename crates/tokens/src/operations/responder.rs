//! Counterparty side of finalisation.

use ledger_core::MemberName;
use tracing::{info, warn};

use crate::contract::{self, ContractViolation};
use crate::ledger::LedgerTransaction;

/// Checks a transaction `me` has been asked to accept.
///
/// Re-runs the contract as the counterparty. The [`Finalizer`] calls this for
/// every counterparty and aborts if any of them refuses.
///
/// [`Finalizer`]: crate::ledger::Finalizer
pub fn receive_finality(tx: &LedgerTransaction, me: &MemberName) -> Result<(), ContractViolation> {
    match contract::verify(tx) {
        Ok(()) => {
            info!(
                member = %me,
                tx_id = %tx.id(),
                command = %tx.command(),
                outputs = tx.outputs().len(),
                "finished responder flow"
            );
            Ok(())
        }
        Err(violation) => {
            warn!(
                member = %me,
                tx_id = %tx.id(),
                %violation,
                "exceptionally finished responder flow"
            );
            Err(violation)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::contract::Command;
    use crate::test_fixtures::{bob, key, notary, record, unspent};

    #[test]
    fn accepts_valid_transfer() {
        let tx = LedgerTransaction::new(
            Command::Transfer,
            vec![unspent(0, 1, 2, dec!(5))],
            vec![record(1, 3, dec!(5))],
            vec![key(2)],
            notary(),
            SystemTime::now(),
        );
        assert_eq!(receive_finality(&tx, &bob()), Ok(()));
    }

    #[test]
    fn refuses_unsigned_redeem() {
        let tx = LedgerTransaction::new(
            Command::Redeem,
            vec![unspent(0, 1, 2, dec!(5))],
            vec![],
            vec![key(2)],
            notary(),
            SystemTime::now(),
        );
        assert_eq!(
            receive_finality(&tx, &bob()),
            Err(ContractViolation::RedeemSignatories)
        );
    }
}
