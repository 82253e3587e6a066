//! Token flows: issue, transfer, redeem, balance, and the responder check.
//!
//! Every initiating flow follows the same pattern:
//!
//! 1. Check the cancellation token
//! 2. Parse member names and resolve them through [`MemberLookup`]
//! 3. Check request preconditions (`compose::validate_*_request`)
//! 4. Query the vault and filter to the issuer/owner pair
//! 5. Select and compose a [`TransactionPlan`]
//! 6. Verify the contract locally, then hand off to the [`Finalizer`]
//!
//! Each flow has a structured form returning [`FlowOutcome`] and a
//! `*_status` form returning the human-readable status line. In the status
//! form a finalisation failure is reported as
//! `Flow failed, message: <reason>` instead of an error; every earlier
//! failure is still an `Err`.

pub mod balance;
pub mod issue;
pub mod redeem;
pub mod request;
pub mod responder;
pub mod transfer;

pub use balance::TokenBalanceRequest;
pub use issue::IssueTokenRequest;
pub use redeem::RedeemTokenRequest;
pub use request::{ClientRequest, ClientResponse, FlowKind, FlowStatus};
pub use transfer::TransferTokenRequest;

use std::time::SystemTime;

use ledger_core::{MemberName, Quantity};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::compose::TransactionPlan;
use crate::contract;
use crate::ledger::{
    Finalizer, LedgerTransaction, MemberInfo, MemberLookup, NotaryLookup, UnspentQuery,
    UnspentQueryParams,
};
use crate::token::{StateRef, TokenFilter, TxId, UnspentTokenRef};
use crate::{TokenError, TokenService};

/// Status prefix for a flow whose finalisation failed.
pub const FLOW_FAILED_PREFIX: &str = "Flow failed, message: ";

// ---------------------------------------------------------------------------
// FlowOutcome
// ---------------------------------------------------------------------------

/// Result of a finalised issue, transfer or redeem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOutcome {
    /// Id of the finalised transaction.
    pub tx_id: TxId,

    /// Records consumed, in selection order.
    pub consumed: Vec<StateRef>,

    /// Records created, in output order.
    pub created: Vec<UnspentTokenRef>,
}

/// Turns a flow result into a status line.
///
/// Finalisation failures become `Ok("Flow failed, message: ...")`; other
/// errors are returned unchanged.
pub(crate) fn into_status<T>(
    result: Result<T, TokenError>,
    on_success: impl FnOnce(T) -> String,
) -> Result<String, TokenError> {
    match result {
        Ok(value) => Ok(on_success(value)),
        Err(TokenError::Finality(e)) => Ok(format!("{FLOW_FAILED_PREFIX}{e}")),
        Err(e) => Err(e),
    }
}

/// Parses a member name as given in a request.
pub(crate) fn parse_member(raw: &str) -> Result<MemberName, TokenError> {
    Ok(raw.parse::<MemberName>()?)
}

// ---------------------------------------------------------------------------
// Shared flow steps
// ---------------------------------------------------------------------------

impl<M, Q, F> TokenService<M, Q, F>
where
    M: MemberLookup + NotaryLookup,
    Q: UnspentQuery,
    F: Finalizer,
{
    /// The member this node runs as.
    pub fn me(&self) -> MemberInfo {
        self.inner.members.my_info()
    }

    /// Converts a requested amount to the token scale. Never rounds.
    pub(crate) fn token_quantity(&self, value: Decimal) -> Result<Quantity, TokenError> {
        Ok(Quantity::new(value, self.inner.config.token_scale)?)
    }

    /// Unspent records held by `owner` and minted by `issuer`.
    ///
    /// Queries one page by the owner's canonical key hash, then keeps only
    /// records whose issuer and owner keys belong to the two members.
    pub(crate) fn holdings(
        &self,
        issuer: &MemberInfo,
        owner: &MemberInfo,
    ) -> Result<Vec<UnspentTokenRef>, TokenError> {
        let params = UnspentQueryParams {
            owner_key_hash: owner.canonical_key().hash(),
            state_type: config::constants::TOKEN_STATE_TYPE,
            limit: self.inner.config.query_limit,
            offset: 0,
            as_of: SystemTime::now(),
        };
        let candidates = self.inner.vault.query_unspent(&params)?;
        let fetched = candidates.len();

        let filter = TokenFilter {
            issuer_keys: issuer.ledger_keys(),
            owner_keys: owner.ledger_keys(),
        };
        let kept = filter.apply(candidates);
        debug!(
            owner = %params.owner_key_hash,
            fetched,
            kept = kept.len(),
            "queried unspent tokens"
        );
        Ok(kept)
    }

    /// Verifies `plan` locally and finalises it with `notary`.
    pub(crate) async fn finalize_plan(
        &self,
        plan: TransactionPlan,
        notary: MemberName,
    ) -> Result<FlowOutcome, TokenError> {
        self.check_cancelled()?;

        let until = SystemTime::now() + self.inner.config.time_window;
        let tx = LedgerTransaction::from_plan(&plan, notary, until);
        contract::verify(&tx)?;

        let tx_id = tx.id();
        info!(
            %tx_id,
            command = %plan.command(),
            inputs = plan.inputs().len(),
            outputs = plan.outputs().len(),
            "finalising transaction"
        );

        let finalized = self
            .inner
            .finalizer
            .finalize(tx, plan.counterparties())
            .await?;
        info!(%tx_id, "finalisation has been finished");

        Ok(FlowOutcome {
            tx_id: finalized.id,
            consumed: plan.inputs().iter().map(|i| i.state_ref).collect(),
            created: finalized.outputs,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::FinalityError;

    #[test]
    fn finality_failure_becomes_status_line() {
        let status = into_status::<()>(
            Err(TokenError::Finality(FinalityError::TimeWindowExpired)),
            |_| unreachable!(),
        )
        .unwrap();
        assert_eq!(
            status,
            "Flow failed, message: transaction time window has expired"
        );
    }

    #[test]
    fn other_errors_stay_errors() {
        let result = into_status::<()>(Err(TokenError::NotaryNotFound), |_| unreachable!());
        assert_eq!(result, Err(TokenError::NotaryNotFound));
    }

    #[test]
    fn request_names_are_validated() {
        assert!(parse_member("CN=Alice, O=R3, L=London, C=GB").is_ok());
        assert!(matches!(
            parse_member("Alice"),
            Err(TokenError::InvalidMemberName(_))
        ));
    }
}
