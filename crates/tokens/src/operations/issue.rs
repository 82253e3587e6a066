//! Issue: mint new tokens for another member.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{FlowOutcome, into_status, parse_member};
use crate::compose::{IssueParams, compose_issue, validate_issue_request};
use crate::ledger::{Finalizer, MemberLookup, NotaryLookup, UnspentQuery};
use crate::{TokenError, TokenService};

/// Request body of an issue flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenRequest {
    /// Issuer; must be the member running the flow.
    pub issuer: String,
    /// Recipient of the new tokens.
    pub owner: String,
    pub quantity: Decimal,
}

impl<M, Q, F> TokenService<M, Q, F>
where
    M: MemberLookup + NotaryLookup,
    Q: UnspentQuery,
    F: Finalizer,
{
    /// Mints `request.quantity` for `request.owner`.
    ///
    /// Needs no vault query: an issue consumes nothing. The new record is
    /// bound to the network's single notary and signed by both the issuer
    /// and the recipient.
    ///
    /// # Errors
    ///
    /// - [`TokenError::MemberNotFound`] if the recipient is unknown.
    /// - [`TokenError::SelfTransactionRejected`] if issuer and recipient match.
    /// - [`TokenError::RoleMismatch`] if this node is not the issuer.
    /// - [`TokenError::InvalidQuantity`] / [`TokenError::InvalidAmount`] for bad amounts.
    /// - [`TokenError::NotaryNotFound`] unless exactly one notary exists.
    /// - [`TokenError::Finality`] if finalisation fails.
    pub async fn issue(&self, request: &IssueTokenRequest) -> Result<FlowOutcome, TokenError> {
        self.check_cancelled()?;
        info!(issuer = %request.issuer, owner = %request.owner, "issue flow started");

        let issuer_name = parse_member(&request.issuer)?;
        let owner_name = parse_member(&request.owner)?;
        let owner = self.inner.members.require(&owner_name)?;
        let me = self.inner.members.my_info();
        let quantity = self.token_quantity(request.quantity)?;

        validate_issue_request(me.name(), &issuer_name, &owner_name, quantity)?;
        let notary = self.inner.members.single_notary()?;

        let plan = compose_issue(IssueParams {
            issuer_name: me.name().clone(),
            issuer: me.canonical_key(),
            owner_name,
            owner: owner.canonical_key(),
            quantity,
        });

        self.finalize_plan(plan, notary).await
    }

    /// [`Self::issue`], reported as a status line.
    pub async fn issue_status(&self, request: &IssueTokenRequest) -> Result<String, TokenError> {
        into_status(self.issue(request).await, |_| {
            format!(
                "Successfully Issued New Fungible Token(amount:{}) To {}",
                request.quantity, request.owner
            )
        })
    }
}
