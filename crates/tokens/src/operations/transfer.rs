//! Transfer: move tokens to a new owner, with change back to the sender.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{FlowOutcome, into_status, parse_member};
use crate::compose::{TransferParams, compose_transfer, validate_transfer_request};
use crate::ledger::{Finalizer, MemberLookup, NotaryLookup, UnspentQuery};
use crate::token::ChangeTemplate;
use crate::{TokenError, TokenService};

/// Request body of a transfer flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTokenRequest {
    /// Issuer of the tokens being moved.
    pub issuer: String,
    /// Current owner; must be the member running the flow.
    pub owner: String,
    pub new_owner: String,
    pub quantity: Decimal,
}

impl<M, Q, F> TokenService<M, Q, F>
where
    M: MemberLookup + NotaryLookup,
    Q: UnspentQuery,
    F: Finalizer,
{
    /// Moves `request.quantity` of the issuer's tokens to `request.new_owner`.
    ///
    /// Selects from this node's holdings with the active [`TokenSelector`],
    /// sends the requested amount to the new owner's canonical key, and
    /// returns any overshoot to this node's canonical key.
    ///
    /// # Errors
    ///
    /// - [`TokenError::MemberNotFound`] if the issuer or new owner is unknown.
    /// - [`TokenError::SelfTransactionRejected`] if owner and new owner match.
    /// - [`TokenError::RoleMismatch`] if this node is not the owner.
    /// - [`TokenError::InsufficientBalance`] if holdings cannot cover the amount.
    /// - [`TokenError::AmbiguousSignatory`] / [`TokenError::AmbiguousNotary`]
    ///   if the selected inputs disagree on owner or notary.
    /// - [`TokenError::Finality`] if finalisation fails.
    ///
    /// [`TokenSelector`]: crate::token::TokenSelector
    pub async fn transfer(&self, request: &TransferTokenRequest) -> Result<FlowOutcome, TokenError> {
        self.check_cancelled()?;
        info!(
            owner = %request.owner,
            new_owner = %request.new_owner,
            "transfer flow started"
        );

        let issuer_name = parse_member(&request.issuer)?;
        let owner_name = parse_member(&request.owner)?;
        let new_owner_name = parse_member(&request.new_owner)?;
        let issuer = self.inner.members.require(&issuer_name)?;
        let new_owner = self.inner.members.require(&new_owner_name)?;
        let me = self.inner.members.my_info();
        let quantity = self.token_quantity(request.quantity)?;

        validate_transfer_request(me.name(), &owner_name, &new_owner_name, quantity)?;

        let candidates = self.holdings(&issuer, &me)?;
        let change = ChangeTemplate {
            issuer_name: issuer_name.clone(),
            issuer: issuer.canonical_key(),
            owner: me.canonical_key(),
        };
        let selection = self.token_selector().select(&candidates, quantity, &change)?;
        info!(
            selected = selection.inputs().len(),
            change = selection.change().is_some(),
            "token selection finished"
        );

        let plan = compose_transfer(
            selection,
            TransferParams {
                issuer_name,
                issuer: issuer.canonical_key(),
                new_owner_name,
                new_owner: new_owner.canonical_key(),
                quantity,
            },
        )?;
        let notary = plan.notary().cloned().ok_or(TokenError::AmbiguousNotary)?;

        self.finalize_plan(plan, notary).await
    }

    /// [`Self::transfer`], reported as a status line.
    pub async fn transfer_status(
        &self,
        request: &TransferTokenRequest,
    ) -> Result<String, TokenError> {
        into_status(self.transfer(request).await, |_| {
            format!(
                "Successfully Transferred Fungible Token(amount:{}) From {} To {}",
                request.quantity, request.owner, request.new_owner
            )
        })
    }
}
