//! Redeem: burn tokens, keeping any change.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{FlowOutcome, into_status, parse_member};
use crate::compose::{RedeemParams, compose_redeem, validate_redeem_request};
use crate::ledger::{Finalizer, MemberLookup, NotaryLookup, UnspentQuery};
use crate::token::ChangeTemplate;
use crate::{TokenError, TokenService};

/// Request body of a redeem flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemTokenRequest {
    pub issuer: String,
    /// Holder; must be the member running the flow.
    pub owner: String,
    pub quantity: Decimal,
}

impl<M, Q, F> TokenService<M, Q, F>
where
    M: MemberLookup + NotaryLookup,
    Q: UnspentQuery,
    F: Finalizer,
{
    /// Removes `request.quantity` of the issuer's tokens from circulation.
    ///
    /// When the redeemer is not the issuer, the issuer co-signs and is
    /// asked to check the transaction.
    ///
    /// # Errors
    ///
    /// - [`TokenError::MemberNotFound`] if the issuer is unknown.
    /// - [`TokenError::RoleMismatch`] if this node is not the owner.
    /// - [`TokenError::InsufficientBalance`] if holdings cannot cover the amount.
    /// - [`TokenError::AmbiguousSignatory`] / [`TokenError::AmbiguousNotary`]
    ///   if the selected inputs disagree on owner or notary.
    /// - [`TokenError::Finality`] if finalisation fails.
    pub async fn redeem(&self, request: &RedeemTokenRequest) -> Result<FlowOutcome, TokenError> {
        self.check_cancelled()?;
        info!(issuer = %request.issuer, owner = %request.owner, "redeem flow started");

        let issuer_name = parse_member(&request.issuer)?;
        let owner_name = parse_member(&request.owner)?;
        let issuer = self.inner.members.require(&issuer_name)?;
        let me = self.inner.members.my_info();
        let quantity = self.token_quantity(request.quantity)?;

        validate_redeem_request(me.name(), &owner_name, quantity)?;

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

        let plan = compose_redeem(
            selection,
            RedeemParams {
                issuer_name,
                issuer: issuer.canonical_key(),
                redeemer_name: me.name().clone(),
            },
        )?;
        let notary = plan.notary().cloned().ok_or(TokenError::AmbiguousNotary)?;

        self.finalize_plan(plan, notary).await
    }

    /// [`Self::redeem`], reported as a status line.
    pub async fn redeem_status(&self, request: &RedeemTokenRequest) -> Result<String, TokenError> {
        into_status(self.redeem(request).await, |_| {
            format!(
                "Successfully Redeemed Fungible Token(amount:{})",
                request.quantity
            )
        })
    }
}
