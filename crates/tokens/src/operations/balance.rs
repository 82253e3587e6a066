//! Balance: sum of an owner's holdings from one issuer.

use ledger_core::Quantity;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::parse_member;
use crate::compose::validate_balance_request;
use crate::ledger::{Finalizer, MemberLookup, NotaryLookup, UnspentQuery};
use crate::token::aggregate_balance;
use crate::{TokenError, TokenService};

/// Request body of a balance query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceRequest {
    pub issuer: String,
    /// Holder; must be the member running the flow.
    pub owner: String,
}

impl<M, Q, F> TokenService<M, Q, F>
where
    M: MemberLookup + NotaryLookup,
    Q: UnspentQuery,
    F: Finalizer,
{
    /// Balance of `request.owner` in tokens minted by `request.issuer`.
    ///
    /// Reads the vault only. An owner with no holdings has a zero balance.
    ///
    /// # Errors
    ///
    /// - [`TokenError::MemberNotFound`] if the issuer or owner is unknown.
    /// - [`TokenError::RoleMismatch`] if this node is not the owner.
    /// - [`TokenError::QueryFailed`] if the vault cannot be read.
    pub async fn balance(&self, request: &TokenBalanceRequest) -> Result<Quantity, TokenError> {
        self.check_cancelled()?;

        let issuer_name = parse_member(&request.issuer)?;
        let owner_name = parse_member(&request.owner)?;
        let issuer = self.inner.members.require(&issuer_name)?;
        let owner = self.inner.members.require(&owner_name)?;

        validate_balance_request(self.inner.members.my_info().name(), &owner_name)?;

        let holdings = self.holdings(&issuer, &owner)?;
        let balance = aggregate_balance(
            holdings.iter().map(|h| &h.record),
            self.inner.config.token_scale,
        )?;
        info!(owner = %request.owner, %balance, "querying token has been finished");
        Ok(balance)
    }

    /// [`Self::balance`], reported as a status line.
    pub async fn balance_status(&self, request: &TokenBalanceRequest) -> Result<String, TokenError> {
        let balance = self.balance(request).await?;
        Ok(format!("Token balance of {} is {balance}", request.owner))
    }
}
