//! Vault query collaborator.

use std::time::SystemTime;

use ledger_core::KeyHash;

use crate::TokenError;
use crate::token::UnspentTokenRef;

/// Parameters of an unspent-record query.
///
/// Results are an unordered candidate set. A page holds at most `limit`
/// records; callers tolerate truncation.
#[derive(Debug, Clone)]
pub struct UnspentQueryParams {
    /// Hash of the owner key to match (`SHA-256:<HEX>` when printed).
    pub owner_key_hash: KeyHash,

    /// Type tag of the records to return.
    pub state_type: &'static str,

    /// Page size.
    pub limit: usize,

    /// Records to skip before the page starts.
    pub offset: usize,

    /// Only records finalised at or before this instant are returned.
    pub as_of: SystemTime,
}

/// Source of unspent token records.
pub trait UnspentQuery: Send + Sync {
    /// Returns unspent records matching `params`.
    ///
    /// # Errors
    ///
    /// [`TokenError::QueryFailed`] if the vault cannot be read.
    fn query_unspent(
        &self,
        params: &UnspentQueryParams,
    ) -> Result<Vec<UnspentTokenRef>, TokenError>;
}
