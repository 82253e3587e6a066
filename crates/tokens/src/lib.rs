//! Fungible token engine: issue, transfer, redeem and balance.
//!
//! The engine computes what a valid token transaction must contain:
//! - **Balance aggregation** over an owner's unspent records
//! - **Coin selection** of a covering subset, with change
//! - **Composition** of inputs, outputs, signatories and counterparties
//! - **Contract verification** of the result, by the initiator and by every
//!   counterparty
//!
//! Everything outside that (membership, vault queries, notarisation) is a
//! trait in [`ledger`]. [`ledger::InMemoryMembership`] and
//! [`ledger::InMemoryLedger`] implement them for a local network.
//!
//! # Usage
//!
//! ```no_run
//! use config::LedgerConfig;
//! use tokens::TokenService;
//! use tokens::ledger::{InMemoryLedger, InMemoryMembership};
//! use tokens::operations::IssueTokenRequest;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), tokens::TokenError> {
//! let membership = InMemoryMembership::new();
//! let alice = membership.register("CN=Alice, O=R3, L=London, C=GB".parse()?)?;
//! membership.register("CN=Bob, O=R3, L=London, C=GB".parse()?)?;
//! membership.register_notary("CN=Notary, O=R3, L=London, C=GB".parse()?)?;
//! let ledger = InMemoryLedger::new(membership.clone());
//!
//! let node = TokenService::new(
//!     LedgerConfig::DEV,
//!     membership.node(alice.name())?,
//!     ledger.clone(),
//!     ledger,
//!     CancellationToken::new(),
//! );
//!
//! let status = node
//!     .issue_status(&IssueTokenRequest {
//!         issuer: "CN=Alice, O=R3, L=London, C=GB".into(),
//!         owner: "CN=Bob, O=R3, L=London, C=GB".into(),
//!         quantity: "100".parse().unwrap(),
//!     })
//!     .await?;
//! println!("{status}");
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod operations;
pub mod token;

#[cfg(test)]
mod test_fixtures;

pub use error::{Role, SelfTransaction, TokenError};

use std::sync::{Arc, PoisonError, RwLock};

use config::LedgerConfig;
use tokio_util::sync::CancellationToken;

use crate::ledger::{Finalizer, MemberLookup, NotaryLookup, UnspentQuery};
use crate::token::{SmallestFirst, TokenSelector};

// ---------------------------------------------------------------------------
// TokenService
// ---------------------------------------------------------------------------

/// Shared state across all flows.
pub(crate) struct TokenServiceInner<M, Q, F> {
    pub config: LedgerConfig,
    pub members: M,
    pub vault: Q,
    pub finalizer: F,
    pub selector: RwLock<Arc<dyn TokenSelector>>,
    pub cancel: CancellationToken,
}

/// One member's token node.
///
/// `Clone`-able (wraps an `Arc`). Flows run as the member returned by
/// `members.my_info()`.
///
/// # Type Parameters
///
/// - `M`: member and notary resolution
/// - `Q`: unspent record queries
/// - `F`: finalisation (signatures, notary, recording)
pub struct TokenService<M, Q, F> {
    pub(crate) inner: Arc<TokenServiceInner<M, Q, F>>,
}

// Manual Clone: M, Q, F need not be Clone.
impl<M, Q, F> Clone for TokenService<M, Q, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, Q, F> std::fmt::Debug for TokenService<M, Q, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<M, Q, F> TokenService<M, Q, F>
where
    M: MemberLookup + NotaryLookup,
    Q: UnspentQuery,
    F: Finalizer,
{
    /// Creates a node. No I/O happens during construction.
    pub fn new(
        config: LedgerConfig,
        members: M,
        vault: Q,
        finalizer: F,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(TokenServiceInner {
                config,
                members,
                vault,
                finalizer,
                selector: RwLock::new(Arc::new(SmallestFirst)),
                cancel,
            }),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.inner.config
    }

    /// Returns a reference to the cancellation token.
    pub fn cancel(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    /// Signals cancellation and lets in-flight flows observe it.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        tokio::task::yield_now().await;
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Returns [`TokenError::Cancelled`] if the cancellation token has fired.
    pub(crate) fn check_cancelled(&self) -> Result<(), TokenError> {
        if self.inner.cancel.is_cancelled() {
            Err(TokenError::Cancelled)
        } else {
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Token selection
    // -----------------------------------------------------------------------

    /// Replace the selection strategy at runtime.
    ///
    /// In-flight flows that already cloned the previous strategy finish
    /// with it.
    pub fn set_token_selector(&self, selector: Arc<dyn TokenSelector>) {
        *self
            .inner
            .selector
            .write()
            .unwrap_or_else(PoisonError::into_inner) = selector;
    }

    /// Current selection strategy (cheap `Arc` clone).
    pub(crate) fn token_selector(&self) -> Arc<dyn TokenSelector> {
        self.inner
            .selector
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
