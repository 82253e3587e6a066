//! Ledger configuration.
//!
//! This crate provides static configuration for the token ledger:
//!
//! - [`LedgerConfig`] -- token scale, vault query page size, and transaction time window
//! - [`StaticMember`] -- a statically configured network member
//! - [`constants`] -- protocol-level parameters
//!
//! All data is compile-time constant. Types are `Copy`.
//!
//! `config` has no dependencies, so it can be used freely as a leaf
//! dependency.

pub mod constants;
pub mod members;

pub use members::{MemberRole, StaticMember};

use std::time::Duration;

use constants::{DEFAULT_QUERY_LIMIT, DEFAULT_TIME_WINDOW_SECS, TOKEN_SCALE};
use members::DEMO_MEMBERS;

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

/// Ledger-wide configuration shared by every flow.
///
/// This is `Copy` -- a few scalars and a pointer to static member data.
#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig {
    /// Fractional digits carried by token quantities.
    pub token_scale: u32,

    /// Page size for unspent-record vault queries.
    pub query_limit: usize,

    /// Validity window applied to every composed transaction.
    pub time_window: Duration,

    /// Statically known network members.
    members: &'static [StaticMember],
}

impl LedgerConfig {
    /// Returns the statically configured members.
    pub const fn members(&self) -> &'static [StaticMember] {
        self.members
    }

    /// Returns the statically configured notaries.
    pub fn notaries(&self) -> impl Iterator<Item = &'static StaticMember> {
        self.members
            .iter()
            .filter(|m| m.role == MemberRole::Notary)
    }

    /// Returns the statically configured (non-notary) parties.
    pub fn parties(&self) -> impl Iterator<Item = &'static StaticMember> {
        self.members.iter().filter(|m| m.role == MemberRole::Party)
    }

    // -----------------------------------------------------------------------
    // Built-in configurations
    // -----------------------------------------------------------------------

    /// Local demo network: three parties and a single notary.
    pub const DEV: Self = Self {
        token_scale: TOKEN_SCALE,
        query_limit: DEFAULT_QUERY_LIMIT,
        time_window: Duration::from_secs(DEFAULT_TIME_WINDOW_SECS),
        members: &DEMO_MEMBERS,
    };
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::DEV
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
