//! Demo network membership table.
//!
//! A fixed set of parties and one notary used by the `token-node` binary
//! to stand up a local in-memory network. All data is compile-time constant.

// ---------------------------------------------------------------------------
// MemberInfo
// ---------------------------------------------------------------------------

/// Role a member plays on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// An ordinary party that can issue, hold, transfer and redeem tokens.
    Party,
    /// The notary that orders spends and rejects double spends.
    Notary,
}

/// A statically configured network member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticMember {
    /// X.500-style distinguished name.
    pub name: &'static str,

    /// Role on the network.
    pub role: MemberRole,
}

// ---------------------------------------------------------------------------
// Member tables (compile-time constants in .rodata)
// ---------------------------------------------------------------------------

pub(crate) const DEMO_MEMBERS: [StaticMember; 4] = [
    StaticMember {
        name: "CN=Alice, OU=Test Dept, O=R3, L=London, C=GB",
        role: MemberRole::Party,
    },
    StaticMember {
        name: "CN=Bob, OU=Test Dept, O=R3, L=London, C=GB",
        role: MemberRole::Party,
    },
    StaticMember {
        name: "CN=Charlie, OU=Test Dept, O=R3, L=London, C=GB",
        role: MemberRole::Party,
    },
    StaticMember {
        name: "CN=NotaryService, OU=Test Dept, O=R3, L=London, C=GB",
        role: MemberRole::Notary,
    },
];
