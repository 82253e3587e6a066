//! Identity resolution collaborators.

use ledger_core::{LedgerKey, MemberName};

use crate::TokenError;

/// A network member and the ledger keys it controls.
///
/// Always holds at least one key; the first is canonical and is used when
/// creating new records for the member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    name: MemberName,
    ledger_keys: Vec<LedgerKey>,
}

impl MemberInfo {
    pub fn new(name: MemberName, canonical_key: LedgerKey) -> Self {
        Self {
            name,
            ledger_keys: vec![canonical_key],
        }
    }

    /// Adds a non-canonical key the member also holds records under.
    pub fn with_additional_key(mut self, key: LedgerKey) -> Self {
        if !self.ledger_keys.contains(&key) {
            self.ledger_keys.push(key);
        }
        self
    }

    pub fn name(&self) -> &MemberName {
        &self.name
    }

    pub fn canonical_key(&self) -> LedgerKey {
        self.ledger_keys[0]
    }

    pub fn ledger_keys(&self) -> &[LedgerKey] {
        &self.ledger_keys
    }
}

/// Resolves member names to [`MemberInfo`].
pub trait MemberLookup: Send + Sync {
    /// The member this node runs as, with its current set of keys.
    fn my_info(&self) -> MemberInfo;

    /// Looks up a member by name. `None` if unknown.
    fn lookup(&self, name: &MemberName) -> Option<MemberInfo>;

    /// Like [`Self::lookup`], failing with [`TokenError::MemberNotFound`].
    fn require(&self, name: &MemberName) -> Result<MemberInfo, TokenError> {
        self.lookup(name)
            .ok_or_else(|| TokenError::MemberNotFound(name.to_string()))
    }
}

/// Lists the notaries known to the network.
pub trait NotaryLookup: Send + Sync {
    fn notaries(&self) -> Vec<MemberName>;

    /// The single notary on the network.
    ///
    /// # Errors
    ///
    /// [`TokenError::NotaryNotFound`] if there are none, or more than one.
    fn single_notary(&self) -> Result<MemberName, TokenError> {
        let mut notaries = self.notaries();
        match notaries.len() {
            1 => Ok(notaries.remove(0)),
            _ => Err(TokenError::NotaryNotFound),
        }
    }
}
