//! In-memory network membership.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use bitcoin::hashes::{Hash, sha256};
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use ledger_core::{LedgerKey, MemberName};
use tracing::debug;

use super::identity::{MemberInfo, MemberLookup, NotaryLookup};
use crate::TokenError;

#[derive(Default)]
struct Registry {
    members: HashMap<MemberName, MemberInfo>,
    notaries: Vec<MemberName>,
}

// ---------------------------------------------------------------------------
// InMemoryMembership
// ---------------------------------------------------------------------------

/// Shared member and notary registry for a local network.
///
/// Cheap to clone; clones share state. Ledger keys are derived
/// deterministically from the member name, so a restarted demo network
/// reproduces the same keys.
#[derive(Clone, Default)]
pub struct InMemoryMembership {
    registry: Arc<RwLock<Registry>>,
}

impl InMemoryMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a party and derives its canonical ledger key.
    ///
    /// # Errors
    ///
    /// - [`TokenError::DuplicateEntry`] if the name is already registered.
    /// - [`TokenError::KeyDerivationFailed`] if no valid key can be derived.
    pub fn register(&self, name: MemberName) -> Result<MemberInfo, TokenError> {
        let key = derive_key(&name)?;
        let info = MemberInfo::new(name.clone(), key);

        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if registry.members.contains_key(&name) {
            return Err(TokenError::DuplicateEntry);
        }
        registry.members.insert(name, info.clone());
        debug!(member = %info.name(), key = %key, "registered member");
        Ok(info)
    }

    /// Registers a notary.
    ///
    /// # Errors
    ///
    /// [`TokenError::DuplicateEntry`] if the notary is already registered.
    pub fn register_notary(&self, name: MemberName) -> Result<(), TokenError> {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if registry.notaries.contains(&name) {
            return Err(TokenError::DuplicateEntry);
        }
        debug!(notary = %name, "registered notary");
        registry.notaries.push(name);
        Ok(())
    }

    /// Gives a registered member an extra, non-canonical key.
    ///
    /// # Errors
    ///
    /// [`TokenError::MemberNotFound`] if the member is not registered.
    pub fn add_key(&self, name: &MemberName, key: LedgerKey) -> Result<MemberInfo, TokenError> {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let info = registry
            .members
            .remove(name)
            .ok_or_else(|| TokenError::MemberNotFound(name.to_string()))?
            .with_additional_key(key);
        registry.members.insert(name.clone(), info.clone());
        Ok(info)
    }

    /// Identity view for a node running as `name`.
    ///
    /// # Errors
    ///
    /// [`TokenError::MemberNotFound`] if `name` is not registered.
    pub fn node(&self, name: &MemberName) -> Result<NodeIdentity, TokenError> {
        let me = self.require(name)?;
        Ok(NodeIdentity {
            me,
            membership: self.clone(),
        })
    }

    /// Looks up a member by name.
    pub fn lookup(&self, name: &MemberName) -> Option<MemberInfo> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .members
            .get(name)
            .cloned()
    }

    fn require(&self, name: &MemberName) -> Result<MemberInfo, TokenError> {
        self.lookup(name)
            .ok_or_else(|| TokenError::MemberNotFound(name.to_string()))
    }
}

impl NotaryLookup for InMemoryMembership {
    fn notaries(&self) -> Vec<MemberName> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .notaries
            .clone()
    }
}

impl std::fmt::Debug for InMemoryMembership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("InMemoryMembership")
            .field("members", &registry.members.len())
            .field("notaries", &registry.notaries.len())
            .finish()
    }
}

/// Secret key = SHA-256 of the canonical name.
fn derive_key(name: &MemberName) -> Result<LedgerKey, TokenError> {
    let digest = sha256::Hash::hash(name.to_string().as_bytes());
    let secret = SecretKey::from_slice(digest.as_byte_array())
        .map_err(|_| TokenError::KeyDerivationFailed)?;
    let public = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret);
    Ok(LedgerKey::from_bytes(public.serialize()))
}

// ---------------------------------------------------------------------------
// NodeIdentity
// ---------------------------------------------------------------------------

/// One member's view of the shared registry.
///
/// [`MemberLookup::my_info`] reads the registry on every call, so keys added
/// with [`InMemoryMembership::add_key`] after the node was created are seen.
#[derive(Debug, Clone)]
pub struct NodeIdentity {
    /// Registration-time entry. Members are never removed, so this is only
    /// served if the registry has been replaced under the node.
    me: MemberInfo,
    membership: InMemoryMembership,
}

impl MemberLookup for NodeIdentity {
    fn my_info(&self) -> MemberInfo {
        self.membership
            .lookup(self.me.name())
            .unwrap_or_else(|| self.me.clone())
    }

    fn lookup(&self, name: &MemberName) -> Option<MemberInfo> {
        self.membership.lookup(name)
    }
}

impl NotaryLookup for NodeIdentity {
    fn notaries(&self) -> Vec<MemberName> {
        self.membership.notaries()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{alice, bob, key, notary};

    #[test]
    fn keys_are_deterministic_and_distinct() {
        let a = InMemoryMembership::new();
        let b = InMemoryMembership::new();
        let alice_a = a.register(alice()).unwrap();
        let alice_b = b.register(alice()).unwrap();
        let bob_a = a.register(bob()).unwrap();

        assert_eq!(alice_a.canonical_key(), alice_b.canonical_key());
        assert_ne!(alice_a.canonical_key(), bob_a.canonical_key());
        assert!(matches!(alice_a.canonical_key().as_bytes()[0], 0x02 | 0x03));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let membership = InMemoryMembership::new();
        membership.register(alice()).unwrap();
        assert_eq!(membership.register(alice()), Err(TokenError::DuplicateEntry));

        membership.register_notary(notary()).unwrap();
        assert_eq!(
            membership.register_notary(notary()),
            Err(TokenError::DuplicateEntry)
        );
    }

    #[test]
    fn node_view_resolves_self_and_others() {
        let membership = InMemoryMembership::new();
        membership.register(alice()).unwrap();
        membership.register(bob()).unwrap();

        let node = membership.node(&alice()).unwrap();
        assert_eq!(node.my_info().name(), &alice());
        assert_eq!(node.require(&bob()).unwrap().name(), &bob());
    }

    #[test]
    fn unknown_member_reports_name() {
        let membership = InMemoryMembership::new();
        let err = membership.node(&alice()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to obtain member information for the specified name: \
             CN=Alice, OU=Test Dept, O=R3, L=London, C=GB."
        );
    }

    #[test]
    fn additional_keys_follow_the_canonical_key() {
        let membership = InMemoryMembership::new();
        let info = membership.register(alice()).unwrap();
        let updated = membership.add_key(&alice(), key(7)).unwrap();

        assert_eq!(updated.canonical_key(), info.canonical_key());
        assert_eq!(updated.ledger_keys(), [info.canonical_key(), key(7)]);
    }

    #[test]
    fn node_sees_keys_added_after_it_was_created() {
        let membership = InMemoryMembership::new();
        let info = membership.register(alice()).unwrap();
        let node = membership.node(&alice()).unwrap();

        membership.add_key(&alice(), key(7)).unwrap();

        let me = node.my_info();
        assert_eq!(me.canonical_key(), info.canonical_key());
        assert_eq!(me.ledger_keys(), [info.canonical_key(), key(7)]);
    }

    #[test]
    fn single_notary_required() {
        let membership = InMemoryMembership::new();
        assert_eq!(membership.single_notary(), Err(TokenError::NotaryNotFound));

        membership.register_notary(notary()).unwrap();
        assert_eq!(membership.single_notary(), Ok(notary()));

        membership
            .register_notary("CN=Second, O=R3, L=London, C=GB".parse().unwrap())
            .unwrap();
        assert_eq!(membership.single_notary(), Err(TokenError::NotaryNotFound));
    }
}
