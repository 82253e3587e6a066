//! Token records and references.

use std::fmt;

use ledger_core::{LedgerKey, MemberName, Quantity};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Transaction identifier: SHA-256 of the transaction's canonical content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(pub [u8; 32]);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Reference to one output of a finalised transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateRef {
    /// Transaction that created the output.
    pub tx_id: TxId,

    /// Output index in the creating transaction.
    pub index: u32,
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

/// One unspent fungible holding.
///
/// Immutable: records are created by an issue or as transfer/redeem outputs
/// and consumed whole when selected as inputs. They are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenRecord {
    /// Name of the member that minted the token.
    pub issuer_name: MemberName,

    /// Issuer's ledger key.
    pub issuer: LedgerKey,

    /// Current owner's ledger key.
    pub owner: LedgerKey,

    /// Amount held, at the ledger's token scale.
    pub quantity: Quantity,
}

/// A [`TokenRecord`] as returned by a vault query: the record, the
/// reference needed to consume it, and the notary it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnspentTokenRef {
    /// The unspent record.
    pub record: TokenRecord,

    /// Reference used to consume the record as an input.
    pub state_ref: StateRef,

    /// Notary that must notarise any transaction consuming this record.
    pub notary: MemberName,
}

impl UnspentTokenRef {
    /// Shortcut for `self.record.quantity`.
    pub fn quantity(&self) -> Quantity {
        self.record.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_id_displays_as_lowercase_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xAB;
        bytes[31] = 0x01;
        let printed = TxId(bytes).to_string();
        assert_eq!(printed.len(), 64);
        assert!(printed.starts_with("ab00"));
        assert!(printed.ends_with("01"));
    }

    #[test]
    fn state_ref_display_includes_index() {
        let state_ref = StateRef {
            tx_id: TxId([0; 32]),
            index: 3,
        };
        assert!(state_ref.to_string().ends_with(":3"));
    }
}
