//! Shared builders for unit tests.

use ledger_core::{LedgerKey, MemberName, Quantity};
use rust_decimal::Decimal;

use crate::token::{StateRef, TokenRecord, TxId, UnspentTokenRef};

pub(crate) fn key(last: u8) -> LedgerKey {
    let mut bytes = [0u8; 33];
    bytes[0] = 0x02;
    bytes[32] = last;
    LedgerKey::from_bytes(bytes)
}

pub(crate) fn name(common_name: &str) -> MemberName {
    format!("CN={common_name}, OU=Test Dept, O=R3, L=London, C=GB")
        .parse()
        .unwrap()
}

pub(crate) fn alice() -> MemberName {
    name("Alice")
}

pub(crate) fn bob() -> MemberName {
    name("Bob")
}

pub(crate) fn charlie() -> MemberName {
    name("Charlie")
}

pub(crate) fn notary() -> MemberName {
    name("NotaryService")
}

/// Quantity at the token scale.
pub(crate) fn q(value: Decimal) -> Quantity {
    Quantity::new(value, 2).unwrap()
}

/// Quantity at the token scale from a count of cents.
pub(crate) fn cents(units: i64) -> Quantity {
    Quantity::from_minor_units(units, 2).unwrap()
}

/// Record issued by Alice with the given issuer/owner key bytes.
pub(crate) fn record(issuer: u8, owner: u8, amount: Decimal) -> TokenRecord {
    TokenRecord {
        issuer_name: alice(),
        issuer: key(issuer),
        owner: key(owner),
        quantity: q(amount),
    }
}

pub(crate) fn unspent(index: u32, issuer: u8, owner: u8, amount: Decimal) -> UnspentTokenRef {
    UnspentTokenRef {
        record: record(issuer, owner, amount),
        state_ref: StateRef {
            tx_id: TxId([0xEE; 32]),
            index,
        },
        notary: notary(),
    }
}
