//! Member names.
//!
//! Network members are identified by X.500-style distinguished names:
//!
//! ```text
//! CN=Alice, OU=Test Dept, O=R3, L=London, C=GB
//! ```
//!
//! # Attributes
//!
//! | Attribute | Meaning | Required |
//! |-----------|---------|----------|
//! | `CN` | common name | no |
//! | `OU` | organisation unit | no |
//! | `O` | organisation | yes |
//! | `L` | locality | yes |
//! | `ST` | state or province | no |
//! | `C` | ISO 3166 country code (two upper-case letters) | yes |
//!
//! Parsing is order-insensitive and trims whitespace around keys and values,
//! so `O=R3, C=GB, L=London` and `L=London,O=R3,C=GB` are the same member.
//! [`Display`](fmt::Display) always writes the canonical order above.
//!
//! # Example
//!
//! ```rust
//! use ledger_core::MemberName;
//!
//! let alice: MemberName = "CN=Alice, OU=Test Dept, O=R3, L=London, C=GB".parse().unwrap();
//! assert_eq!(alice.common_name(), Some("Alice"));
//! assert_eq!(alice.organisation(), "R3");
//! ```

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// MemberName
// ---------------------------------------------------------------------------

/// X.500-style distinguished name of a ledger network member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberName {
    common_name: Option<String>,
    organisation_unit: Option<String>,
    organisation: String,
    locality: String,
    state: Option<String>,
    country: String,
}

impl MemberName {
    /// Parses a distinguished name.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The string is empty
    /// - An attribute is not of the form `KEY=VALUE` or has an empty value
    /// - An attribute key is not one of `CN`, `OU`, `O`, `L`, `ST`, `C`
    /// - An attribute appears twice
    /// - `O`, `L` or `C` is missing
    /// - `C` is not two upper-case ASCII letters
    pub fn parse(s: &str) -> Result<Self, MemberNameError> {
        if s.trim().is_empty() {
            return Err(MemberNameError::Empty);
        }

        let mut common_name = None;
        let mut organisation_unit = None;
        let mut organisation = None;
        let mut locality = None;
        let mut state = None;
        let mut country = None;

        for part in s.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| MemberNameError::MalformedAttribute(part.trim().to_owned()))?;
            let key = key.trim();
            let value = value.trim();

            let slot = match key.to_ascii_uppercase().as_str() {
                "CN" => &mut common_name,
                "OU" => &mut organisation_unit,
                "O" => &mut organisation,
                "L" => &mut locality,
                "ST" => &mut state,
                "C" => &mut country,
                _ => return Err(MemberNameError::UnknownAttribute(key.to_owned())),
            };
            let attr = canonical_key(key);
            if value.is_empty() {
                return Err(MemberNameError::EmptyValue(attr));
            }
            if slot.is_some() {
                return Err(MemberNameError::DuplicateAttribute(attr));
            }
            *slot = Some(value.to_owned());
        }

        let organisation = organisation.ok_or(MemberNameError::MissingAttribute("O"))?;
        let locality = locality.ok_or(MemberNameError::MissingAttribute("L"))?;
        let country = country.ok_or(MemberNameError::MissingAttribute("C"))?;

        if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(MemberNameError::InvalidCountry(country));
        }

        Ok(Self {
            common_name,
            organisation_unit,
            organisation,
            locality,
            state,
            country,
        })
    }

    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    pub fn organisation_unit(&self) -> Option<&str> {
        self.organisation_unit.as_deref()
    }

    pub fn organisation(&self) -> &str {
        &self.organisation
    }

    pub fn locality(&self) -> &str {
        &self.locality
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

/// Maps a (case-insensitive) attribute key to its canonical spelling.
///
/// Only called with keys already matched as known attributes.
fn canonical_key(key: &str) -> &'static str {
    match key.to_ascii_uppercase().as_str() {
        "CN" => "CN",
        "OU" => "OU",
        "O" => "O",
        "L" => "L",
        "ST" => "ST",
        _ => "C",
    }
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cn) = &self.common_name {
            write!(f, "CN={cn}, ")?;
        }
        if let Some(ou) = &self.organisation_unit {
            write!(f, "OU={ou}, ")?;
        }
        write!(f, "O={}, L={}, ", self.organisation, self.locality)?;
        if let Some(st) = &self.state {
            write!(f, "ST={st}, ")?;
        }
        write!(f, "C={}", self.country)
    }
}

impl FromStr for MemberName {
    type Err = MemberNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors that can occur when parsing member names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberNameError {
    /// The input was empty or whitespace.
    Empty,

    /// An attribute was not of the form `KEY=VALUE`.
    MalformedAttribute(String),

    /// An attribute key is not supported.
    UnknownAttribute(String),

    /// An attribute has an empty value.
    EmptyValue(&'static str),

    /// An attribute appeared more than once.
    DuplicateAttribute(&'static str),

    /// A mandatory attribute is missing.
    MissingAttribute(&'static str),

    /// The country code is not two upper-case letters.
    InvalidCountry(String),
}

impl fmt::Display for MemberNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "member name is empty"),
            Self::MalformedAttribute(part) => write!(f, "malformed attribute: {part}"),
            Self::UnknownAttribute(key) => write!(f, "unknown attribute: {key}"),
            Self::EmptyValue(key) => write!(f, "attribute {key} has an empty value"),
            Self::DuplicateAttribute(key) => write!(f, "duplicate attribute: {key}"),
            Self::MissingAttribute(key) => write!(f, "missing mandatory attribute: {key}"),
            Self::InvalidCountry(c) => write!(f, "invalid country code: {c}"),
        }
    }
}

impl std::error::Error for MemberNameError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "CN=Alice, OU=Test Dept, O=R3, L=London, C=GB";

    #[test]
    fn parse_full_name() {
        let name = MemberName::parse(ALICE).unwrap();
        assert_eq!(name.common_name(), Some("Alice"));
        assert_eq!(name.organisation_unit(), Some("Test Dept"));
        assert_eq!(name.organisation(), "R3");
        assert_eq!(name.locality(), "London");
        assert_eq!(name.state(), None);
        assert_eq!(name.country(), "GB");
    }

    #[test]
    fn display_roundtrip() {
        let name = MemberName::parse(ALICE).unwrap();
        assert_eq!(name.to_string(), ALICE);
        assert_eq!(MemberName::parse(&name.to_string()).unwrap(), name);
    }

    #[test]
    fn attribute_order_and_spacing_ignored() {
        let a = MemberName::parse(ALICE).unwrap();
        let b = MemberName::parse("C=GB,L=London ,  O=R3,OU=Test Dept,CN=Alice").unwrap();
        assert_eq!(a, b);
        assert_eq!(b.to_string(), ALICE);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let name = MemberName::parse("cn=Bob, o=R3, l=London, c=GB").unwrap();
        assert_eq!(name.to_string(), "CN=Bob, O=R3, L=London, C=GB");
    }

    #[test]
    fn different_common_names_differ() {
        let alice = MemberName::parse(ALICE).unwrap();
        let bob = MemberName::parse("CN=Bob, OU=Test Dept, O=R3, L=London, C=GB").unwrap();
        assert_ne!(alice, bob);
    }

    #[test]
    fn empty_rejected() {
        assert_eq!(MemberName::parse("  "), Err(MemberNameError::Empty));
    }

    #[test]
    fn missing_mandatory_attribute() {
        assert_eq!(
            MemberName::parse("CN=Alice, O=R3, C=GB"),
            Err(MemberNameError::MissingAttribute("L"))
        );
    }

    #[test]
    fn unknown_attribute() {
        assert_eq!(
            MemberName::parse("CN=Alice, O=R3, L=London, C=GB, X=1"),
            Err(MemberNameError::UnknownAttribute("X".to_owned()))
        );
    }

    #[test]
    fn duplicate_attribute() {
        assert_eq!(
            MemberName::parse("O=R3, O=R4, L=London, C=GB"),
            Err(MemberNameError::DuplicateAttribute("O"))
        );
    }

    #[test]
    fn malformed_attribute() {
        assert!(matches!(
            MemberName::parse("Alice, O=R3, L=London, C=GB"),
            Err(MemberNameError::MalformedAttribute(_))
        ));
    }

    #[test]
    fn empty_value() {
        assert_eq!(
            MemberName::parse("CN=, O=R3, L=London, C=GB"),
            Err(MemberNameError::EmptyValue("CN"))
        );
    }

    #[test]
    fn invalid_country() {
        assert_eq!(
            MemberName::parse("O=R3, L=London, C=gb"),
            Err(MemberNameError::InvalidCountry("gb".to_owned()))
        );
        assert_eq!(
            MemberName::parse("O=R3, L=London, C=GBR"),
            Err(MemberNameError::InvalidCountry("GBR".to_owned()))
        );
    }
}
