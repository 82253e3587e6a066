//! Fixed-point token quantities.
//!
//! A [`Quantity`] is a signed decimal whose scale (number of fractional
//! digits) is fixed when it is created. Arithmetic between two quantities
//! requires both to share the same scale; mixing scales is an error, never an
//! implicit conversion. Rounding is never implicit either: constructing a
//! quantity from a value with more fractional digits than the scale allows
//! fails with [`QuantityError::Precision`].
//!
//! # Example
//!
//! ```rust
//! use ledger_core::Quantity;
//! use rust_decimal::Decimal;
//!
//! let a = Quantity::new(Decimal::new(3000, 2), 2).unwrap();
//! let b = Quantity::new(Decimal::from(70), 2).unwrap();
//! let total = a.checked_add(b).unwrap();
//! assert_eq!(total.to_string(), "100.00");
//! ```

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;

/// Largest scale the decimal backend can represent.
const MAX_SCALE: u32 = 28;

// ---------------------------------------------------------------------------
// Quantity
// ---------------------------------------------------------------------------

/// Exact decimal amount with a fixed scale.
///
/// Two quantities are equal only if both their value and scale match.
/// Ordering compares values first and falls back to scale, so it is total;
/// callers that need a meaningful comparison keep a single working scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quantity {
    value: Decimal,
    scale: u32,
}

impl Quantity {
    /// Creates a quantity from `value` at the given `scale`.
    ///
    /// Trailing zeros are added as needed (`100` at scale 2 becomes
    /// `100.00`).
    ///
    /// # Errors
    ///
    /// - [`QuantityError::InvalidScale`] if `scale` exceeds the decimal backend's
    ///   maximum precision.
    /// - [`QuantityError::Precision`] if representing `value` at `scale`
    ///   would drop non-zero fractional digits.
    pub fn new(value: Decimal, scale: u32) -> Result<Self, QuantityError> {
        if scale > MAX_SCALE {
            return Err(QuantityError::InvalidScale(scale));
        }
        let mut value = value;
        if value.scale() > scale {
            let rounded = value.round_dp(scale);
            if rounded != value {
                return Err(QuantityError::Precision { scale });
            }
            value = rounded;
        }
        value.rescale(scale);
        if value.scale() != scale {
            // rescale() silently caps the scale when the mantissa would overflow.
            return Err(QuantityError::Overflow);
        }
        Ok(Self { value, scale })
    }

    /// Creates a quantity from an integer count of minor units.
    ///
    /// `from_minor_units(12345, 2)` is `123.45`.
    pub fn from_minor_units(units: i64, scale: u32) -> Result<Self, QuantityError> {
        if scale > MAX_SCALE {
            return Err(QuantityError::InvalidScale(scale));
        }
        Ok(Self {
            value: Decimal::new(units, scale),
            scale,
        })
    }

    /// The additive identity at `scale`.
    ///
    /// Scales above the backend maximum are clamped to it.
    pub fn zero(scale: u32) -> Self {
        let scale = scale.min(MAX_SCALE);
        Self {
            value: Decimal::new(0, scale),
            scale,
        }
    }

    /// Returns the underlying decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the scale (number of fractional digits).
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Returns `true` if the quantity is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.value.is_zero() && self.value.is_sign_positive()
    }

    /// Adds two quantities of the same scale.
    ///
    /// # Errors
    ///
    /// [`QuantityError::ScaleMismatch`] if the scales differ,
    /// [`QuantityError::Overflow`] if the result is out of range.
    pub fn checked_add(self, other: Self) -> Result<Self, QuantityError> {
        self.require_same_scale(&other)?;
        let value = self
            .value
            .checked_add(other.value)
            .ok_or(QuantityError::Overflow)?;
        Self::new(value, self.scale)
    }

    /// Subtracts `other` from `self`. Both must share the same scale.
    ///
    /// # Errors
    ///
    /// [`QuantityError::ScaleMismatch`] if the scales differ,
    /// [`QuantityError::Overflow`] if the result is out of range.
    pub fn checked_sub(self, other: Self) -> Result<Self, QuantityError> {
        self.require_same_scale(&other)?;
        let value = self
            .value
            .checked_sub(other.value)
            .ok_or(QuantityError::Overflow)?;
        Self::new(value, self.scale)
    }

    /// Sums a sequence of quantities at `scale`.
    ///
    /// Returns zero at `scale` for an empty sequence. Every element must
    /// already be at `scale`.
    pub fn sum<'a, I>(quantities: I, scale: u32) -> Result<Self, QuantityError>
    where
        I: IntoIterator<Item = &'a Quantity>,
    {
        quantities
            .into_iter()
            .try_fold(Self::zero(scale), |acc, q| acc.checked_add(*q))
    }

    fn require_same_scale(&self, other: &Self) -> Result<(), QuantityError> {
        if self.scale == other.scale {
            Ok(())
        } else {
            Err(QuantityError::ScaleMismatch {
                left: self.scale,
                right: other.scale,
            })
        }
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then_with(|| self.scale.cmp(&other.scale))
    }
}

/// Prints exactly `scale` fractional digits (`50.00`, not `50`).
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from quantity construction and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// The two operands have different scales.
    ScaleMismatch { left: u32, right: u32 },

    /// The value has more fractional digits than the scale allows.
    Precision { scale: u32 },

    /// The requested scale is above the supported maximum.
    InvalidScale(u32),

    /// The result does not fit in the decimal backend.
    Overflow,
}

impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScaleMismatch { left, right } => {
                write!(f, "quantity scale mismatch: {left} vs {right}")
            }
            Self::Precision { scale } => {
                write!(f, "value has more than {scale} fractional digits")
            }
            Self::InvalidScale(scale) => write!(f, "unsupported quantity scale: {scale}"),
            Self::Overflow => write!(f, "quantity overflow"),
        }
    }
}

impl std::error::Error for QuantityError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
