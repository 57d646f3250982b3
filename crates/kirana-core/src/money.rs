//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In many retail systems:                                                │
//! │    ₹10.00 / 3 = ₹3.33 (×3 = ₹9.99)  → Lost ₹0.01!                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    1000 paise / 3 = 333 paise (×3 = 999 paise)                         │
//! │    We KNOW we lost 1 paisa, and handle it explicitly                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kirana_core::money::Money;
//!
//! // Create from paise (preferred)
//! let price = Money::from_paise(109_900); // ₹1,099.00
//!
//! // Arithmetic operations
//! let doubled = price * 2;
//! let total = price + Money::from_paise(50_000);
//!
//! // NEVER do this:
//! // let bad = Money::from_float(1099.0); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (paise for INR).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CatalogItem price table ──► CartLine.unit_price ──► CartLine total     │
/// │                                                                         │
/// │  Cart.subtotal ──► Cart.total ──► PaymentFlow.paid / due ──► Bill      │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// let price = Money::from_paise(1099); // Represents ₹10.99
    /// assert_eq!(price.paise(), 1099);
    /// ```
    ///
    /// ## Why Paise?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// Calculations and wire payloads all use paise.
    /// Only the UI converts to rupees for display.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from major and minor units (rupees and paise).
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// let price = Money::from_rupees(10, 99); // ₹10.99
    /// assert_eq!(price.paise(), 1099);
    ///
    /// let negative = Money::from_rupees(-5, 50); // -₹5.50 (adjustment)
    /// assert_eq!(negative.paise(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_rupees(-5, 50)` = -₹5.50, not -₹4.50
    #[inline]
    pub const fn from_rupees(major: i64, minor: i64) -> Self {
        // Handle sign: if major is negative, minor should subtract
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in paise (smallest currency unit).
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupees) portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (paise) portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// let unit_price = Money::from_paise(29_900); // ₹299.00
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.paise(), 89_700); // ₹897.00
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Item: CAT6 Cable ₹299.00 / roll
    /// Quantity: 3
    ///      │
    ///      ▼
    /// multiply_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Total: ₹897.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the amount still owed after `paid`, floored at zero.
    ///
    /// This is the "due amount" rule used throughout billing:
    /// `due = max(0, total − paid)`. Overpayment never produces a
    /// negative due amount.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// let total = Money::from_paise(100_000); // ₹1,000.00
    /// assert_eq!(total.due_after(Money::from_paise(60_000)).paise(), 40_000);
    /// assert_eq!(total.due_after(Money::from_paise(120_000)).paise(), 0);
    /// ```
    #[inline]
    pub fn due_after(&self, paid: Money) -> Money {
        Money((self.0 - paid.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and log lines. Use frontend formatting for actual
/// UI display to handle localization and digit grouping properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
