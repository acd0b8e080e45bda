//! # Money Module
//!
//! Provides the `Money` and `Currency` types for handling monetary values
//! safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    A basket line is 500 minor units (€5.00), never 5.0                 │
//! │    Splitting 1000 three ways gives 333; we KNOW a unit was lost        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use basket_core::money::{Currency, Money};
//!
//! // Create from minor units (the only way)
//! let price = Money::from_minor(1099); // €10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;
//! let total = price + Money::from_minor(500);
//!
//! assert_eq!(Currency::Eur.format(total), "€15.99");
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for EUR/USD, pence
/// for GBP).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for discounts and corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Currency lives on the jurisdiction**: every amount inside one basket
///   is denominated in the basket jurisdiction's currency, so the amount
///   itself stays a bare integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::Money;
    ///
    /// let price = Money::from_minor(1099); // €10.99
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (euros, pounds, dollars).
    #[inline]
    pub const fn major_part(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99, sign dropped).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
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

    /// Multiplies money by a line quantity.
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the given fraction of this amount, expressed in basis points.
    ///
    /// 1 basis point = 0.01% = 1/10000. Rounding is half-up via integer
    /// math: `(amount * bps + 5000) / 10000`. i128 intermediates prevent
    /// overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::Money;
    ///
    /// let value = Money::from_minor(10000); // €100.00
    /// assert_eq!(value.percentage_of(1000).minor(), 1000); // 10% = €10.00
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_minor(part as i64)
    }

    /// Calculates tax on this amount at the given rate.
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::Money;
    /// use basket_core::types::TaxRate;
    ///
    /// let value = Money::from_minor(1000);       // €10.00
    /// let rate = TaxRate::from_bps(1900);        // 19% (German VAT)
    /// assert_eq!(value.calculate_tax(rate).minor(), 190);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage_of(rate.bps())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the decimal amount without a currency symbol.
///
/// Use [`Currency::format`] when a symbol is wanted; the bare amount is what
/// goes into logs and error messages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major_part().abs(), self.minor_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Currency
// =============================================================================

/// The currency a basket is denominated in.
///
/// The jurisdiction decides the currency once at basket creation; every
/// amount in the basket and its order snapshots is in this currency's minor
/// units. Serialized as the ISO 4217 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Euro.
    Eur,
    /// Pound sterling.
    Gbp,
    /// United States dollar.
    Usd,
}

impl Currency {
    /// Returns the ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Usd => "USD",
        }
    }

    /// Returns the display symbol.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Usd => "$",
        }
    }

    /// Formats an amount with this currency's symbol.
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::{Currency, Money};
    ///
    /// assert_eq!(Currency::Gbp.format(Money::from_minor(-550)), "-£5.50");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        format!(
            "{}{}{}.{:02}",
            sign,
            self.symbol(),
            amount.major_part().abs(),
            amount.minor_part()
        )
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "USD" => Ok(Currency::Usd),
            other => Err(CoreError::UnknownCurrency(other.to_string())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
