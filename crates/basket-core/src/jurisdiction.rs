//! # Jurisdiction
//!
//! A jurisdiction fixes the tax policy and the currency a basket operates
//! under. It is chosen once, when the basket is created, and never mutated
//! afterwards; every reconciliation reads the same rate and currency.
//!
//! Presets cover the shipped markets; anything else can be built with
//! [`Jurisdiction::new`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Currency;
use crate::types::TaxRate;

// =============================================================================
// Jurisdiction
// =============================================================================

/// Tax-and-currency policy for one basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jurisdiction {
    /// Short configuration code ("de", "uk", ...).
    code: String,

    /// Human-readable name.
    name: String,

    /// Flat tax rate applied to taxable lines.
    rate: TaxRate,

    /// Currency every amount in the basket is denominated in.
    currency: Currency,
}

impl Jurisdiction {
    /// Builds a custom jurisdiction.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        rate: TaxRate,
        currency: Currency,
    ) -> Self {
        Jurisdiction {
            code: code.into(),
            name: name.into(),
            rate,
            currency,
        }
    }

    /// Germany: 19% VAT, EUR. The configured default.
    pub fn germany() -> Self {
        Jurisdiction::new("de", "Germany", TaxRate::from_bps(1900), Currency::Eur)
    }

    /// United Kingdom: 20% VAT, GBP.
    pub fn united_kingdom() -> Self {
        Jurisdiction::new(
            "uk",
            "United Kingdom",
            TaxRate::from_bps(2000),
            Currency::Gbp,
        )
    }

    /// United States: no federal sales tax, USD.
    pub fn united_states() -> Self {
        Jurisdiction::new("us", "United States", TaxRate::zero(), Currency::Usd)
    }

    /// A 0% jurisdiction in the given currency, for tax-free baskets.
    pub fn zero_rated(currency: Currency) -> Self {
        Jurisdiction::new("zero", "Zero rated", TaxRate::zero(), currency)
    }

    /// Returns the configuration code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the flat tax rate.
    pub fn rate(&self) -> TaxRate {
        self.rate
    }

    /// Returns the basket currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }
}

impl Default for Jurisdiction {
    fn default() -> Self {
        Jurisdiction::germany()
    }
}

/// Parses a preset code from configuration.
impl FromStr for Jurisdiction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "de" | "germany" => Ok(Jurisdiction::germany()),
            "uk" | "gb" | "united_kingdom" => Ok(Jurisdiction::united_kingdom()),
            "us" | "united_states" => Ok(Jurisdiction::united_states()),
            "zero" | "zero_rated" => Ok(Jurisdiction::zero_rated(Currency::Eur)),
            other => Err(CoreError::UnknownJurisdiction(other.to_string())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
