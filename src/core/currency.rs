use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{AppError, Result};

/// Settlement currency.
///
/// The system is single-currency; the enum exists so the gateway currency
/// code and minor-unit rule live in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Vietnamese Dong (no decimal places in the major unit)
    #[default]
    VND,
}

impl Currency {
    /// Decimal places accepted for a major-unit amount
    pub fn scale(&self) -> u32 {
        match self {
            Currency::VND => 0,
        }
    }

    /// Multiplier from the major unit to the gateway's minor unit
    pub fn minor_unit_factor(&self) -> i64 {
        match self {
            Currency::VND => 100,
        }
    }

    /// Validates that an amount is positive and has the correct scale
    pub fn validate_amount(&self, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "{} amount must be greater than 0, got {}",
                self, amount
            )));
        }

        if amount.normalize().scale() > self.scale() {
            return Err(AppError::validation(format!(
                "{} amounts must have at most {} decimal places, got {}",
                self,
                self.scale(),
                amount
            )));
        }

        Ok(())
    }

    /// Converts a major-unit amount to the integer minor unit sent to gateways.
    ///
    /// 50000 VND becomes 5000000. Decimal arithmetic keeps this exact.
    pub fn to_minor_units(&self, amount: Decimal) -> Result<i64> {
        self.validate_amount(amount)?;

        amount
            .checked_mul(Decimal::from(self.minor_unit_factor()))
            .and_then(|minor| minor.to_i64())
            .ok_or_else(|| AppError::validation(format!("{} amount {} is out of range", self, amount)))
    }

    /// Converts a gateway minor-unit amount back to the major unit
    pub fn from_minor_units(&self, minor: i64) -> Decimal {
        Decimal::from(minor) / Decimal::from(self.minor_unit_factor())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::VND => write!(f, "VND"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VND" => Ok(Currency::VND),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}
