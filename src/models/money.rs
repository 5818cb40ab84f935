//! Money type for representing currency amounts
//!
//! Internally stores amounts in cents (i64) to avoid floating-point precision
//! issues. The type carries no currency; the owning account's currency code
//! gives amounts their meaning.
//!
//! Arithmetic saturates at the i64 bounds. Code that must notice an overflow
//! uses [`Money::checked_add`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Represents a monetary amount stored as cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use pocket_ledger::models::Money;
    /// let amount = Money::from_cents(1050); // 10.50
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from whole units and cents
    ///
    /// # Examples
    /// ```
    /// use pocket_ledger::models::Money;
    /// let amount = Money::from_units_cents(10, 50); // 10.50
    /// ```
    pub const fn from_units_cents(units: i64, cents: i64) -> Self {
        Self(units * 100 + cents)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Get the whole units portion (truncated toward zero)
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Get the cents portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Check if the amount is zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if the amount is positive
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Check if the amount is negative
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Get the absolute value
    pub const fn abs(&self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Add, returning `None` on overflow
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Parse a money amount from a string
    ///
    /// Accepts "10.50", "-10.50", "$10.50", "10", "1,200.00", "1.200,00",
    /// "1200,5" and accounting negatives like "(12.00)". More than two
    /// decimal places is an error, not a rounding.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        parse_scaled(s, 2).map(Self)
    }

    /// Format with a trailing currency code, e.g. "-12.50 EUR"
    pub fn format_with_currency(&self, currency: &str) -> String {
        if currency.is_empty() {
            self.to_string()
        } else {
            format!("{} {}", self, currency)
        }
    }
}

/// Parse into an integer count of `10^-decimals` units
fn parse_scaled(input: &str, decimals: u32) -> Result<i64, MoneyParseError> {
    let s = input.trim();
    let invalid = || MoneyParseError::InvalidFormat(input.trim().to_string());
    let out_of_range = || MoneyParseError::OutOfRange(input.trim().to_string());

    // Leading "-" or an accounting "(...)" wrapper
    let (negative, s) = if let Some(stripped) = s.strip_prefix('-') {
        (true, stripped)
    } else if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        (true, inner.trim())
    } else {
        (false, s)
    };

    let s = s.trim_start_matches(['$', '€', '£']).trim();
    let normalized = normalize_separators(s);

    let (whole, fraction) = match normalized.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (normalized.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    if fraction.len() > decimals as usize {
        return Err(MoneyParseError::TooManyDecimals {
            input: input.trim().to_string(),
            max: decimals,
        });
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| out_of_range())?
    };
    let fraction: i64 = format!("{:0<width$}", fraction, width = decimals as usize)
        .parse()
        .map_err(|_| invalid())?;

    let value = whole
        .checked_mul(10_i64.pow(decimals))
        .and_then(|v| v.checked_add(fraction))
        .ok_or_else(out_of_range)?;

    Ok(if negative { -value } else { value })
}

/// Reduce thousands separators and decimal commas to a plain "1234.56" form.
fn normalize_separators(s: &str) -> String {
    let s: String = s.chars().filter(|c| !c.is_whitespace() && *c != '\'').collect();
    match (s.rfind('.'), s.rfind(',')) {
        // "1.200,50": comma is the decimal separator
        (Some(dot), Some(comma)) if comma > dot => s.replace('.', "").replace(',', "."),
        // "1,200.50": comma groups thousands
        (Some(_), Some(_)) => s.replace(',', ""),
        // "1200,50" or "1,200": two digits after a single comma reads as decimals
        (None, Some(comma)) => {
            let decimals = s.len() - comma - 1;
            if s.matches(',').count() == 1 && decimals != 3 {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        _ => s,
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A parsed amount held in millionths of a currency unit
///
/// Duplicate checks compare candidates at this precision, so a row that is a
/// fraction of a cent away from a stored amount is measured as such instead
/// of being rounded onto it first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreciseAmount(i64);

impl PreciseAmount {
    /// Decimal places kept by [`PreciseAmount::parse`]
    pub const DECIMALS: u32 = 6;

    const MICROS_PER_CENT: i64 = 10_000;

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn micros(&self) -> i64 {
        self.0
    }

    /// Parse with the same rules as [`Money::parse`], up to six decimal places
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        parse_scaled(s, Self::DECIMALS).map(Self)
    }

    /// True when the two amounts differ by strictly less than `tolerance`
    pub fn within(&self, other: PreciseAmount, tolerance: PreciseAmount) -> bool {
        self.0.abs_diff(other.0) < tolerance.0.unsigned_abs()
    }
}

impl From<Money> for PreciseAmount {
    fn from(money: Money) -> Self {
        Self(money.cents().saturating_mul(Self::MICROS_PER_CENT))
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
    OutOfRange(String),
    TooManyDecimals { input: String, max: u32 },
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
            MoneyParseError::OutOfRange(s) => write!(f, "Amount out of range: {}", s),
            MoneyParseError::TooManyDecimals { input, max } => {
                write!(f, "More than {} decimal places: {}", max, input)
            }
        }
    }
}

impl std::error::Error for MoneyParseError {}
