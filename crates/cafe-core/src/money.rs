//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, and
//! `CurrencyFormat` for turning them into display strings.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    A 25,000 ₫ latte is Money(25000)                                     │
//! │    A $4.50 latte is Money(450) with a 2-decimal CurrencyFormat          │
//! │    Every sum, discount and surcharge is exact integer math              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cafe_core::money::Money;
//!
//! let latte = Money::from_minor(25_000);
//! let two_lattes = latte * 2i32;
//! assert_eq!(two_lattes.minor(), 50_000);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percentage;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative intermediate values (profit can be negative)
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Currency agnostic**: The store's `CurrencyFormat` decides how many of
///   these units make one major unit
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► OrderLine.unit_price ──► line total ──► subtotal    │
/// │                                                                         │
/// │  subtotal ──► surcharge / discount ──► grand total ──► report revenue  │
/// │                                                                         │
/// │  Ingredient.unit_cost ──► COGS       StaffMember.hourly_rate ──► payroll│
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::Money;
    ///
    /// let price = Money::from_minor(40_000);
    /// assert_eq!(price.minor(), 40_000);
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

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(25_000);
    /// assert_eq!(unit_price.multiply_quantity(2).minor(), 50_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `rate` of this amount, rounded half up to the nearest minor unit.
    ///
    /// ## Implementation
    /// Integer math in basis points: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::Money;
    /// use cafe_core::types::Percentage;
    ///
    /// let subtotal = Money::from_minor(90_000);
    /// let ten_percent = subtotal.percentage_of(Percentage::from_bps(1000));
    /// assert_eq!(ten_percent.minor(), 9_000);
    /// ```
    pub fn percentage_of(&self, rate: Percentage) -> Money {
        // i128 keeps large subtotals from overflowing during the multiply
        let part = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_minor(part.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Multiplies by a fractional quantity, rounding half away from zero.
    ///
    /// Used for ingredient costing: 18.5 g of beans at 600 per gram.
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let per_gram = Money::from_minor(600);
    /// let cost = per_gram.multiply_decimal(Decimal::new(185, 1)); // 18.5
    /// assert_eq!(cost.minor(), 11_100);
    /// ```
    pub fn multiply_decimal(&self, qty: Decimal) -> Money {
        let exact = Decimal::from(self.0) * qty;
        let rounded = exact.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Money::from_minor(rounded.to_i64().unwrap_or(if exact.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        }))
    }

    /// Restricts the value to `[min, max]`.
    #[inline]
    pub fn clamp_between(self, min: Money, max: Money) -> Money {
        Money(self.0.clamp(min.0, max.0.max(min.0)))
    }

    /// Floors negative values at zero.
    #[inline]
    pub fn floor_at_zero(self) -> Money {
        Money(self.0.max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

// Arithmetic saturates at the i64 bounds rather than panicking or wrapping.

/// Display uses the default store currency format.
///
/// ## Note
/// Handlers that know the configured store currency should call
/// [`CurrencyFormat::format`] directly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&CurrencyFormat::default().format(*self))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0.saturating_mul(qty as i64))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Currency Format
// =============================================================================

/// How the store prints money on bills and dashboards.
///
/// ## Examples
/// ```text
/// decimals=0, symbol "₫" after, '.' thousands  → 90.000 ₫
/// decimals=2, symbol "$" before, ',' thousands → $1,234.50
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyFormat {
    /// Currency symbol, e.g. "₫" or "$".
    pub symbol: String,

    /// Number of minor-unit digits (0 for VND, 2 for USD).
    pub decimals: u8,

    /// Print the symbol after the amount ("90.000 ₫") instead of before.
    pub symbol_after: bool,

    /// Grouping separator for thousands, if any.
    pub thousands_separator: Option<char>,

    /// Separator between major and minor digits.
    pub decimal_separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat {
            symbol: "₫".to_string(),
            decimals: 0,
            symbol_after: true,
            thousands_separator: Some('.'),
            decimal_separator: ',',
        }
    }
}

impl CurrencyFormat {
    /// Formats an amount in minor units.
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::{CurrencyFormat, Money};
    ///
    /// let vnd = CurrencyFormat::default();
    /// assert_eq!(vnd.format(Money::from_minor(81_000)), "81.000 ₫");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let divisor = 10_i64.pow(self.decimals as u32);
        let cents = amount.minor();
        let whole = (cents / divisor).unsigned_abs();
        let frac = (cents % divisor).unsigned_abs();

        let mut number = group_thousands(whole, self.thousands_separator);
        if self.decimals > 0 {
            number.push(self.decimal_separator);
            number.push_str(&format!("{:0width$}", frac, width = self.decimals as usize));
        }

        let sign = if cents < 0 { "-" } else { "" };
        if self.symbol_after {
            format!("{}{} {}", sign, number, self.symbol)
        } else {
            format!("{}{}{}", sign, self.symbol, number)
        }
    }
}

fn group_thousands(value: u64, separator: Option<char>) -> String {
    let digits = value.to_string();
    let Some(sep) = separator else {
        return digits;
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(25_000);
        assert_eq!(money.minor(), 25_000);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        let result: Money = a * 3;
        assert_eq!(result.minor(), 3000);
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_overflowing() {
        let huge = Money::from_minor(i64::MAX / 2);

        assert_eq!(huge.multiply_quantity(3).minor(), i64::MAX);
        assert_eq!((huge * 3i32).minor(), i64::MAX);
        assert_eq!((huge + huge + huge).minor(), i64::MAX);

        let total: Money = [huge, huge, huge].iter().sum();
        assert_eq!(total.minor(), i64::MAX);
        assert_eq!((Money::from_minor(i64::MIN) - huge).minor(), i64::MIN);
    }

    #[test]
    fn test_sum() {
        let lines = [Money::from_minor(50_000), Money::from_minor(40_000)];
        let total: Money = lines.iter().sum();
        assert_eq!(total.minor(), 90_000);
    }

    #[test]
    fn test_percentage_of_rounds_half_up() {
        // 8.25% of 1000 = 82.5 → 83
        let amount = Money::from_minor(1000);
        assert_eq!(amount.percentage_of(Percentage::from_bps(825)).minor(), 83);
        assert_eq!(amount.percentage_of(Percentage::zero()).minor(), 0);
    }

    #[test]
    fn test_multiply_decimal() {
        let per_ml = Money::from_minor(35);
        // 0.5 × 35 = 17.5 → 18
        assert_eq!(per_ml.multiply_decimal(Decimal::new(5, 1)).minor(), 18);
        assert_eq!(per_ml.multiply_decimal(Decimal::ZERO).minor(), 0);
    }

    #[test]
    fn test_clamp_and_floor() {
        let subtotal = Money::from_minor(10_000);
        assert_eq!(
            Money::from_minor(15_000).clamp_between(Money::zero(), subtotal),
            subtotal
        );
        assert_eq!(
            Money::from_minor(-5).clamp_between(Money::zero(), subtotal),
            Money::zero()
        );
        assert_eq!(Money::from_minor(-1).floor_at_zero(), Money::zero());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_minor(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().minor(), 100);
    }

    #[test]
    fn test_format_vnd() {
        let vnd = CurrencyFormat::default();
        assert_eq!(vnd.format(Money::from_minor(0)), "0 ₫");
        assert_eq!(vnd.format(Money::from_minor(900)), "900 ₫");
        assert_eq!(vnd.format(Money::from_minor(90_000)), "90.000 ₫");
        assert_eq!(vnd.format(Money::from_minor(1_234_567)), "1.234.567 ₫");
        assert_eq!(vnd.format(Money::from_minor(-9_000)), "-9.000 ₫");
    }

    #[test]
    fn test_format_two_decimals() {
        let usd = CurrencyFormat {
            symbol: "$".to_string(),
            decimals: 2,
            symbol_after: false,
            thousands_separator: Some(','),
            decimal_separator: '.',
        };
        assert_eq!(usd.format(Money::from_minor(123_450)), "$1,234.50");
        assert_eq!(usd.format(Money::from_minor(1)), "$0.01");
        assert_eq!(usd.format(Money::from_minor(-550)), "-$5.50");
    }

    #[test]
    fn test_display_uses_default_format() {
        assert_eq!(Money::from_minor(81_000).to_string(), "81.000 ₫");
    }
}
