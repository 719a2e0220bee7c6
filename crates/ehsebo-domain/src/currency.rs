//! Base/secondary currency conversion and display formatting.
//!
//! Every stored amount is in the base currency. The secondary currency only
//! exists for display and is derived from a single scalar rate, expressed as
//! secondary units per one base unit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rate used when nothing has been configured or fetched yet (1 USD = 100 RUB).
pub const DEFAULT_RATE: f64 = 100.0;

const DECIMAL_PLACES: usize = 2;
const GROUPING_SEPARATOR: char = ',';

/// Currencies understood by the application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Rub,
}

impl Currency {
    /// Currency every persisted amount is denominated in.
    pub const BASE: Currency = Currency::Usd;
    /// Display-only currency reached through the exchange rate.
    pub const SECONDARY: Currency = Currency::Rub;

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Rub => "RUB",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Rub => "₽",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Currency::Usd => "US Dollar",
            Currency::Rub => "Russian Ruble",
        }
    }

    /// Parses an ISO 4217 code, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "RUB" => Some(Currency::Rub),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Converts a base-currency amount into the secondary currency.
pub fn convert_base_to_secondary(amount: f64, rate: f64) -> f64 {
    amount * rate
}

/// Converts a secondary-currency amount back into the base currency using the
/// same rate as [`convert_base_to_secondary`].
pub fn convert_secondary_to_base(amount: f64, rate: f64) -> f64 {
    amount / rate
}

/// Renders `value` with the currency symbol prefix, two decimals and `,`
/// thousands grouping. Negative values keep their sign after the symbol.
pub fn format_amount(value: f64, currency: Currency) -> String {
    format!("{}{}", currency.symbol(), format_number(value))
}

/// Formats a number with two decimals and thousands grouping.
pub fn format_number(value: f64) -> String {
    let body = format!("{:.*}", DECIMAL_PLACES, value);
    let (int_part, fraction) = match body.find('.') {
        Some(pos) => body.split_at(pos),
        None => (body.as_str(), ""),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    // "-0.00" is not a meaningful display value.
    let sign = if digits.chars().all(|c| c == '0') && fraction.chars().skip(1).all(|c| c == '0')
    {
        ""
    } else {
        sign
    };
    format!("{}{}{}", sign, group_digits(digits), fraction)
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, GROUPING_SEPARATOR);
        }
        grouped.insert(0, ch);
    }
    grouped
}
