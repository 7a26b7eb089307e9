//! Amounts of money as the registry writes them, with legacy currency conversion.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::text::collapse_whitespace;

/// Legacy currency units per euro, fixed at the 2009 changeover.
pub const LEGACY_CURRENCY_RATE: f64 = 30.1260;
pub const MODERN_CURRENCY: &str = "EUR";

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d[\d ]*(?:[.,]\d+)?)\s*((?i:EUR|SKK|Sk)|€)(?:[^\p{L}]|$)").unwrap()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonetaryAmount {
    pub amount: f64,
    pub currency: String,
    /// The amount as written, kept when it was converted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

/// Find the first "<number> <currency>" in `text`.
///
/// Returns `None` when no number is followed by a known currency code.
pub fn parse_amount(text: &str) -> Option<MonetaryAmount> {
    let caps = AMOUNT_RE.captures(text)?;
    let digits: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
    let value: f64 = digits.replace(',', ".").parse().ok()?;

    if is_legacy(&caps[2]) {
        let original = collapse_whitespace(&format!("{} {}", caps[1].trim(), &caps[2]));
        Some(MonetaryAmount {
            amount: round2(value / LEGACY_CURRENCY_RATE),
            currency: MODERN_CURRENCY.to_string(),
            original: Some(original),
        })
    } else {
        Some(MonetaryAmount {
            amount: value,
            currency: MODERN_CURRENCY.to_string(),
            original: None,
        })
    }
}

/// Parsed amount as JSON, or the text itself when it cannot be split.
pub fn amount_or_raw(text: &str) -> Value {
    match parse_amount(text) {
        Some(amount) => serde_json::to_value(amount).unwrap_or(Value::Null),
        None => {
            warn!(text, "no amount found, keeping raw text");
            Value::String(collapse_whitespace(text))
        }
    }
}

fn is_legacy(code: &str) -> bool {
    code.eq_ignore_ascii_case("sk") || code.eq_ignore_ascii_case("skk")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
