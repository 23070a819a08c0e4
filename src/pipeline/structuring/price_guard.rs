// Post-parse check on the extracted price.
// The prompt already forbids invented prices; this catches a model that
// ignores it. A price with no support in the chat goes back to Unknown,
// and so does a zero or negative placeholder.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Field, OrderDetails};

/// Draft after the price check, plus what was changed.
#[derive(Debug, Clone)]
pub struct PriceGuardResult {
    pub details: OrderDetails,
    pub warnings: Vec<String>,
}

static CURRENCY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d\s*(?:tk|taka|bdt|/-)|৳|টাকা|দাম|মূল্য|\b(?:tk|taka|bdt|price|total|bill|cost|dam|payment|pay|paid|rs)\b",
    )
    .expect("valid regex")
});

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid regex"));

/// Map Bengali digits to ASCII so "৫০০" and "500" compare equal.
fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '০'..='৯' => char::from(b'0' + (c as u32 - '০' as u32) as u8),
            other => other,
        })
        .collect()
}

/// Whether the chat uses currency or payment language anywhere.
pub fn has_currency_language(chat_text: &str) -> bool {
    CURRENCY_PATTERN.is_match(&ascii_digits(chat_text))
}

fn numbers_in(text: &str) -> Vec<f64> {
    NUMBER_PATTERN
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .collect()
}

fn contains_amount(text: &str, amount: f64) -> bool {
    numbers_in(text)
        .into_iter()
        .any(|n| (n - amount).abs() < 1e-9)
}

/// Whether `price` occurs in the chat only as part of the phone number or
/// the address.
fn price_only_in_contact(chat_text: &str, details: &OrderDetails, price: f64) -> bool {
    let mut remainder = ascii_digits(chat_text);
    let mut in_contact = false;

    for value in [&details.phone_number, &details.delivery_address]
        .into_iter()
        .filter_map(|f| f.as_known())
    {
        let value = ascii_digits(value);
        if contains_amount(&value, price) || value.contains(&format_plain(price)) {
            in_contact = true;
        }
        if !value.is_empty() {
            remainder = remainder.replace(&value, " ");
        }
    }

    in_contact && !contains_amount(&remainder, price)
}

fn format_plain(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as u64)
    } else {
        price.to_string()
    }
}

/// Downgrade an unsupported price to Unknown.
pub fn guard_price(chat_text: &str, mut details: OrderDetails) -> PriceGuardResult {
    let mut warnings = Vec::new();

    if let Field::Known(price) = details.total_price {
        if price <= 0.0 {
            warnings.push("Price was not a positive amount".to_string());
            details.total_price = Field::Unknown;
        } else if !contains_amount(&ascii_digits(chat_text), price) {
            warnings.push("Price does not appear anywhere in the chat".to_string());
            details.total_price = Field::Unknown;
        } else if !has_currency_language(chat_text) {
            warnings.push("Price returned without any currency language in the chat".to_string());
            details.total_price = Field::Unknown;
        } else if price_only_in_contact(chat_text, &details, price) {
            warnings.push("Price matched digits from the phone number or address".to_string());
            details.total_price = Field::Unknown;
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            warning_count = warnings.len(),
            "Extracted price discarded by plausibility check"
        );
    }

    PriceGuardResult { details, warnings }
}
