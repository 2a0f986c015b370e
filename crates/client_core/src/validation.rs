//! Field-level form rules. Each rule returns the message to show next to the
//! field, or `None` when the value passes.

use once_cell::sync::Lazy;
use regex::Regex;

pub const NAME_MIN_LENGTH: usize = 2;
pub const PHONE_MIN_DIGITS: usize = 10;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn required(label: &str, value: &str) -> Option<String> {
    value
        .trim()
        .is_empty()
        .then(|| format!("{label} is required"))
}

pub fn required_name(label: &str, value: &str) -> Option<String> {
    required(label, value).or_else(|| {
        (value.trim().chars().count() < NAME_MIN_LENGTH)
            .then(|| format!("{label} must be at least {NAME_MIN_LENGTH} characters"))
    })
}

pub fn email(value: &str) -> Option<String> {
    required("Email", value).or_else(|| {
        (!EMAIL_SHAPE.is_match(value.trim())).then(|| "Enter a valid email address".to_string())
    })
}

pub fn phone(value: &str) -> Option<String> {
    required("Phone", value).or_else(|| {
        let digits = value.chars().filter(char::is_ascii_digit).count();
        (digits < PHONE_MIN_DIGITS)
            .then(|| format!("Phone number must contain at least {PHONE_MIN_DIGITS} digits"))
    })
}

pub fn optional_website(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let lower = value.to_ascii_lowercase();
    (!(lower.starts_with("http://") || lower.starts_with("https://")))
        .then(|| "Website must start with http:// or https://".to_string())
}

pub fn optional_amount(label: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => None,
        Ok(_) => Some(format!("{label} cannot be negative")),
        Err(_) => Some(format!("{label} must be a number")),
    }
}

pub fn selected_id(label: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return Some(format!("Please select {label}"));
    }
    match value.parse::<i64>() {
        Ok(id) if id > 0 => None,
        _ => Some(format!("Please select a valid {label}")),
    }
}

pub fn optional_id(label: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        selected_id(label, value)
    }
}
