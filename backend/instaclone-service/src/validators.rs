//! Field rules that the `validator` derive cannot express.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, Result};

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 14;
pub const PASSWORD_SPECIALS: &str = "#?!@$%^&*-";

static TELEPHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\(?\+[0-9]{1,3}\)? ?-?[0-9]{1,3} ?-?[0-9]{3,5}?-?[0-9]{4}( ?-?[0-9]{3})? ?(\w{1,10}\s?\d{1,6})?",
    )
    .expect("telephone pattern is valid")
});

/// 8-14 characters with upper, lower, digit and one of `#?!@$%^&*-`.
pub fn validate_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(AppError::Validation(format!(
            "password: must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"
        )));
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if !(has_upper && has_lower && has_digit && has_special) {
        return Err(AppError::Validation(format!(
            "password: must contain an uppercase letter, a lowercase letter, a digit and one of {PASSWORD_SPECIALS}"
        )));
    }

    Ok(())
}

pub fn validate_phone_number(phone: &str) -> Result<()> {
    if TELEPHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "phone_number: not a valid telephone number".to_string(),
        ))
    }
}

pub fn validate_past_date(date: NaiveDate) -> Result<()> {
    if date < Utc::now().date_naive() {
        Ok(())
    } else {
        Err(AppError::Validation(
            "birthdate: date must be in the past".to_string(),
        ))
    }
}

/// Only absolute http(s) URLs are accepted for images.
pub fn validate_http_url(url: &str) -> Result<()> {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(())
    } else {
        Err(AppError::Validation(
            "image_url: URL scheme must be http or https".to_string(),
        ))
    }
}
