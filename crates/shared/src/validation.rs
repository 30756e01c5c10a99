//! Syntactic validation of play payloads.
//!
//! These checks run before any business logic; a failure is a payload
//! syntax error (HTTP 422), never a business-rule violation.

use chrono::NaiveDate;
use regex::Regex;
use validator::ValidationError;

lazy_static::lazy_static! {
    /// Public link hash: five ASCII letters.
    pub static ref UHASH_REGEX: Regex = Regex::new(r"^[A-Za-z]{5}$").unwrap();

    /// Short numeric match code.
    pub static ref MATCH_CODE_REGEX: Regex = Regex::new(r"^[0-9]{4}$").unwrap();

    /// Restricted match password.
    pub static ref PASSWORD_REGEX: Regex = Regex::new(r"^[0-9]{5}$").unwrap();

    /// Attempt identifier echoed back by clients.
    pub static ref ATTEMPT_UID_REGEX: Regex = Regex::new(r"^[0-9a-f]{32}$").unwrap();

    static ref TOKEN_REGEX: Regex = Regex::new(r"^[0-9]{8}$").unwrap();
}

/// Validates a signing token: a calendar date written as `ddmmyyyy`.
pub fn validate_token(token: &str) -> Result<(), ValidationError> {
    if TOKEN_REGEX.is_match(token) && NaiveDate::parse_from_str(token, "%d%m%Y").is_ok() {
        Ok(())
    } else {
        let mut err = ValidationError::new("token_format");
        err.message = Some("Token must be a date formatted as ddmmyyyy".into());
        Err(err)
    }
}
