use std::sync::LazyLock;

use regex::Regex;

use super::ValidationError;

#[allow(clippy::unwrap_used)]
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[0-9]{8,15}$").unwrap());

/// Keeps digits and a leading `+`; drops spaces, dashes, dots and brackets.
///
/// ```
/// use verigate::validators::normalize_phone_number;
///
/// assert_eq!(normalize_phone_number("+1 (555) 010-9999"), "+15550109999");
/// ```
pub fn normalize_phone_number(phone: &str) -> String {
    let trimmed = phone.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };

    let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
    format!("{plus}{digits}")
}

/// Validates an already normalised number: optional `+` and 8 to 15 digits.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if phone.is_empty() {
        return Err(ValidationError::PhoneNumberEmpty);
    }
    if !PHONE_REGEX.is_match(phone) {
        return Err(ValidationError::PhoneNumberInvalid);
    }
    Ok(())
}
