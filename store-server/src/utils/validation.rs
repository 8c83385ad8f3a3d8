//! Input validation helpers
//!
//! Centralized text length constants and validation functions.

use shared::ApiError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product titles, usernames, receiver names, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, order notes
pub const MAX_NOTE_LEN: usize = 500;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Shipping addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Receiver phone numbers, digits only
pub const MIN_PHONE_DIGITS: usize = 9;
pub const MAX_PHONE_DIGITS: usize = 11;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty (after trimming) and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(ApiError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), ApiError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(ApiError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a receiver phone number: 9-11 ASCII digits after stripping whitespace.
///
/// Returns the normalized (whitespace-free) number.
pub fn validate_phone(value: &str) -> Result<String, ApiError> {
    let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return Err(ApiError::validation("receiver_phone must not be empty"));
    }
    if !digits.chars().all(|c| c.is_ascii_digit())
        || digits.len() < MIN_PHONE_DIGITS
        || digits.len() > MAX_PHONE_DIGITS
    {
        return Err(ApiError::validation(
            "receiver_phone must be 9-11 digits",
        ));
    }
    Ok(digits)
}

/// Validate an email address (cheap structural check, not full RFC parsing).
pub fn validate_email(value: &str) -> Result<(), ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_EMAIL_LEN {
        return Err(ApiError::validation("email is invalid"));
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::validation("email is invalid"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation("email is invalid"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_9_to_11_digits() {
        assert_eq!(validate_phone("0912345678").unwrap(), "0912345678");
        assert_eq!(validate_phone(" 091 234 5678 ").unwrap(), "0912345678");
        assert_eq!(validate_phone("123456789").unwrap(), "123456789");
        assert_eq!(validate_phone("12345678901").unwrap(), "12345678901");
    }

    #[test]
    fn phone_rejects_bad_input() {
        assert!(validate_phone("").is_err());
        assert!(validate_phone("12345678").is_err()); // too short
        assert!(validate_phone("123456789012").is_err()); // too long
        assert!(validate_phone("09123x5678").is_err()); // non-digit
        assert!(validate_phone("+84123456789").is_err()); // plus sign
    }

    #[test]
    fn required_text_rejects_whitespace_only() {
        assert!(validate_required_text("  ", "receiver_name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text("Alice", "receiver_name", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn email_structural_check() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("userexample.com").is_err());
        assert!(validate_email("user@localhost").is_err());
    }
}
