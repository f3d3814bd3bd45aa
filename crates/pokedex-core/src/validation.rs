// ── Credential input checks ──
//
// Run before any auth call reaches the remote service.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

pub const EMAIL_MAX_LEN: usize = 255;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 128;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if email.trim().is_empty() {
        return Err(CoreError::validation("email", "Email is required"));
    }
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(CoreError::validation(
            "email",
            format!("Email must be at most {EMAIL_MAX_LEN} characters"),
        ));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(CoreError::validation(
            "email",
            "Please enter a valid email address",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.is_empty() {
        return Err(CoreError::validation("password", "Password is required"));
    }
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(CoreError::validation(
            "password",
            format!("Password must be at least {PASSWORD_MIN_LEN} characters"),
        ));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(CoreError::validation(
            "password",
            format!("Password must be at most {PASSWORD_MAX_LEN} characters"),
        ));
    }
    Ok(())
}

/// Sign-up form: both fields plus the repeated password.
pub fn validate_sign_up(email: &str, password: &str, confirmation: &str) -> Result<(), CoreError> {
    validate_email(email)?;
    validate_password(password)?;
    if password != confirmation {
        return Err(CoreError::validation(
            "password_confirmation",
            "Passwords do not match",
        ));
    }
    Ok(())
}
