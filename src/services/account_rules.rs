//! Field rules shared by signup, login and password reset.
//!
//! Each check returns the first failing rule's message so it can go straight
//! into a 400 response.

use regex::Regex;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const USERNAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=30;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
            .expect("Invalid email regex")
    })
}

/// Trims and lower-cases an email, then checks its shape.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim().to_lowercase();
    if email.len() > 254 || !email_regex().is_match(&email) {
        return Err("Please provide a valid email".to_string());
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a number".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter".to_string());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if !USERNAME_LENGTH.contains(&username.chars().count()) {
        return Err(format!(
            "Username must be between {} and {} characters",
            USERNAME_LENGTH.start(),
            USERNAME_LENGTH.end()
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Neo@Matrix.IO ").unwrap(),
            "neo@matrix.io"
        );
        assert!(normalize_email("user.name+tag@sub.example.com").is_ok());
        assert!(normalize_email("").is_err());
        assert!(normalize_email("no-at-sign.com").is_err());
        assert!(normalize_email("user@localhost").is_err());
        assert!(normalize_email("two@@example.com").is_err());
    }

    #[test]
    fn test_password_rules_report_first_failure() {
        assert_eq!(
            validate_password("Ab1").unwrap_err(),
            "Password must be at least 8 characters"
        );
        assert_eq!(
            validate_password("Abcdefgh").unwrap_err(),
            "Password must contain a number"
        );
        assert_eq!(
            validate_password("abcdefg1").unwrap_err(),
            "Password must contain an uppercase letter"
        );
        assert!(validate_password("Abcdefg1").is_ok());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("neo").is_ok());
        assert!(validate_username("the_one_42").is_ok());
        assert!(validate_username(&"a".repeat(30)).is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert_eq!(
            validate_username("neo anderson").unwrap_err(),
            "Username can only contain letters, numbers, and underscores"
        );
    }
}
