use lazy_static::lazy_static;
use regex::Regex;

use crate::core::error::{Result, TenantbaseError};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$")
        .expect("identifier pattern is valid");
}


#[inline]
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}


/// Shortened form of a credential that is safe to log.
pub fn redact(secret: &str) -> String {
    let total = secret.chars().count();
    if total <= 8 {
        return "***".to_string();
    }
    format!("{}***({} chars)", safe_truncate(secret, 4), total)
}


/// Checks that `name` is a plain, unquoted Postgres identifier (table or column).
pub fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    match identifier_problem(kind, name) {
        Some(reason) => Err(TenantbaseError::InvalidArgument(reason)),
        None => Ok(()),
    }
}


pub(crate) fn identifier_problem(kind: &str, name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return Some(format!("{kind} must not be empty"));
    }
    if !IDENTIFIER.is_match(name) {
        return Some(format!("{kind} '{name}' is not a valid identifier"));
    }
    None
}


pub fn require_non_empty(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TenantbaseError::InvalidArgument(format!("{kind} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_ascii() {
        assert_eq!(safe_truncate("hello world", 5), "hello");
    }

    #[test]
    fn test_safe_truncate_multibyte() {
        assert_eq!(safe_truncate("Привет мир", 6), "Привет");
    }

    #[test]
    fn test_redact_long_token() {
        assert_eq!(redact("eyJhbGciOiJIUzI1NiJ9"), "eyJh***(20 chars)");
    }

    #[test]
    fn test_redact_short_token() {
        assert_eq!(redact("abc"), "***");
    }

    #[test]
    fn test_validate_identifier_accepts_plain_names() {
        assert!(validate_identifier("table", "livestock").is_ok());
        assert!(validate_identifier("table", "grain_movements").is_ok());
        assert!(validate_identifier("column", "_private2").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_injection() {
        assert!(validate_identifier("table", "").is_err());
        assert!(validate_identifier("table", "   ").is_err());
        assert!(validate_identifier("table", "livestock?select=*").is_err());
        assert!(validate_identifier("table", "a/b").is_err());
        assert!(validate_identifier("table", "1abc").is_err());
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("record id", "42").is_ok());
        let err = require_non_empty("record id", " ").unwrap_err();
        assert!(matches!(err, TenantbaseError::InvalidArgument(_)));
    }
}
