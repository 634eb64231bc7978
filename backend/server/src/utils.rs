use std::sync::LazyLock;

use axum::http::{HeaderMap, header::USER_AGENT};
use regex::Regex;

/// Counted in characters, not bytes.
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const UNKNOWN: &str = "unknown";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub fn is_valid_email(email: &str) -> bool {
    email.chars().count() <= MAX_EMAIL_LENGTH && EMAIL_RE.is_match(email)
}

/// Trimmed and lowercased form used for storage and duplicate checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Client address for rate limiting and logging: first `x-forwarded-for` hop, then
/// `x-real-ip`, then `"unknown"`.
pub fn source_key(headers: &HeaderMap) -> String {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| header_str(headers, "x-real-ip").map(str::trim))
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    header_str(headers, USER_AGENT.as_str()).map(str::to_string)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use super::{MAX_EMAIL_LENGTH, is_valid_email, normalize_email, source_key};

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.domain.io"));
    }

    #[test]
    fn test_invalid_emails() {
        for email in [
            "",
            "plain",
            "@example.com",
            "user@",
            "user@domain",
            "user @example.com",
            "user@exa mple.com",
            "a@b@c.com",
        ] {
            assert!(!is_valid_email(email), "{email:?} should be rejected");
        }
    }

    #[test]
    fn test_length_limit() {
        let local = "a".repeat(250);
        assert!(!is_valid_email(&format!("{local}@b.co")));
        assert!(is_valid_email(&format!("{}@b.co", "a".repeat(249))));

        // 254 characters but 503 bytes
        let accented = format!("{}@b.co", "é".repeat(249));
        assert!(accented.len() > MAX_EMAIL_LENGTH);
        assert!(is_valid_email(&accented));
        assert!(!is_valid_email(&format!("{}@b.co", "é".repeat(250))));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_email("  USER@Example.com "), "user@example.com");
    }

    #[test]
    fn test_source_key_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(source_key(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(source_key(&headers), "10.0.0.2");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(source_key(&headers), "203.0.113.7");
    }
}
