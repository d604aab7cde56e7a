//! Shared utility functions for the booking service.

use axum::http::HeaderMap;
use chrono::{NaiveDate, NaiveTime};
use unicode_normalization::UnicodeNormalization;

/// Normalize an email for storage and lookup: NFC, trimmed, lowercased.
///
/// The normalized form is the client dedup key within a studio.
pub fn normalize_email(email: &str) -> String {
    email.trim().nfc().collect::<String>().to_lowercase()
}

/// Minimal shape check: something before and after a single `@`, and a dot in the domain.
pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Format a time as `HH:MM`, the form the booking frontend displays and submits.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Extract the client IP from proxy headers.
///
/// Tries `x-forwarded-for` first (first hop only), then `x-real-ip`.
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

/// Append query parameters to a URL
pub fn append_query_params(base_url: &str, params: &[(&str, &str)]) -> String {
    let query_string: String = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    if base_url.contains('?') {
        format!("{}&{}", base_url, query_string)
    } else {
        format!("{}?{}", base_url, query_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }

    #[test]
    fn normalize_email_composes_unicode() {
        // "e" + combining acute vs precomposed "é"
        assert_eq!(normalize_email("Jose\u{301}@example.com"), normalize_email("José@example.com"));
    }

    #[test]
    fn plausible_email_shapes() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("ab.co"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@b"));
        assert!(!is_plausible_email("a@b@c.co"));
        assert!(!is_plausible_email("a@b.co."));
    }

    #[test]
    fn parse_time_accepts_both_forms() {
        let expected = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        assert_eq!(parse_time("14:30"), Some(expected));
        assert_eq!(parse_time("14:30:00"), Some(expected));
        assert_eq!(parse_time("2:30pm"), None);
        assert_eq!(format_time(expected), "14:30");
    }

    #[test]
    fn client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.0.0.9".parse().unwrap());
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("10.0.0.9"));
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn append_query_params_encodes_and_joins() {
        assert_eq!(
            append_query_params("https://x.test/ok", &[("a", "1 2"), ("b", "c")]),
            "https://x.test/ok?a=1%202&b=c"
        );
        assert_eq!(
            append_query_params("https://x.test/ok?z=0", &[("a", "1")]),
            "https://x.test/ok?z=0&a=1"
        );
    }
}
