//! URL Features - everything computable without touching the network
//!
//! The split follows the classic `scheme://netloc/path;params?query#fragment`
//! rules rather than WHATWG normalisation, so `https://example.com` has an
//! empty path and a `user@` prefix stays part of the netloc. Trained models
//! learned their feature distributions from exactly these lengths.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::layout::{MANY_SUBDOMAINS_THRESHOLD, URL_KEYWORDS};

/// Schemes whose last path segment may carry `;params`
const SCHEMES_WITH_PARAMS: &[&str] = &[
    "", "ftp", "hdl", "prospero", "http", "imap", "https", "shttp", "rtsp",
    "rtsps", "rtspu", "sip", "sips", "mms", "sftp", "tel",
];

static IPV4_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("static IPv4 pattern"));

// ============================================================================
// URL SPLITTING
// ============================================================================

/// URL could not be split into components
#[derive(Debug, Clone, PartialEq)]
pub struct UrlParseError(pub String);

impl std::fmt::Display for UrlParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid URL: {}", self.0)
    }
}

impl std::error::Error for UrlParseError {}

/// Components of a URL as written (no normalisation beyond scheme lower-casing)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlParts {
    pub scheme: String,
    pub netloc: String,
    pub path: String,
    pub params: String,
    pub query: String,
    pub fragment: String,
}

impl UrlParts {
    pub fn parse(raw: &str) -> Result<Self, UrlParseError> {
        let cleaned: String = raw
            .trim_start_matches(|c: char| c <= ' ')
            .chars()
            .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
            .collect();

        let mut rest = cleaned.as_str();
        let mut parts = UrlParts::default();

        if let Some(colon) = rest.find(':') {
            let candidate = &rest[..colon];
            if is_scheme(candidate) {
                parts.scheme = candidate.to_ascii_lowercase();
                rest = &rest[colon + 1..];
            }
        }

        if let Some(after) = rest.strip_prefix("//") {
            let end = after
                .find(|c: char| matches!(c, '/' | '?' | '#'))
                .unwrap_or(after.len());
            parts.netloc = after[..end].to_string();
            rest = &after[end..];

            let opens = parts.netloc.contains('[');
            let closes = parts.netloc.contains(']');
            if opens != closes {
                return Err(UrlParseError(format!("unbalanced IPv6 brackets in '{}'", parts.netloc)));
            }
        }

        if let Some((before, fragment)) = rest.split_once('#') {
            parts.fragment = fragment.to_string();
            rest = before;
        }
        if let Some((before, query)) = rest.split_once('?') {
            parts.query = query.to_string();
            rest = before;
        }

        if SCHEMES_WITH_PARAMS.contains(&parts.scheme.as_str()) {
            let (path, params) = split_params(rest);
            parts.path = path.to_string();
            parts.params = params.to_string();
        } else {
            parts.path = rest.to_string();
        }

        Ok(parts)
    }

    /// Lower-cased netloc, the "host" every URL feature is computed on
    pub fn host(&self) -> String {
        self.netloc.to_lowercase()
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// `;params` only count when they follow the last path segment
fn split_params(path: &str) -> (&str, &str) {
    let split_at = match path.rfind('/') {
        Some(slash) => path[slash..].find(';').map(|i| slash + i),
        None => path.find(';'),
    };
    match split_at {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => (path, ""),
    }
}

/// Count how many keywords occur at least once in `haystack`
/// (each keyword contributes at most 1, matching is case-sensitive on the
/// already lower-cased haystack)
pub fn count_keywords(haystack: &str, keywords: &[&str]) -> u32 {
    keywords.iter().filter(|word| haystack.contains(*word)).count() as u32
}

fn flag(value: bool) -> u32 {
    u32::from(value)
}

// ============================================================================
// URL FEATURES
// ============================================================================

/// URL-derived half of the feature record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UrlFeatures {
    pub url_length: u32,
    pub has_https: u32,
    pub domain_length: u32,
    pub path_length: u32,
    pub query_length: u32,
    pub is_ip_address: u32,
    pub subdomain_count: u32,
    pub has_many_subdomains: u32,
    pub has_hyphen_in_domain: u32,
    pub has_punycode: u32,
    pub has_at_symbol: u32,
    pub suspicious_keywords_url: u32,
}

impl UrlFeatures {
    /// Fields that need no parsing at all
    pub fn unparsed(url: &str) -> Self {
        Self {
            url_length: url.chars().count() as u32,
            has_https: flag(url.starts_with("https://")),
            ..Default::default()
        }
    }

    /// Compute from an already split URL
    pub fn from_parts(url: &str, parts: &UrlParts) -> Self {
        let host = parts.host();
        let dots = host.matches('.').count() as u32;
        let keyword_text = format!("{}{}", host, parts.path).to_lowercase();

        Self {
            domain_length: host.chars().count() as u32,
            path_length: parts.path.chars().count() as u32,
            query_length: parts.query.chars().count() as u32,
            is_ip_address: flag(IPV4_HOST.is_match(&host)),
            subdomain_count: dots,
            has_many_subdomains: flag(dots >= MANY_SUBDOMAINS_THRESHOLD),
            has_hyphen_in_domain: flag(host.contains('-')),
            has_punycode: flag(host.contains("xn--")),
            has_at_symbol: flag(url.contains('@')),
            suspicious_keywords_url: count_keywords(&keyword_text, URL_KEYWORDS),
            ..Self::unparsed(url)
        }
    }

    /// Parse and compute; a URL that cannot be split only yields the unparsed fields
    pub fn compute(url: &str) -> Self {
        match UrlParts::parse(url) {
            Ok(parts) => Self::from_parts(url, &parts),
            Err(_) => Self::unparsed(url),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        let parts = UrlParts::parse("https://www.google.com").unwrap();
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.netloc, "www.google.com");
        assert_eq!(parts.path, "");
        assert_eq!(parts.query, "");
    }

    #[test]
    fn test_split_full() {
        let parts = UrlParts::parse("HTTP://User@Host.Example:8080/a/b;p=1?x=1&y=2#frag").unwrap();
        assert_eq!(parts.scheme, "http");
        assert_eq!(parts.netloc, "User@Host.Example:8080");
        assert_eq!(parts.host(), "user@host.example:8080");
        assert_eq!(parts.path, "/a/b");
        assert_eq!(parts.params, "p=1");
        assert_eq!(parts.query, "x=1&y=2");
        assert_eq!(parts.fragment, "frag");
    }

    #[test]
    fn test_params_only_after_last_segment() {
        let parts = UrlParts::parse("http://h/a;x/b").unwrap();
        assert_eq!(parts.path, "/a;x/b");
        assert_eq!(parts.params, "");
    }

    #[test]
    fn test_no_scheme() {
        let parts = UrlParts::parse("example.com/login").unwrap();
        assert_eq!(parts.scheme, "");
        assert_eq!(parts.netloc, "");
        assert_eq!(parts.path, "example.com/login");
    }

    #[test]
    fn test_unbalanced_brackets_fail() {
        assert!(UrlParts::parse("http://[::1/path").is_err());
        assert!(UrlParts::parse("http://[::1]/path").is_ok());
    }

    #[test]
    fn test_control_chars_removed() {
        let parts = UrlParts::parse("http://exa\tmple.com/pa\nth").unwrap();
        assert_eq!(parts.netloc, "example.com");
        assert_eq!(parts.path, "/path");
    }

    #[test]
    fn test_count_keywords_presence_only() {
        assert_eq!(count_keywords("loginlogin", URL_KEYWORDS), 1);
        assert_eq!(count_keywords("secure-login/verify", URL_KEYWORDS), 3);
        assert_eq!(count_keywords("", URL_KEYWORDS), 0);
    }

    #[test]
    fn test_phishy_scenario() {
        let url = "http://user@phish-login.example.com/secure/verify?x=1";
        let f = UrlFeatures::compute(url);
        assert_eq!(f.is_ip_address, 0);
        assert_eq!(f.has_at_symbol, 1);
        assert_eq!(f.has_hyphen_in_domain, 1);
        assert_eq!(f.subdomain_count, 2);
        assert_eq!(f.has_many_subdomains, 0);
        assert!(f.suspicious_keywords_url >= 2);
        assert_eq!(f.suspicious_keywords_url, 3);
        assert_eq!(f.query_length, 3);
        assert_eq!(f.path_length, "/secure/verify".len() as u32);
        assert_eq!(f.has_https, 0);
    }

    #[test]
    fn test_many_subdomains_boundary() {
        assert_eq!(UrlFeatures::compute("http://a.b.c.com/").has_many_subdomains, 1);
        assert_eq!(UrlFeatures::compute("http://a.b.com/").has_many_subdomains, 0);
        assert_eq!(UrlFeatures::compute("http://a.b.com/").subdomain_count, 2);
    }

    #[test]
    fn test_ip_and_punycode() {
        let ip = UrlFeatures::compute("http://192.168.0.1/login");
        assert_eq!(ip.is_ip_address, 1);
        assert_eq!(ip.subdomain_count, 3);

        let with_port = UrlFeatures::compute("http://192.168.0.1:8080/");
        assert_eq!(with_port.is_ip_address, 0);

        let puny = UrlFeatures::compute("https://XN--80ak6aa92e.com");
        assert_eq!(puny.has_punycode, 1);
        assert_eq!(puny.has_https, 1);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let f = UrlFeatures::compute("https://ACCOUNT.example.com/Update/LOGIN");
        assert_eq!(f.suspicious_keywords_url, 3);
    }

    #[test]
    fn test_query_not_searched_for_keywords() {
        let f = UrlFeatures::compute("https://example.com/?next=login");
        assert_eq!(f.suspicious_keywords_url, 0);
    }

    #[test]
    fn test_unparsable_keeps_unparsed_fields() {
        let url = "https://[broken@host/login";
        let f = UrlFeatures::compute(url);
        assert_eq!(f.url_length, url.chars().count() as u32);
        assert_eq!(f.has_https, 1);
        assert_eq!(f.has_at_symbol, 0);
        assert_eq!(f.domain_length, 0);
        assert_eq!(f.suspicious_keywords_url, 0);
    }
}
