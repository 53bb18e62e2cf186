//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! The collector writes dataset columns in this order and the predictor builds
//! model input in this order. A model trained on one layout and queried with
//! another produces meaningless predictions without any visible error.
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//! 4. Edit a keyword list → increment FEATURE_VERSION

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector and in dataset files
/// This is the SINGLE SOURCE OF TRUTH for feature layout
pub const FEATURE_LAYOUT: &[&str] = &[
    "url_length",               // 0: character count of the raw URL
    "has_login_form",           // 1: any form action/id mentions "login"
    "has_password_field",       // 2: any <input type="password">
    "external_links_count",     // 3: http links not containing the page host
    "form_count",               // 4: number of <form>
    "image_count",              // 5: number of <img>
    "suspicious_keywords_html", // 6: HTML keyword hits
    "suspicious_keywords_url",  // 7: host + path keyword hits
    "has_https",                // 8: URL starts with https://
    "domain_length",            // 9: netloc length
    "path_length",              // 10: path length
    "query_length",             // 11: query length
    "is_ip_address",            // 12: dotted-quad host
    "subdomain_count",          // 13: dots in host
    "has_many_subdomains",      // 14: subdomain_count >= 3
    "has_hyphen_in_domain",     // 15: '-' in host
    "has_punycode",             // 16: "xn--" in host
    "has_at_symbol",            // 17: '@' anywhere in URL
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 18;

/// Leading dataset columns that are not model features
pub const DATASET_KEY_COLUMNS: &[&str] = &["url", "label"];

// ============================================================================
// KEYWORD LISTS
// ============================================================================

/// Keywords searched in lower-cased host + path
pub const URL_KEYWORDS: &[&str] = &[
    "login", "verify", "update", "secure", "account",
    "password", "confirm", "suspended", "locked", "urgent",
];

/// Keywords searched in lower-cased raw HTML
pub const HTML_KEYWORDS: &[&str] = &[
    "verify", "update", "secure", "account", "password",
    "login", "confirm", "suspended", "locked", "urgent",
];

/// Number of dots in the host at which `has_many_subdomains` flips to 1
pub const MANY_SUBDOMAINS_THRESHOLD: u32 = 3;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
/// Used to detect layout mismatches at runtime
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    // Include version in hash
    hasher.update(&[FEATURE_VERSION]);

    // Hash all feature names in order
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    // Keyword lists are part of the contract too
    for list in [URL_KEYWORDS, HTML_KEYWORDS] {
        hasher.update(&[1]);
        for word in list {
            hasher.update(word.as_bytes());
            hasher.update(&[0]);
        }
    }

    hasher.finalize()
}

/// Get layout hash
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

/// Full dataset header: key columns followed by the feature layout
pub fn dataset_header() -> Vec<&'static str> {
    DATASET_KEY_COLUMNS
        .iter()
        .chain(FEATURE_LAYOUT.iter())
        .copied()
        .collect()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
    pub url_keywords: Vec<String>,
    pub html_keywords: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            url_keywords: URL_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            html_keywords: HTML_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when feature layout doesn't match expected
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Feature layout mismatch: expected v{} (hash: {:08x}), got v{} (hash: {:08x})",
            self.expected_version,
            self.expected_hash,
            self.actual_version,
            self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

/// Error when a column list (model metadata, dataset header) disagrees with the layout
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMismatchError {
    /// Layout columns the other side does not have
    pub missing: Vec<String>,
    /// Columns the layout does not know about
    pub unexpected: Vec<String>,
    /// Same set of names, different order
    pub reordered: bool,
}

impl std::fmt::Display for SchemaMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Feature schema mismatch")?;
        if !self.missing.is_empty() {
            write!(f, "; missing: {}", self.missing.join(", "))?;
        }
        if !self.unexpected.is_empty() {
            write!(f, "; unexpected: {}", self.unexpected.join(", "))?;
        }
        if self.reordered {
            write!(f, "; column order differs from layout v{}", FEATURE_VERSION)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaMismatchError {}

/// Check an ordered column list against FEATURE_LAYOUT.
/// Names, count and order must all match exactly.
pub fn validate_columns<S: AsRef<str>>(columns: &[S]) -> Result<(), SchemaMismatchError> {
    let names: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    if names.as_slice() == FEATURE_LAYOUT {
        return Ok(());
    }

    let missing: Vec<String> = FEATURE_LAYOUT
        .iter()
        .filter(|name| !names.contains(*name))
        .map(|s| s.to_string())
        .collect();
    let unexpected: Vec<String> = names
        .iter()
        .filter(|name| feature_index(name).is_none())
        .map(|s| s.to_string())
        .collect();

    Err(SchemaMismatchError {
        reordered: missing.is_empty() && unexpected.is_empty(),
        missing,
        unexpected,
    })
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_COUNT, 18);
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_layout_hash_consistency() {
        let hash1 = compute_layout_hash();
        let hash2 = compute_layout_hash();
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, 0);
    }

    #[test]
    fn test_validate_layout() {
        assert!(validate_layout(FEATURE_VERSION, layout_hash()).is_ok());
        assert!(validate_layout(FEATURE_VERSION + 1, layout_hash()).is_err());
        assert!(validate_layout(FEATURE_VERSION, layout_hash() ^ 1).is_err());
    }

    #[test]
    fn test_keyword_lists_are_same_set() {
        let mut url: Vec<_> = URL_KEYWORDS.to_vec();
        let mut html: Vec<_> = HTML_KEYWORDS.to_vec();
        url.sort_unstable();
        html.sort_unstable();
        assert_eq!(url, html);
        assert_eq!(url.len(), 10);
    }

    #[test]
    fn test_dataset_header() {
        let header = dataset_header();
        assert_eq!(header.len(), FEATURE_COUNT + 2);
        assert_eq!(header[0], "url");
        assert_eq!(header[1], "label");
        assert_eq!(header[2], "url_length");
        assert_eq!(header[19], "has_at_symbol");
    }

    #[test]
    fn test_validate_columns_exact() {
        assert!(validate_columns(FEATURE_LAYOUT).is_ok());
    }

    #[test]
    fn test_validate_columns_reordered() {
        let mut cols: Vec<&str> = FEATURE_LAYOUT.to_vec();
        cols.swap(0, 1);
        let err = validate_columns(&cols).unwrap_err();
        assert!(err.reordered);
        assert!(err.missing.is_empty());
    }

    #[test]
    fn test_validate_columns_missing_and_unexpected() {
        let mut cols: Vec<&str> = FEATURE_LAYOUT[..FEATURE_COUNT - 1].to_vec();
        cols.push("page_rank");
        let err = validate_columns(&cols).unwrap_err();
        assert_eq!(err.missing, vec!["has_at_symbol".to_string()]);
        assert_eq!(err.unexpected, vec!["page_rank".to_string()]);
        assert!(!err.reordered);
        assert!(err.to_string().contains("has_at_symbol"));
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("url_length"), Some(0));
        assert_eq!(feature_index("has_at_symbol"), Some(17));
        assert_eq!(feature_index("nonexistent"), None);
    }

    #[test]
    fn test_layout_info() {
        let info = LayoutInfo::current();
        assert_eq!(info.version, FEATURE_VERSION);
        assert_eq!(info.hash, layout_hash());
        assert_eq!(info.feature_names.len(), FEATURE_COUNT);
    }
}
