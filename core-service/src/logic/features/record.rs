//! Feature Record - the unit of both training and inference

use serde::{Deserialize, Serialize};

use super::layout::{FEATURE_COUNT, FEATURE_LAYOUT, SchemaMismatchError};
use super::url::UrlFeatures;
use crate::logic::scanner::HtmlSignals;

/// The 18 numeric features, declared in layout order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    pub url_length: u32,
    pub has_login_form: u32,
    pub has_password_field: u32,
    pub external_links_count: u32,
    pub form_count: u32,
    pub image_count: u32,
    pub suspicious_keywords_html: u32,
    pub suspicious_keywords_url: u32,
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
}

impl FeatureSet {
    pub fn from_parts(url: &UrlFeatures, page: &HtmlSignals) -> Self {
        Self {
            url_length: url.url_length,
            has_login_form: page.has_login_form,
            has_password_field: page.has_password_field,
            external_links_count: page.external_links_count,
            form_count: page.form_count,
            image_count: page.image_count,
            suspicious_keywords_html: page.suspicious_keywords_html,
            suspicious_keywords_url: url.suspicious_keywords_url,
            has_https: url.has_https,
            domain_length: url.domain_length,
            path_length: url.path_length,
            query_length: url.query_length,
            is_ip_address: url.is_ip_address,
            subdomain_count: url.subdomain_count,
            has_many_subdomains: url.has_many_subdomains,
            has_hyphen_in_domain: url.has_hyphen_in_domain,
            has_punycode: url.has_punycode,
            has_at_symbol: url.has_at_symbol,
        }
    }

    /// URL-derived fields only, page fields zeroed
    pub fn url_only(url: &UrlFeatures) -> Self {
        Self::from_parts(url, &HtmlSignals::empty())
    }

    /// Get feature by layout name
    pub fn get(&self, name: &str) -> Option<u32> {
        let value = match name {
            "url_length" => self.url_length,
            "has_login_form" => self.has_login_form,
            "has_password_field" => self.has_password_field,
            "external_links_count" => self.external_links_count,
            "form_count" => self.form_count,
            "image_count" => self.image_count,
            "suspicious_keywords_html" => self.suspicious_keywords_html,
            "suspicious_keywords_url" => self.suspicious_keywords_url,
            "has_https" => self.has_https,
            "domain_length" => self.domain_length,
            "path_length" => self.path_length,
            "query_length" => self.query_length,
            "is_ip_address" => self.is_ip_address,
            "subdomain_count" => self.subdomain_count,
            "has_many_subdomains" => self.has_many_subdomains,
            "has_hyphen_in_domain" => self.has_hyphen_in_domain,
            "has_punycode" => self.has_punycode,
            "has_at_symbol" => self.has_at_symbol,
            _ => return None,
        };
        Some(value)
    }

    /// Set feature by layout name
    pub fn set(&mut self, name: &str, value: u32) -> bool {
        let slot = match name {
            "url_length" => &mut self.url_length,
            "has_login_form" => &mut self.has_login_form,
            "has_password_field" => &mut self.has_password_field,
            "external_links_count" => &mut self.external_links_count,
            "form_count" => &mut self.form_count,
            "image_count" => &mut self.image_count,
            "suspicious_keywords_html" => &mut self.suspicious_keywords_html,
            "suspicious_keywords_url" => &mut self.suspicious_keywords_url,
            "has_https" => &mut self.has_https,
            "domain_length" => &mut self.domain_length,
            "path_length" => &mut self.path_length,
            "query_length" => &mut self.query_length,
            "is_ip_address" => &mut self.is_ip_address,
            "subdomain_count" => &mut self.subdomain_count,
            "has_many_subdomains" => &mut self.has_many_subdomains,
            "has_hyphen_in_domain" => &mut self.has_hyphen_in_domain,
            "has_punycode" => &mut self.has_punycode,
            "has_at_symbol" => &mut self.has_at_symbol,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Values in FEATURE_LAYOUT order
    pub fn values(&self) -> [u32; FEATURE_COUNT] {
        let mut out = [0u32; FEATURE_COUNT];
        for (slot, name) in out.iter_mut().zip(FEATURE_LAYOUT) {
            *slot = self.get(name).unwrap_or(0);
        }
        out
    }

    pub fn from_values(values: [u32; FEATURE_COUNT]) -> Self {
        let mut set = Self::default();
        for (name, value) in FEATURE_LAYOUT.iter().zip(values) {
            set.set(name, value);
        }
        set
    }

    /// Values in the order of an arbitrary column list (a model's pinned columns)
    pub fn values_for<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<f32>, SchemaMismatchError> {
        let mut out = Vec::with_capacity(columns.len());
        let mut unexpected = Vec::new();
        for column in columns {
            match self.get(column.as_ref()) {
                Some(v) => out.push(v as f32),
                None => unexpected.push(column.as_ref().to_string()),
            }
        }
        if unexpected.is_empty() {
            Ok(out)
        } else {
            Err(SchemaMismatchError { missing: Vec::new(), unexpected, reordered: false })
        }
    }

    /// True when every page-derived field is zero (no page, or an empty one)
    pub fn page_fields_zero(&self) -> bool {
        self.form_count == 0
            && self.has_login_form == 0
            && self.has_password_field == 0
            && self.image_count == 0
            && self.external_links_count == 0
            && self.suspicious_keywords_html == 0
    }
}

/// Stored dataset row / inference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub url: String,
    /// 0 = legitimate, 1 = suspicious, None for inference-only records
    pub label: Option<u8>,
    pub features: FeatureSet,
}

impl FeatureRecord {
    pub fn new(url: impl Into<String>, label: Option<u8>, features: FeatureSet) -> Self {
        Self { url: url.into(), label, features }
    }
}
