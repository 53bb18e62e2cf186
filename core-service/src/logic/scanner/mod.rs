//! HTML Signal Scanner - structural signals from raw page markup
//!
//! Best-effort scan: html5ever recovers from any malformed or truncated input,
//! so scanning never fails. Signals are counted, not validated.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::logic::features::layout::HTML_KEYWORDS;
use crate::logic::features::url::count_keywords;


static FORM: Lazy<Selector> = Lazy::new(|| selector("form"));
static INPUT: Lazy<Selector> = Lazy::new(|| selector("input"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Page-derived half of the feature record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HtmlSignals {
    pub form_count: u32,
    pub has_login_form: u32,
    pub has_password_field: u32,
    pub image_count: u32,
    pub external_links_count: u32,
    pub suspicious_keywords_html: u32,
}

impl HtmlSignals {
    /// All-zero signals, used when no page could be fetched
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Scan raw HTML.
///
/// `page_netloc` is the netloc of the URL that was requested, as written.
/// A link is external when its href starts with `http` and does not contain
/// `page_netloc` anywhere, a plain substring test on purpose.
pub fn scan(html: &str, page_netloc: &str) -> HtmlSignals {
    let document = Html::parse_document(html);

    let forms: Vec<ElementRef> = document.select(&FORM).collect();
    let has_login_form = forms.iter().any(|form| {
        ["action", "id"].iter().any(|attr| {
            form.value()
                .attr(attr)
                .map(|v| v.to_lowercase().contains("login"))
                .unwrap_or(false)
        })
    });

    let has_password_field = document
        .select(&INPUT)
        .any(|input| input.value().attr("type") == Some("password"));

    let external_links = document
        .select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with("http") && !href.contains(page_netloc))
        .count();

    HtmlSignals {
        form_count: forms.len() as u32,
        has_login_form: u32::from(has_login_form),
        has_password_field: u32::from(has_password_field),
        image_count: document.select(&IMG).count() as u32,
        external_links_count: external_links as u32,
        suspicious_keywords_html: count_keywords(&html.to_lowercase(), HTML_KEYWORDS),
    }
}
