//! PhishGuard Core - URL feature extraction, dataset collection, serving

pub mod constants;
pub mod logic;
