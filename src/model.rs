// Core structs: Offer, CatalogueProduct, WatchStats
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Slack added on top of `was / 2` so that prices like 2.50 vs 4.99 still
/// count as half price.
pub const HALF_PRICE_TOLERANCE: f64 = 0.01;

/// One normalized product offer, tagged with the watch item that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub watch_name: String,
    pub store: String,
    pub title: String,
    pub price: f64,
    pub was_price: Option<f64>,
    pub size: Option<String>,
    pub url: String,
    pub is_half_price: bool,
    pub fetched_at: DateTime<Utc>,
}

/// A product line recognized in a PDF catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueProduct {
    pub name: String,
    pub price: f64,
    pub save: Option<f64>,
    pub discount_percent: Option<u32>,
    /// The catalogue line the product was parsed from, kept for matching.
    pub line: String,
}

impl CatalogueProduct {
    /// Catalogues rarely print a "was" price; an explicit discount of at
    /// least 50%, or a saving no smaller than the current price, means the
    /// offer is at half price or better.
    pub fn is_half_price(&self) -> bool {
        self.discount_percent.is_some_and(|percent| percent >= 50)
            || self
                .save
                .is_some_and(|save| save >= self.price - HALF_PRICE_TOLERANCE)
    }
}

/// A store newsletter pulled from the mailbox.
#[derive(Debug, Clone)]
pub struct Newsletter {
    pub store: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct WatchStats {
    pub watch_name: String,
    pub avg_price: f64,
    pub std_dev: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no API key configured: set `api.key` or export {0}")]
    MissingApiKey(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no price field found in {store} product")]
    MissingPrice { store: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}")]
    Status { status: reqwest::StatusCode },
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid selector `{0}`")]
    Selector(String),
}

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to read pdf: {0}")]
    Pdf(#[from] lopdf::Error),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail credentials are not configured")]
    MissingCredentials,
    #[error("tls setup failed: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("imap error: {0}")]
    Imap(#[from] imap::error::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
