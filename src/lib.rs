//! Markaz catalog scraper
//!
//! This crate crawls the Markaz storefront's category tree, expands each
//! subcategory's lazily-loaded product listing, extracts structured product
//! data from the detail pages and merges everything into a durable JSON
//! catalog snapshot.
//!
//! The crawl is resumable: progress is checkpointed after every subcategory,
//! and the published artifact only ever changes through an atomic rename of
//! a completed checkpoint.

pub mod browser;
pub mod catalog;
pub mod config;
pub mod crawler;
pub mod extract;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Browser launch error: {0}")]
    BrowserLaunch(String),

    #[error("Navigation timed out for {url}")]
    NavigationTimeout { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("No product data found at {url}")]
    Extraction { url: String },

    #[error("No categories found at {url}")]
    CategoryDiscovery { url: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{CatalogSnapshot, Category, Product, Subcategory};
pub use config::Config;
pub use crawler::crawl;
