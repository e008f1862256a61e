use serde::Deserialize;

/// Main configuration structure for the scraper
///
/// Every field has a default, so an empty TOML file yields a working
/// configuration for the production storefront.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub listing: ListingConfig,
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root URL of the storefront
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent product page fetches
    #[serde(rename = "fetch-concurrency")]
    pub fetch_concurrency: u32,

    /// Cap on products taken per subcategory (0 means unlimited)
    #[serde(rename = "max-products-per-subcategory")]
    pub max_products_per_subcategory: u32,

    /// How long a previously scraped product stays reusable (days)
    #[serde(rename = "freshness-window-days")]
    pub freshness_window_days: u32,

    /// Hard deadline for one browser navigation (seconds)
    #[serde(rename = "navigation-timeout-secs")]
    pub navigation_timeout_secs: u64,

    /// Hard deadline for one product page fetch (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Pause after navigation for client-side hydration (milliseconds)
    #[serde(rename = "settle-millis")]
    pub settle_millis: u64,
}

/// Listing enumeration configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Absolute cap on scroll steps per listing
    #[serde(rename = "scroll-max-steps")]
    pub scroll_max_steps: u32,

    /// Consecutive no-growth steps before a listing counts as complete
    #[serde(rename = "scroll-stable-steps")]
    pub scroll_stable_steps: u32,

    /// Pause between scroll steps (milliseconds)
    #[serde(rename = "scroll-pause-millis")]
    pub scroll_pause_millis: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the published catalog JSON artifact
    #[serde(rename = "catalog-path")]
    pub catalog_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.shop.markaz.app".to_string(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 4,
            max_products_per_subcategory: 0,
            freshness_window_days: 7,
            navigation_timeout_secs: 60,
            fetch_timeout_secs: 30,
            settle_millis: 1000,
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            scroll_max_steps: 24,
            scroll_stable_steps: 3,
            scroll_pause_millis: 700,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            catalog_path: "./data/catalog.json".to_string(),
        }
    }
}
