//! Configuration validation
//!
//! Catches impossible settings at startup instead of letting them
//! surface mid-crawl.

use crate::config::types::{Config, CrawlerConfig, ListingConfig, OutputConfig, SiteConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the complete configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_listing_config(&config.listing)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_site_config(site: &SiteConfig) -> ConfigResult<()> {
    let url = Url::parse(&site.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", site.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{}: scheme must be http or https",
            site.base_url
        )));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{}: missing host",
            site.base_url
        )));
    }
    Ok(())
}

fn validate_crawler_config(crawler: &CrawlerConfig) -> ConfigResult<()> {
    if crawler.fetch_concurrency < 1 || crawler.fetch_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "fetch-concurrency must be between 1 and 100, got {}",
            crawler.fetch_concurrency
        )));
    }
    if crawler.navigation_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "navigation-timeout-secs must be at least 1".to_string(),
        ));
    }
    if crawler.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "fetch-timeout-secs must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_listing_config(listing: &ListingConfig) -> ConfigResult<()> {
    if listing.scroll_max_steps < 1 {
        return Err(ConfigError::Validation(
            "scroll-max-steps must be at least 1".to_string(),
        ));
    }
    if listing.scroll_stable_steps < 1 {
        return Err(ConfigError::Validation(
            "scroll-stable-steps must be at least 1".to_string(),
        ));
    }
    if listing.scroll_stable_steps > listing.scroll_max_steps {
        return Err(ConfigError::Validation(format!(
            "scroll-stable-steps ({}) cannot exceed scroll-max-steps ({})",
            listing.scroll_stable_steps, listing.scroll_max_steps
        )));
    }
    Ok(())
}

fn validate_output_config(output: &OutputConfig) -> ConfigResult<()> {
    if output.catalog_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "catalog-path must not be empty".to_string(),
        ));
    }
    Ok(())
}
