//! HTTP fetcher for product detail pages
//!
//! Listing pages need a real browser, but product pages ship their
//! structured data in the initial HTML response, so they are fetched
//! over plain HTTP which is far cheaper at catalog scale.

use crate::browser::USER_AGENT;
use crate::{CrawlError, Result};
use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client used for product pages.
///
/// # Arguments
///
/// * `timeout_secs` - Hard deadline for a whole request
///
/// # Example
///
/// ```no_run
/// use markaz_scraper::crawler::build_http_client;
///
/// let client = build_http_client(30).unwrap();
/// ```
pub fn build_http_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

/// Fetches a product page and returns its HTML body.
///
/// Non-success statuses are errors; the retry policy lives with the
/// caller.
pub async fn fetch_product_page(client: &Client, url: &str) -> Result<String> {
    tracing::debug!("Fetching product page: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| CrawlError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CrawlError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| CrawlError::Http {
        url: url.to_string(),
        source,
    })
}
