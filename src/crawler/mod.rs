//! Crawler module
//!
//! This module contains the crawl machinery:
//! - Browser-driven discovery of categories and subcategories
//! - Listing enumeration with scroll and pagination handling
//! - Bounded-concurrency product fetching over plain HTTP
//! - Orchestration, checkpointing and resume

mod fetcher;
mod listing;
mod orchestrator;
mod runner;

pub use fetcher::{build_http_client, fetch_product_page};
pub use listing::enumerate_listing;
pub use orchestrator::Orchestrator;
pub use runner::map_limit;

use crate::browser::ChromeNavigator;
use crate::config::Config;
use crate::Result;
use std::sync::Arc;

/// Entry listing page, relative to the site base URL.
pub const EXPLORE_PATH: &str = "/explore";

/// Path prefix shared by every category listing URL.
pub const CATEGORY_PREFIX: &str = "/explore/home-page/";

/// Marker identifying product detail links.
pub const PRODUCT_PATH_MARKER: &str = "/explore/product/";

/// Runs a complete crawl with a freshly launched browser.
///
/// This is the main entry point. It will:
/// 1. Launch a headless browser
/// 2. Walk categories, subcategories and product listings
/// 3. Fetch and extract product pages, reusing fresh cached records
/// 4. Checkpoint after every subcategory and promote the final artifact
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Discard any checkpoint and cached snapshot first
pub async fn crawl(config: Config, fresh: bool) -> Result<()> {
    let navigator = Arc::new(ChromeNavigator::launch(&config.crawler).await?);
    let orchestrator = Orchestrator::new(config, navigator.clone())?;

    let outcome = orchestrator.run(fresh).await;
    drop(orchestrator);

    // Shut the browser down on both paths; a crawl error wins over a
    // teardown error.
    match Arc::try_unwrap(navigator) {
        Ok(owned) => {
            let shutdown = owned.shutdown().await;
            outcome.and(shutdown)
        }
        Err(_) => outcome,
    }
}
