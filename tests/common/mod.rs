//! Shared fixtures for the integration tests
//!
//! The browser side is replaced by a scripted navigator that serves
//! canned DOM frames keyed by exact URL. Product pages are served over
//! HTTP by wiremock so the fetch and extraction path runs end to end.

#![allow(dead_code)]

use async_trait::async_trait;
use markaz_scraper::browser::{Navigator, PageSession};
use markaz_scraper::catalog::CatalogSnapshot;
use markaz_scraper::config::Config;
use markaz_scraper::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scripted DOM for one URL. The first frame is the initial document;
/// each scroll step advances to the next frame and the last one sticks.
#[derive(Clone)]
pub struct PageScript {
    frames: Vec<String>,
}

impl PageScript {
    pub fn fixed(html: impl Into<String>) -> Self {
        Self {
            frames: vec![html.into()],
        }
    }

    pub fn frames(frames: Vec<String>) -> Self {
        Self { frames }
    }
}

/// Serves scripted pages by exact URL and records every visit.
/// Unmapped URLs get an empty document.
#[derive(Default)]
pub struct ScriptedNavigator {
    pages: HashMap<String, PageScript>,
    visits: Arc<Mutex<Vec<String>>>,
}

impl ScriptedNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, script: PageScript) -> Self {
        self.pages.insert(url.into(), script);
        self
    }

    pub fn visit_count(&self, url: &str) -> usize {
        self.visits
            .lock()
            .unwrap()
            .iter()
            .filter(|visited| visited.as_str() == url)
            .count()
    }
}

#[async_trait]
impl Navigator for ScriptedNavigator {
    async fn visit(&self, url: &str) -> Result<Box<dyn PageSession>> {
        self.visits.lock().unwrap().push(url.to_string());
        let script = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| PageScript::fixed("<html><body></body></html>"));
        Ok(Box::new(ScriptedSession {
            frames: script.frames,
            position: Mutex::new(0),
        }))
    }
}

struct ScriptedSession {
    frames: Vec<String>,
    position: Mutex<usize>,
}

#[async_trait]
impl PageSession for ScriptedSession {
    async fn content(&self) -> Result<String> {
        let position = *self.position.lock().unwrap();
        Ok(self
            .frames
            .get(position)
            .or_else(|| self.frames.last())
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn scroll_by_viewport(&self) -> Result<()> {
        let mut position = self.position.lock().unwrap();
        if *position + 1 < self.frames.len() {
            *position += 1;
        }
        Ok(())
    }

    async fn nudge_wheel(&self) -> Result<()> {
        Ok(())
    }

    async fn activate_control(&self, _label: &str) -> Result<bool> {
        Ok(false)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Configuration pointed at the test server, tuned so scroll pauses do
/// not slow the suite down.
pub fn test_config(base_url: &str, catalog_path: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.listing.scroll_max_steps = 2;
    config.listing.scroll_stable_steps = 1;
    config.listing.scroll_pause_millis = 1;
    config.output.catalog_path = catalog_path.to_string_lossy().into_owned();
    config
}

pub fn category_url(base: &str, category: &str) -> String {
    format!("{}/explore/home-page/{}", base, category)
}

pub fn subcategory_url(base: &str, category: &str, subcategory: &str) -> String {
    format!("{}/explore/home-page/{}/{}", base, category, subcategory)
}

pub fn explore_page(categories: &[&str]) -> String {
    let links: String = categories
        .iter()
        .map(|name| format!(r#"<a href="/explore/home-page/{}">{}</a>"#, name, name))
        .collect();
    format!("<html><body><nav>{}</nav></body></html>", links)
}

pub fn category_page(category: &str, subcategories: &[&str]) -> String {
    let links: String = subcategories
        .iter()
        .map(|name| {
            format!(
                r#"<a href="/explore/home-page/{}/{}">{}</a>"#,
                category, name, name
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", links)
}

pub fn listing_page(product_ids: &[&str]) -> String {
    let links: String = product_ids
        .iter()
        .map(|id| format!(r#"<a href="/explore/product/{}">{}</a>"#, id, id))
        .collect();
    format!("<html><body>{}</body></html>", links)
}

/// A product detail page carrying a schema.org JSON-LD block.
pub fn product_page(title: &str, price: u32, description: &str) -> String {
    let image = format!(
        "https://cdn.example.com/{}.jpg",
        title.to_lowercase().replace(' ', "-")
    );
    format!(
        r#"<html><head>
<script type="application/ld+json">
{{"@type": "Product", "name": "{title}", "description": "{description}",
  "image": ["{image}"],
  "offers": {{"price": {price}, "priceCurrency": "PKR", "availability": "https://schema.org/InStock"}}}}
</script>
</head><body><h1>{title}</h1></body></html>"#
    )
}

/// Mounts a product page at `/explore/product/{id}`, answering after
/// `delay_millis` so completion order can be scrambled.
pub async fn mount_product(
    server: &MockServer,
    id: &str,
    title: &str,
    price: u32,
    delay_millis: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/explore/product/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(product_page(title, price, "Fine fabric with detailed work."))
                .set_delay(Duration::from_millis(delay_millis)),
        )
        .mount(server)
        .await;
}

/// How many product page requests the server has seen so far.
pub async fn product_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path().starts_with("/explore/product/"))
        .count()
}

/// How many requests hit one exact path.
pub async fn requests_to(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}

/// Reads the promoted catalog back as a snapshot.
pub fn read_catalog(path: &Path) -> CatalogSnapshot {
    let raw = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&raw).unwrap()
}
