//! Integration tests for checkpointing and resume
//!
//! A checkpoint is written after every subcategory, so an interrupted
//! run can pick up where it left off. These tests craft checkpoints
//! directly and verify what the next run does and does not revisit.

mod common;

use chrono::{DateTime, Utc};
use common::{
    category_page, category_url, explore_page, listing_page, mount_product, read_catalog,
    requests_to, subcategory_url, test_config, PageScript, ScriptedNavigator,
};
use markaz_scraper::catalog::{checkpoint_path, CatalogSnapshot, Product, SnapshotStore, Subcategory};
use markaz_scraper::crawler::Orchestrator;
use markaz_scraper::CrawlError;
use std::sync::Arc;
use wiremock::MockServer;

fn old_timestamp() -> DateTime<Utc> {
    "2020-01-01T00:00:00Z".parse().unwrap()
}

/// A product record as a previous run would have stored it.
fn stored_product(id: &str, link: &str, updated_at: DateTime<Utc>) -> Product {
    Product {
        id: id.to_string(),
        title: format!("Product {}", id),
        code: None,
        brand: None,
        price: Some(1500.0),
        currency: Some("PKR".to_string()),
        availability: None,
        images: vec![format!("https://cdn.example.com/{}.jpg", id)],
        description: Some("Stored description".to_string()),
        link: link.to_string(),
        image: Some(format!("https://cdn.example.com/{}.jpg", id)),
        updated_at: Some(updated_at),
    }
}

fn checkpointed_subcategory(base: &str, category: &str, name: &str, product_id: &str) -> Subcategory {
    Subcategory {
        name: name.to_string(),
        url: subcategory_url(base, category, name),
        products: vec![stored_product(
            product_id,
            &format!("{}/explore/product/{}", base, product_id),
            old_timestamp(),
        )],
    }
}

#[tokio::test]
async fn test_resume_skips_checkpointed_subcategories() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.json");

    mount_product(&server, "p2", "Unstitched Lawn", 1800, 0).await;

    // A previous run got through Women > Stitched before dying
    let mut checkpoint = CatalogSnapshot::new();
    checkpoint.upsert_subcategory(
        "Women",
        &category_url(&base, "Women"),
        checkpointed_subcategory(&base, "Women", "Stitched", "p1"),
    );
    let store = SnapshotStore::new(catalog_path.clone());
    store.save_checkpoint(&checkpoint).unwrap();

    let stitched_url = subcategory_url(&base, "Women", "Stitched");
    let navigator = Arc::new(
        ScriptedNavigator::new()
            .page(
                format!("{}/explore", base),
                PageScript::fixed(explore_page(&["Women"])),
            )
            .page(
                category_url(&base, "Women"),
                PageScript::fixed(category_page("Women", &["Stitched", "Unstitched"])),
            )
            .page(stitched_url.clone(), PageScript::fixed(listing_page(&["wrong"])))
            .page(
                subcategory_url(&base, "Women", "Unstitched"),
                PageScript::fixed(listing_page(&["p2"])),
            ),
    );

    let config = test_config(&base, &catalog_path);
    let orchestrator = Orchestrator::new(config, navigator.clone()).unwrap();
    orchestrator.run(false).await.unwrap();

    // The checkpointed subcategory's listing was never reopened
    assert_eq!(navigator.visit_count(&stitched_url), 0);

    let snapshot = read_catalog(&catalog_path);
    let women = &snapshot.categories[0];
    let names: Vec<&str> = women
        .subcategories
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["Stitched", "Unstitched"]);

    // Checkpointed records survive untouched, old timestamp included
    assert_eq!(women.subcategories[0].products[0].id, "p1");
    assert_eq!(
        women.subcategories[0].products[0].updated_at,
        Some(old_timestamp())
    );
    assert_eq!(women.subcategories[1].products[0].id, "p2");
    assert!(!checkpoint_path(&catalog_path).exists());
}

#[tokio::test]
async fn test_completed_categories_are_not_revisited() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.json");

    mount_product(&server, "p3", "Leather Sandals", 2200, 0).await;

    // Every checkpointed category except the last counts as complete
    let mut checkpoint = CatalogSnapshot::new();
    checkpoint.upsert_subcategory(
        "Women",
        &category_url(&base, "Women"),
        checkpointed_subcategory(&base, "Women", "Stitched", "pw"),
    );
    checkpoint.upsert_subcategory(
        "Men",
        &category_url(&base, "Men"),
        checkpointed_subcategory(&base, "Men", "Shoes", "pm"),
    );
    let store = SnapshotStore::new(catalog_path.clone());
    store.save_checkpoint(&checkpoint).unwrap();

    let navigator = Arc::new(
        ScriptedNavigator::new()
            .page(
                format!("{}/explore", base),
                PageScript::fixed(explore_page(&["Women", "Men"])),
            )
            .page(
                category_url(&base, "Men"),
                PageScript::fixed(category_page("Men", &["Shoes", "Sandals"])),
            )
            .page(
                subcategory_url(&base, "Men", "Sandals"),
                PageScript::fixed(listing_page(&["p3"])),
            ),
    );

    let config = test_config(&base, &catalog_path);
    let orchestrator = Orchestrator::new(config, navigator.clone()).unwrap();
    orchestrator.run(false).await.unwrap();

    // Women was skipped outright; within Men only Sandals was new
    assert_eq!(navigator.visit_count(&category_url(&base, "Women")), 0);
    assert_eq!(
        navigator.visit_count(&subcategory_url(&base, "Men", "Shoes")),
        0
    );

    let snapshot = read_catalog(&catalog_path);
    let names: Vec<&str> = snapshot.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Women", "Men"]);
    assert_eq!(snapshot.categories[0].subcategories[0].products[0].id, "pw");

    let men = &snapshot.categories[1];
    let sub_names: Vec<&str> = men.subcategories.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(sub_names, vec!["Shoes", "Sandals"]);
    assert_eq!(men.subcategories[1].products[0].id, "p3");
}

#[tokio::test]
async fn test_category_discovery_failure_is_fatal_and_preserves_checkpoint() {
    let base = "http://shop.test".to_string();
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.json");

    let mut checkpoint = CatalogSnapshot::new();
    checkpoint.upsert_subcategory(
        "Women",
        &category_url(&base, "Women"),
        checkpointed_subcategory(&base, "Women", "Stitched", "p1"),
    );
    let store = SnapshotStore::new(catalog_path.clone());
    store.save_checkpoint(&checkpoint).unwrap();

    // The navigator knows no pages, so the explore page comes back
    // empty and yields no categories
    let navigator = Arc::new(ScriptedNavigator::new());

    let config = test_config(&base, &catalog_path);
    let orchestrator = Orchestrator::new(config, navigator.clone()).unwrap();
    let err = orchestrator.run(false).await.unwrap_err();

    assert!(matches!(err, CrawlError::CategoryDiscovery { .. }));
    assert!(checkpoint_path(&catalog_path).exists());
    assert!(!catalog_path.exists());
}

#[tokio::test]
async fn test_fresh_run_ignores_checkpoint_and_previous_catalog() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.json");

    mount_product(&server, "p1", "Lawn Suit", 2499, 0).await;

    // A published catalog whose product is well inside the freshness
    // window, plus a leftover checkpoint
    let mut published = CatalogSnapshot::new();
    published.upsert_subcategory(
        "Women",
        &category_url(&base, "Women"),
        Subcategory {
            name: "Stitched".to_string(),
            url: subcategory_url(&base, "Women", "Stitched"),
            products: vec![stored_product(
                "p1",
                &format!("{}/explore/product/p1", base),
                Utc::now(),
            )],
        },
    );
    let store = SnapshotStore::new(catalog_path.clone());
    store.save_checkpoint(&published).unwrap();
    store.promote().unwrap();
    store.save_checkpoint(&published).unwrap();

    let navigator = Arc::new(
        ScriptedNavigator::new()
            .page(
                format!("{}/explore", base),
                PageScript::fixed(explore_page(&["Women"])),
            )
            .page(
                category_url(&base, "Women"),
                PageScript::fixed(category_page("Women", &["Stitched"])),
            )
            .page(
                subcategory_url(&base, "Women", "Stitched"),
                PageScript::fixed(listing_page(&["p1"])),
            ),
    );

    let config = test_config(&base, &catalog_path);
    let orchestrator = Orchestrator::new(config, navigator.clone()).unwrap();
    orchestrator.run(true).await.unwrap();

    // The cached record was ignored and the page fetched again
    assert_eq!(requests_to(&server, "/explore/product/p1").await, 1);

    let snapshot = read_catalog(&catalog_path);
    let refreshed = &snapshot.categories[0].subcategories[0].products[0];
    assert_eq!(refreshed.title, "Lawn Suit");
    assert!(!checkpoint_path(&catalog_path).exists());
}
