//! Catalog snapshot data model
//!
//! These types serialize to the JSON artifact consumed by the storefront
//! reader. Field names are camelCase on the wire; optional fields are
//! omitted entirely when absent, except `image` which is always present
//! (null when the product has no images) because readers index it
//! directly.

use crate::catalog::names::{canonical_key, slugify};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root of the catalog artifact: one complete crawl of the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    /// Completion time of the crawl that produced this snapshot.
    pub scraped_at: DateTime<Utc>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub url: String,
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub name: String,
    pub url: String,
    pub products: Vec<Product>,
}

/// One product entry in listing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Canonical product page URL, as first seen in its listing.
    pub link: String,
    /// Primary image, always serialized (null when `images` is empty).
    pub image: Option<String>,
    /// When the product page was last fetched and parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// Creates an empty snapshot. The timestamp is provisional until the
    /// crawl finishes and overwrites it.
    pub fn new() -> Self {
        Self {
            scraped_at: Utc::now(),
            categories: Vec::new(),
        }
    }

    /// Replaces or appends `subcategory` under the named category.
    ///
    /// Categories are keyed by name; a new category is appended at the
    /// end so the snapshot keeps site walk order. Within a category a
    /// same-named subcategory is replaced in place.
    pub fn upsert_subcategory(
        &mut self,
        category_name: &str,
        category_url: &str,
        subcategory: Subcategory,
    ) {
        let index = match self.categories.iter().position(|c| c.name == category_name) {
            Some(index) => index,
            None => {
                self.categories.push(Category {
                    name: category_name.to_string(),
                    url: category_url.to_string(),
                    subcategories: Vec::new(),
                });
                self.categories.len() - 1
            }
        };
        let category = &mut self.categories[index];
        match category
            .subcategories
            .iter_mut()
            .find(|s| s.name == subcategory.name)
        {
            Some(existing) => *existing = subcategory,
            None => category.subcategories.push(subcategory),
        }
    }

    /// Ensures the named category exists, empty if new, so categories
    /// with no discoverable subcategories still appear in walk order.
    pub fn ensure_category(&mut self, name: &str, url: &str) {
        if !self.categories.iter().any(|c| c.name == name) {
            self.categories.push(Category {
                name: name.to_string(),
                url: url.to_string(),
                subcategories: Vec::new(),
            });
        }
    }

    /// Finds a category by slug or fuzzy label match.
    pub fn find_category(&self, label: &str) -> Option<&Category> {
        let slug = slugify(label);
        let key = canonical_key(label);
        self.categories
            .iter()
            .find(|c| slugify(&c.name) == slug)
            .or_else(|| self.categories.iter().find(|c| canonical_key(&c.name) == key))
    }

    /// Total number of products across all subcategories.
    pub fn product_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| &c.subcategories)
            .map(|s| s.products.len())
            .sum()
    }
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl Category {
    /// Finds a subcategory by slug or fuzzy label match.
    pub fn find_subcategory(&self, label: &str) -> Option<&Subcategory> {
        let slug = slugify(label);
        let key = canonical_key(label);
        self.subcategories
            .iter()
            .find(|s| slugify(&s.name) == slug)
            .or_else(|| {
                self.subcategories
                    .iter()
                    .find(|s| canonical_key(&s.name) == key)
            })
    }
}
