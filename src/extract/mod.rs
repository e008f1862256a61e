//! Product data extraction
//!
//! Pure functions over fetched product page HTML. The structured JSON-LD
//! path is preferred; markup heuristics take over for pages that omit or
//! ship an unusable structured block. A page yields a product only when
//! at least a title or a price was recovered.

mod fallback;
mod structured;

use crate::catalog::Product;
use chrono::{DateTime, Utc};
use scraper::Html;
use url::Url;

/// Currency assumed for priced products that do not state one.
pub(crate) const SITE_CURRENCY: &str = "PKR";

/// Product fields recovered from one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedProduct {
    pub title: Option<String>,
    pub code: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub availability: Option<String>,
    pub images: Vec<String>,
    pub description: Option<String>,
}

impl ExtractedProduct {
    /// A record is usable once it carries a non-empty title or a price.
    fn is_usable(&self) -> bool {
        let titled = self
            .title
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        titled || self.price.is_some()
    }
}

/// Extracts product fields from a fetched detail page.
///
/// Returns `None` only when neither extraction path recovers a title or
/// a price; such a page is not a product page at all.
///
/// # Example
///
/// ```
/// use markaz_scraper::extract::extract_product;
///
/// let html = r#"<html><head><script type="application/ld+json">
/// {"@type": "Product", "name": "Lawn Suit", "offers": {"price": "2,499"}}
/// </script></head><body></body></html>"#;
///
/// let product = extract_product(html).unwrap();
/// assert_eq!(product.title.as_deref(), Some("Lawn Suit"));
/// assert_eq!(product.price, Some(2499.0));
/// assert_eq!(product.currency.as_deref(), Some("PKR"));
/// ```
pub fn extract_product(html: &str) -> Option<ExtractedProduct> {
    let document = Html::parse_document(html);

    if let Some(product) = structured::from_json_ld(&document) {
        if product.is_usable() {
            return Some(product);
        }
    }

    let product = fallback::from_markup(&document);
    product.is_usable().then_some(product)
}

/// Builds the persisted record for one product page.
///
/// Identity falls back from the explicit code to the last URL path
/// segment to the URL itself, so every product gets a non-empty id.
pub fn assemble_product(url: &Url, extracted: ExtractedProduct, seen_at: DateTime<Utc>) -> Product {
    let id = extracted
        .code
        .clone()
        .filter(|code| !code.trim().is_empty())
        .or_else(|| last_path_segment(url))
        .unwrap_or_else(|| url.to_string());

    let image = extracted.images.first().cloned();

    Product {
        id,
        title: extracted.title.unwrap_or_default(),
        code: extracted.code,
        brand: extracted.brand,
        price: extracted.price,
        currency: extracted.currency,
        availability: extracted.availability,
        images: extracted.images,
        description: extracted.description,
        link: url.to_string(),
        image,
        updated_at: Some(seen_at),
    }
}

fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}
