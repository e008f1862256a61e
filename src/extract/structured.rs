//! Structured product data from JSON-LD blocks
//!
//! Product pages carry a schema.org `Product` entity in one of their
//! `application/ld+json` script blocks. The entity may sit at the top
//! level, inside an array, or under `@graph`; the first `Product` found
//! wins. Malformed blocks are skipped, never fatal.

use super::{ExtractedProduct, SITE_CURRENCY};
use scraper::{Html, Selector};
use serde_json::Value;

pub(super) fn from_json_ld(document: &Html) -> Option<ExtractedProduct> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return None;
    };

    for element in document.select(&selector) {
        let raw = element.text().collect::<String>();
        let Ok(data) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        for entity in candidate_entities(&data) {
            if is_product(entity) {
                return Some(product_from_entity(entity));
            }
        }
    }
    None
}

/// A block can be a lone entity, a bare array, or a document wrapping
/// its entities in `@graph`.
fn candidate_entities(data: &Value) -> Vec<&Value> {
    match data {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![data],
        },
        _ => vec![data],
    }
}

fn is_product(entity: &Value) -> bool {
    match entity.get("@type") {
        Some(Value::String(kind)) => kind == "Product",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind.as_str() == Some("Product")),
        _ => false,
    }
}

fn product_from_entity(entity: &Value) -> ExtractedProduct {
    let offer = first_offer(entity);
    let price = offer.and_then(|o| o.get("price")).and_then(parse_price);
    let currency = if price.is_some() {
        offer
            .and_then(|o| string_field(o, "priceCurrency"))
            .or_else(|| Some(SITE_CURRENCY.to_string()))
    } else {
        None
    };

    ExtractedProduct {
        title: string_field(entity, "name"),
        code: string_field(entity, "sku"),
        brand: brand_name(entity),
        price,
        currency,
        availability: offer.and_then(|o| string_field(o, "availability")),
        images: image_urls(entity),
        description: string_field(entity, "description"),
    }
}

/// Offers appear both as a single object and as an array; the first
/// entry is the one the site prices the product with.
fn first_offer(entity: &Value) -> Option<&Value> {
    match entity.get("offers") {
        Some(Value::Array(offers)) => offers.first(),
        Some(offer @ Value::Object(_)) => Some(offer),
        _ => None,
    }
}

/// Accepts numeric and string prices, stripping thousands separators
/// from strings. Anything unparsable counts as no price at all.
fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let cleaned: String = text.chars().filter(|c| *c != ',' && *c != ' ').collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `brand` is either a bare string or an organization object.
fn brand_name(entity: &Value) -> Option<String> {
    match entity.get("brand")? {
        Value::String(name) => {
            let trimmed = name.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        brand @ Value::Object(_) => string_field(brand, "name"),
        _ => None,
    }
}

/// `image` is one URL, a list of URLs, or `ImageObject`s with a `url`.
fn image_urls(entity: &Value) -> Vec<String> {
    match entity.get("image") {
        Some(Value::Array(entries)) => entries.iter().filter_map(image_url).collect(),
        Some(entry) => image_url(entry).into_iter().collect(),
        None => Vec::new(),
    }
}

fn image_url(entry: &Value) -> Option<String> {
    match entry {
        Value::String(src) => {
            let trimmed = src.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Object(map) => map
            .get("url")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}
