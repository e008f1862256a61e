//! Heuristic extraction for pages without structured data
//!
//! Scans the rendered markup directly: heading or document title for the
//! name, a rupee-marked amount in the visible text for the price, the
//! largest dimensioned image for the photo, and a labelled code if one
//! is printed anywhere on the page.

use super::{ExtractedProduct, SITE_CURRENCY};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:Rs|PKR|₨)\s*([\d,.]+)").expect("hardcoded pattern is valid"));

static CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:SKU|Product\s*Code|Item\s*Code|Style\s*#)\s*[:#]?\s*([A-Za-z0-9_/-]+)")
        .expect("hardcoded pattern is valid")
});

pub(super) fn from_markup(document: &Html) -> ExtractedProduct {
    let text = visible_text(document);
    let price = PRICE_RE
        .captures(&text)
        .and_then(|captures| parse_amount(&captures[1]));

    ExtractedProduct {
        title: heading_or_title(document),
        code: CODE_RE
            .captures(&text)
            .map(|captures| captures[1].to_string()),
        brand: None,
        price,
        currency: price.is_some().then(|| SITE_CURRENCY.to_string()),
        availability: None,
        images: largest_image(document).into_iter().collect(),
        description: meta_description(document)
            .or_else(|| (!text.is_empty()).then(|| text.clone())),
    }
}

fn parse_amount(token: &str) -> Option<f64> {
    let cleaned: String = token.chars().filter(|c| *c != ',' && *c != ' ').collect();
    cleaned.parse().ok()
}

/// First non-empty `<h1>`, falling back to the document title.
fn heading_or_title(document: &Html) -> Option<String> {
    for selector in ["h1", "title"] {
        let Ok(parsed) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = document.select(&parsed).next() {
            let text = element.text().collect::<String>();
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

fn meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

/// Picks the image with the largest declared area. Images that do not
/// declare both dimensions are ignored; icons and layout chrome rarely
/// carry them.
fn largest_image(document: &Html) -> Option<String> {
    let selector = Selector::parse("img[src]").ok()?;
    let mut best: Option<(u64, String)> = None;
    for element in document.select(&selector) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let src = src.trim();
        if src.is_empty() {
            continue;
        }
        let Some(width) = numeric_attr(element, "width") else {
            continue;
        };
        let Some(height) = numeric_attr(element, "height") else {
            continue;
        };
        // Dimensions come straight off the page; saturate rather than
        // overflow on absurd declared values.
        let area = width.saturating_mul(height);
        if best.as_ref().map_or(true, |(largest, _)| area > *largest) {
            best = Some((area, src.to_string()));
        }
    }
    best.map(|(_, src)| src)
}

fn numeric_attr(element: ElementRef<'_>, name: &str) -> Option<u64> {
    element
        .value()
        .attr(name)?
        .trim()
        .parse()
        .ok()
        .filter(|value| *value > 0)
}

/// Body text with script, style and noscript content excluded and
/// whitespace collapsed.
fn visible_text(document: &Html) -> String {
    let mut raw = String::new();
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());
    match body {
        Some(body) => collect_text(body, &mut raw),
        None => collect_text(document.root_element(), &mut raw),
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(child_element) => {
                if matches!(child_element.name(), "script" | "style" | "noscript") {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Html {
        Html::parse_document(&format!(
            "<html><head><title>Markaz Shop</title></head><body>{}</body></html>",
            body
        ))
    }

    #[test]
    fn test_title_from_h1() {
        let document = page("<h1> Embroidered Kurta </h1>");
        let product = from_markup(&document);
        assert_eq!(product.title.as_deref(), Some("Embroidered Kurta"));
    }

    #[test]
    fn test_title_falls_back_to_document_title() {
        let document = page("<h1>   </h1><p>content</p>");
        let product = from_markup(&document);
        assert_eq!(product.title.as_deref(), Some("Markaz Shop"));
    }

    #[test]
    fn test_price_with_rs_marker() {
        let document = page("<h1>Kurta</h1><span>Rs 1,299</span>");
        let product = from_markup(&document);
        assert_eq!(product.price, Some(1299.0));
        assert_eq!(product.currency.as_deref(), Some("PKR"));
    }

    #[test]
    fn test_price_with_rupee_sign() {
        let document = page("<h1>Kurta</h1><div>₨2500 only</div>");
        let product = from_markup(&document);
        assert_eq!(product.price, Some(2500.0));
    }

    #[test]
    fn test_no_price_means_no_currency() {
        let document = page("<h1>Kurta</h1><p>Lovely fabric</p>");
        let product = from_markup(&document);
        assert!(product.price.is_none());
        assert!(product.currency.is_none());
    }

    #[test]
    fn test_price_inside_script_is_ignored() {
        let document = page("<h1>Kurta</h1><script>var x = 'Rs 999';</script>");
        let product = from_markup(&document);
        assert!(product.price.is_none());
    }

    #[test]
    fn test_code_from_label() {
        let document = page("<h1>Kurta</h1><p>SKU: AB-123/XL</p>");
        let product = from_markup(&document);
        assert_eq!(product.code.as_deref(), Some("AB-123/XL"));

        let document = page("<h1>Kurta</h1><p>Product Code # K_77</p>");
        let product = from_markup(&document);
        assert_eq!(product.code.as_deref(), Some("K_77"));
    }

    #[test]
    fn test_largest_dimensioned_image_wins() {
        let document = page(concat!(
            r#"<img src="https://cdn.example.com/icon.png" width="32" height="32">"#,
            r#"<img src="https://cdn.example.com/hero.jpg" width="800" height="600">"#,
            r#"<img src="https://cdn.example.com/thumb.jpg" width="100" height="100">"#,
        ));
        let product = from_markup(&document);
        assert_eq!(product.images, vec!["https://cdn.example.com/hero.jpg"]);
    }

    #[test]
    fn test_images_without_dimensions_are_skipped() {
        let document = page(r#"<img src="https://cdn.example.com/banner.jpg">"#);
        let product = from_markup(&document);
        assert!(product.images.is_empty());
    }

    #[test]
    fn test_huge_dimension_attributes_saturate() {
        let document = page(concat!(
            r#"<img src="https://cdn.example.com/bogus.jpg" width="18446744073709551615" height="2">"#,
            r#"<img src="https://cdn.example.com/hero.jpg" width="800" height="600">"#,
        ));
        let product = from_markup(&document);
        // The larger declared area still wins; it must not wrap or panic.
        assert_eq!(product.images, vec!["https://cdn.example.com/bogus.jpg"]);
    }

    #[test]
    fn test_meta_description_preferred_over_body_text() {
        let html = concat!(
            "<html><head>",
            r#"<meta name="description" content="Premium lawn kurta.">"#,
            "</head><body><h1>Kurta</h1><p>Long body copy here</p></body></html>",
        );
        let document = Html::parse_document(html);
        let product = from_markup(&document);
        assert_eq!(product.description.as_deref(), Some("Premium lawn kurta."));
    }

    #[test]
    fn test_description_falls_back_to_visible_text() {
        let document = page("<h1>Kurta</h1><p>Soft   fabric</p>");
        let product = from_markup(&document);
        assert_eq!(product.description.as_deref(), Some("Kurta Soft fabric"));
    }
}
