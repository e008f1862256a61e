//! Category and subcategory name normalization
//!
//! Labels for the same section drift across the storefront: pluralization,
//! apostrophes, misspellings ("Stitchd") and synonyms ("Home Linen" vs
//! "Home Essentials"). Lookups fold every label onto a canonical key so
//! drifted variants still match. Both functions here are pure.

use once_cell::sync::Lazy;
use regex::Regex;

/// Spelling folds applied in order before the key is stripped down.
/// Order matters: possessives fold before the bare word rules, and
/// "unstitched" folds before "stitched" would swallow its tail.
static FOLD_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"women'?s", "women"),
        (r"men'?s", "men"),
        (r"unstitch(?:ed|d)", "unstitched"),
        (r"stitch(?:ed|d)", "stitched"),
        (r"hand\s*bags?", "handbag"),
        (r"shawls?", "shawl"),
        (r"accessories?", "accessory"),
        (r"undergarments?", "undergarment"),
        (r"kids?", "kid"),
        (r"home\s+essentials?", "home essential"),
        (r"&", "and"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("hardcoded pattern is valid"),
            replacement,
        )
    })
    .collect()
});

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_]").expect("hardcoded pattern is valid"));

/// Reduces a category or subcategory label to its canonical matching key.
///
/// Two labels refer to the same section exactly when their keys are equal.
///
/// # Example
///
/// ```
/// use markaz_scraper::catalog::canonical_key;
///
/// assert_eq!(canonical_key("Women's Stitched"), canonical_key("womens stitchd"));
/// assert_eq!(canonical_key("Bags & Shawls"), "bagsandshawl");
/// ```
pub fn canonical_key(label: &str) -> String {
    let mut folded = label.to_lowercase();
    for (rule, replacement) in FOLD_RULES.iter() {
        folded = rule.replace_all(&folded, *replacement).into_owned();
    }
    let key = NON_WORD.replace_all(&folded, "").into_owned();
    alias(&key).unwrap_or(key)
}

/// Second-chance key rewrites for storefront labels the fold rules do
/// not cover.
fn alias(key: &str) -> Option<String> {
    let aliased = match key {
        "menstitchd" => "menstitched",
        "mensunstitchd" => "menunstitched",
        "womensstitchd" => "womenstitched",
        "womensunstitchd" => "womenunstitched",
        "autobikeaccessory" => "autoaccessory",
        "homelinen" => "homeessential",
        "fashionaccessory" => "accessory",
        "festivecollection" => "festive",
        "freedelivery" => "delivery",
        _ => return None,
    };
    Some(aliased.to_string())
}

/// Converts a display name to its URL slug.
///
/// # Example
///
/// ```
/// use markaz_scraper::catalog::slugify;
///
/// assert_eq!(slugify("Women's Fashion"), "womens-fashion");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let hyphenated: Vec<&str> = lowered.split_whitespace().collect();
    hyphenated
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}
