//! Conversion of raw product payloads into [`Product`].
//!
//! The form API returns products in several shapes depending on the
//! endpoint and on how the form was built. Every field is resolved through
//! an ordered alias list; the first *present* value wins, where present
//! means not null, not `""`, not `false` and not numeric zero.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::aggregates::{category_from_name, is_placeholder_image, Product};
use crate::domain::value_objects::{Money, ProductId};

const ID_ALIASES: &[&str] = &["pid", "id", "productId"];
const NAME_ALIASES: &[&str] = &["name", "productName", "text"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "text"];
const PRICE_ALIASES: &[&str] = &["price", "amount"];
const CATEGORY_ALIASES: &[&str] = &["category", "productCategory", "type"];
const STOCK_ALIASES: &[&str] = &["stock", "quantity"];
const IMAGE_ALIASES: &[&str] = &["image", "thumbnail", "imageUrl"];

pub const DEFAULT_STOCK: u32 = 10;

/// Placeholder background per category; anything else uses the default.
const CATEGORY_COLORS: &[(&str, &str)] = &[
    ("Apple", "FF6B6B"),
    ("Vegetables", "6BCB77"),
    ("Avocado", "4D8B31"),
    ("Banana", "FFD93D"),
    ("Beans", "B45309"),
    ("Tomato", "DC2626"),
    ("Fruits", "7c2d12"),
    ("Roots", "f97316"),
];
const DEFAULT_COLOR: &str = "4096ff";

/// Normalizes one raw product. `index` is its position in the list it came
/// from and only feeds the id/name fallbacks.
pub fn normalize_product(raw: &Value, index: usize) -> Product {
    let id = resolve_text(raw, ID_ALIASES).unwrap_or_else(|| format!("product-{index}"));
    let name = resolve_text(raw, NAME_ALIASES).unwrap_or_else(|| format!("Product {}", index + 1));
    let description = resolve_text(raw, DESCRIPTION_ALIASES).unwrap_or_else(|| name.clone());
    let price = resolve(raw, PRICE_ALIASES).and_then(parse_price).unwrap_or(Decimal::ZERO);
    let category = resolve_text(raw, CATEGORY_ALIASES).unwrap_or_else(|| category_from_name(&name));
    let stock = resolve(raw, STOCK_ALIASES).and_then(parse_stock).unwrap_or(DEFAULT_STOCK);

    let mut images = collect_images(raw);
    if images.is_empty() {
        images.push(placeholder_image(&category, &clean_name(&name)));
    }

    Product {
        id: ProductId::new(id),
        name,
        description,
        price: Money::new(price.max(Decimal::ZERO)),
        category,
        image: images[0].clone(),
        images,
        stock,
        max_quantity: stock,
    }
}

pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn resolve<'a>(raw: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().filter_map(|key| raw.get(*key)).find(|v| is_present(v))
}

/// Like [`resolve`], but skips values that cannot be read as text.
fn resolve_text(raw: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().filter_map(|key| raw.get(*key)).filter(|v| is_present(v)).find_map(as_text)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let repr = n.to_string();
            Decimal::from_str(&repr).or_else(|_| Decimal::from_scientific(&repr)).ok()
        }
        Value::String(s) => leading_number(s, true).and_then(|prefix| Decimal::from_str(prefix).ok()),
        _ => None,
    }
}

fn parse_stock(value: &Value) -> Option<u32> {
    let parsed = match value {
        Value::Number(n) => n.as_f64().map(|f| f.trunc()).filter(|f| *f >= 1.0 && *f <= f64::from(u32::MAX)).map(|f| f as u32),
        Value::String(s) => leading_number(s, false).and_then(|prefix| prefix.parse::<u32>().ok()),
        _ => None,
    };
    parsed.filter(|n| *n > 0)
}

/// Longest numeric prefix of `s` after leading whitespace, e.g. `"12.50 USD"`
/// gives `"12.50"`. Negative values are not accepted.
fn leading_number(s: &str, allow_fraction: bool) -> Option<&str> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let bytes = s.as_bytes();
    let mut end = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let int_end = end;
    if allow_fraction && end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > end + 1 {
            end = frac_end;
        }
    }
    if int_end == 0 && end == 0 {
        return None;
    }
    Some(&s[..end])
}

/// Real image urls: the `images` list (native or JSON-encoded) followed by
/// the single-image aliases, without placeholders or repeats.
fn collect_images(raw: &Value) -> Vec<String> {
    let listed: Vec<Value> = match raw.get("images") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => items,
            _ if encoded.starts_with("http") => vec![Value::String(encoded.clone())],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut urls: Vec<String> = listed
        .iter()
        .filter_map(Value::as_str)
        .map(|url| url.replace('\\', ""))
        .filter(|url| !url.is_empty() && !is_placeholder_image(url))
        .collect();

    for url in IMAGE_ALIASES.iter().filter_map(|key| raw.get(*key)).filter_map(Value::as_str) {
        let url = url.replace('\\', "");
        if !url.is_empty() && !is_placeholder_image(&url) && !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// `"Apple, Red"` reads as `"Red"` on a placeholder; names without a comma
/// are used whole.
pub fn clean_name(name: &str) -> String {
    match name.split_once(',') {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim().to_string(),
        _ => name.trim().to_string(),
    }
}

/// Generated stand-in image for a product without a real one.
pub fn placeholder_image(category: &str, caption: &str) -> String {
    let background = CATEGORY_COLORS
        .iter()
        .find(|(name, _)| *name == category)
        .map_or(DEFAULT_COLOR, |(_, color)| *color);
    let text = if category == "Banana" { "333333" } else { "ffffff" };
    format!("https://placehold.co/400x300/{background}/{text}?text={}", urlencoding::encode(caption))
}
