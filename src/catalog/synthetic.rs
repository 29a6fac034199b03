//! Deterministic stand-in catalog for a source whose remote tiers all failed.

use rust_decimal::Decimal;

use super::normalize::placeholder_image;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Money, ProductId, SourceId};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

struct Template {
    name: &'static str,
    description: &'static str,
    price_cents: i64,
    category: &'static str,
    max_quantity: u32,
}

const TEMPLATES: &[Template] = &[
    Template { name: "Apple, Red", description: "Apple, Red 40 lb", price_cents: 5400, category: "Apple", max_quantity: 10 },
    Template { name: "Asparagus", description: "Asparagus", price_cents: 3600, category: "Vegetables", max_quantity: 15 },
    Template { name: "Avocado, Hass 60 ct #1", description: "Avocado, Hass 60 ct #1", price_cents: 4700, category: "Avocado", max_quantity: 50 },
    Template { name: "Banana, Regular", description: "Banana, Regular 40 lb", price_cents: 2900, category: "Banana", max_quantity: 100 },
    Template { name: "Tomato, 5x6", description: "Tomato, 5x6 25 lb", price_cents: 2000, category: "Tomato", max_quantity: 50 },
    Template { name: "Yucca, Fresh", description: "Yucca, Fresh 32 lb", price_cents: 3500, category: "Roots", max_quantity: 100 },
];

/// 64-bit FNV-1a over the id's bytes.
pub fn source_hash(source: &SourceId) -> u64 {
    source.as_str().bytes().fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
}

/// Between 6 and 9 products, starting at a hash-chosen template and wrapping
/// around. The same source always gets the same list.
pub fn synthetic_catalog(source: &SourceId) -> Vec<Product> {
    let hash = source_hash(source);
    let start = (hash % 3) as usize;
    let count = 6 + (hash % 4) as usize;

    (0..count)
        .map(|i| {
            let template = &TEMPLATES[(start + i) % TEMPLATES.len()];
            let image = placeholder_image(template.category, template.name);
            Product {
                id: ProductId::new(format!("{source}-dummy-{i}")),
                name: template.name.to_string(),
                description: template.description.to_string(),
                price: Money::new(Decimal::new(template.price_cents, 2)),
                category: template.category.to_string(),
                image: image.clone(),
                images: vec![image],
                stock: template.max_quantity,
                max_quantity: template.max_quantity,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str) -> SourceId { SourceId::new(id).unwrap() }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(source_hash(&source("a")), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(source_hash(&source("foobar")), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn test_same_source_same_catalog() {
        let a = synthetic_catalog(&source("251074098711961"));
        let b = synthetic_catalog(&source("251074098711961"));
        assert_eq!(a, b);
        assert!((6..=9).contains(&a.len()));
    }

    #[test]
    fn test_ids_and_placeholders() {
        let products = synthetic_catalog(&source("251074098711961"));
        for (i, p) in products.iter().enumerate() {
            assert_eq!(p.id.as_str(), format!("251074098711961-dummy-{i}"));
            assert!(!p.has_real_image());
            assert_eq!(p.stock, p.max_quantity);
        }
    }

    #[test]
    fn test_start_offset_follows_hash() {
        let id = source("250903652960963");
        let start = (source_hash(&id) % 3) as usize;
        assert_eq!(synthetic_catalog(&id)[0].name, TEMPLATES[start].name);
    }
}
