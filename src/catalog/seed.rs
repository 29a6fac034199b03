//! Built-in catalog served when no source produced anything.

use rust_decimal::Decimal;

use crate::domain::aggregates::{category_from_name, Product};
use crate::domain::value_objects::{Money, ProductId};

/// (name, description, price in cents, max quantity, image slug)
const SEED: &[(&str, &str, i64, u32, &str)] = &[
    ("Apple, Red", "Apple, Red 40 lb", 5400, 10, "apple-red"),
    ("Asparagus", "Asparagus", 3600, 15, "asparagus"),
    ("Avocado, Hass 60 ct #1", "Avocado, Hass 60 ct #1", 4700, 50, "avocado-hass"),
    ("Avocado, Hass 60 ct #1 Pinto", "Avocado, Hass 60 ct. #1 Pinto", 4800, 50, "avocado-pinto"),
    ("Avocado, Hass 48 ct", "Avocado, Hass 48 ct", 4500, 50, "avocado-48ct"),
    ("Avocado, Florida GreenSkin", "Avocado, Florida GreenSkin", 4800, 50, "avocado-florida"),
    ("Banana, Burro", "Banana, Burro 40 lb", 3500, 100, "banana-burro"),
    ("Banana, Cooking (Guineo)", "Banana, Cooking (Guineo) 40 lb", 2600, 100, "banana-cooking"),
    ("Banana, Plantain", "Banana, Plantain Green 40 lb", 4100, 100, "banana-plantain"),
    ("Banana, Regular", "Banana, Regular 40 lb", 2900, 100, "banana-regular"),
    ("Beans, Pinto", "Beans, Pinto 50 lb", 4850, 50, "beans-pinto"),
    ("Tomato, 5x6", "Tomato, 5x6 25 lb", 2000, 50, "tomato-5x6"),
    ("Tomato, 6x6", "Tomato, 6x6 25 lb", 1900, 50, "tomato-6x6"),
    ("Tomato, 6x7", "Tomato, 6x7 25 lb", 1500, 50, "tomato-6x7"),
    ("Tomato, Plum", "Tomato, Plum 25 lb", 2000, 50, "tomato-plum"),
];

pub fn seed_catalog() -> Vec<Product> {
    SEED.iter()
        .enumerate()
        .map(|(index, &(name, description, price_cents, max_quantity, slug))| {
            let image = format!("https://www.example.com/{slug}.jpg");
            Product {
                id: ProductId::new((index + 1).to_string()),
                name: name.to_string(),
                description: description.to_string(),
                price: Money::new(Decimal::new(price_cents, 2)),
                category: category_from_name(name),
                image: image.clone(),
                images: vec![image],
                stock: max_quantity,
                max_quantity,
            }
        })
        .collect()
}
