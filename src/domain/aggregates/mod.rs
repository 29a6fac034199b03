//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod favorites;

pub use product::{Product, is_placeholder_image, category_from_name};
pub use order::{CheckoutDraft, Order, OrderRecord};
pub use cart::{Cart, CartError, CartItem};
pub use favorites::{Favorites, ViewedLog, VIEWED_LOG_CAP};
