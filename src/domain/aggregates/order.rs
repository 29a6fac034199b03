//! Order Aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::domain::aggregates::cart::{Cart, CartItem};
use crate::domain::value_objects::{Money, PaymentMethod};

/// In-progress customer and payment form state, persisted on every edit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDraft {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub order_date: NaiveDate,
}

impl Default for CheckoutDraft {
    fn default() -> Self {
        Self {
            name: String::new(), address: String::new(), email: None, phone: None,
            payment_method: PaymentMethod::default(), order_date: Utc::now().date_naive(),
        }
    }
}

impl CheckoutDraft {
    /// Name and address are the only fields checkout insists on.
    pub fn has_required_fields(&self) -> bool { self.validate().is_ok() }

    /// Forgets the customer identity but keeps the payment preference.
    pub fn clear_customer(&mut self) {
        self.name.clear();
        self.address.clear();
        self.email = None;
        self.phone = None;
        self.order_date = Utc::now().date_naive();
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { return Err(ValidationError::new("blank")); }
    Ok(())
}

/// Snapshot sent to the order endpoint; built at submission time only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub customer: CheckoutDraft,
    pub items: Vec<CartItem>,
    /// Σ price × quantity. Shipping is never included here.
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub order_date: NaiveDate,
}

impl Order {
    pub fn from_cart(customer: &CheckoutDraft, cart: &Cart) -> Self {
        Self {
            customer: customer.clone(),
            items: cart.items().to_vec(),
            total_amount: cart.subtotal(),
            payment_method: customer.payment_method,
            order_date: customer.order_date,
        }
    }

    pub fn subtotal(&self) -> Money { self.items.iter().map(CartItem::line_total).sum() }
}

/// Entry of the local order history log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub submission_id: String,
    pub order: Order,
    pub placed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Product;
    use rust_decimal::Decimal;

    #[test]
    fn test_required_fields() {
        let mut draft = CheckoutDraft::default();
        assert!(!draft.has_required_fields());
        draft.name = "Ada".into();
        assert!(!draft.has_required_fields());
        draft.address = "1 Main St".into();
        assert!(draft.has_required_fields());
        draft.address = "   ".into();
        assert!(!draft.has_required_fields());
        draft.clear_customer();
        assert!(!draft.has_required_fields());
    }

    #[test]
    fn test_total_excludes_shipping() {
        let mut cart = Cart::new();
        let p = Product {
            id: "1".into(), name: "Apple, Red".into(), description: String::new(),
            price: Money::new(Decimal::new(25, 0)), category: "Apple".into(),
            image: String::new(), images: vec![], stock: 10, max_quantity: 10,
        };
        cart.add_item(&p, 4);
        let draft = CheckoutDraft { name: "Ada".into(), address: "1 Main St".into(), payment_method: PaymentMethod::Paypal, ..Default::default() };
        let order = Order::from_cart(&draft, &cart);
        assert_eq!(order.total_amount, Money::new(Decimal::new(100, 0)));
        assert_eq!(order.total_amount, order.subtotal());
        assert_eq!(order.payment_method, PaymentMethod::Paypal);
    }

    #[test]
    fn test_draft_round_trip_shape() {
        let draft = CheckoutDraft { name: "Ada".into(), ..Default::default() };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["paymentMethod"], "card");
        assert!(json.get("email").is_none());
    }
}
