//! Domain events
use crate::domain::value_objects::{CheckoutStep, ProductId};

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Checkout(CheckoutEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    ItemAdded { product_id: ProductId, quantity: u32 },
    QuantityChanged { product_id: ProductId, quantity: u32 },
    QuantityCapped { product_id: ProductId, requested: u32, max: u32 },
    ItemRemoved { product_id: ProductId },
    Cleared,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutEvent {
    StepChanged { from: CheckoutStep, to: CheckoutStep },
    ValidationFailed { step: CheckoutStep, message: String },
    OrderAccepted { submission_id: String },
    OrderRejected { message: String },
    Reset,
}
