//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Product identifier, unique within a merged catalog
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }

    /// Namespaces the id with a source tag, e.g. `form2-7`.
    pub fn prefixed(&self, prefix: &str) -> Self { Self(format!("{prefix}{}", self.0)) }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str { &self.0 }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self { Self(value) }
}

/// Form id of one upstream catalog source
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(value: impl Into<String>) -> Result<Self, SourceIdError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(SourceIdError::Empty); }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(SourceIdError::InvalidCharacter);
        }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SourceIdError { Empty, InvalidCharacter }
impl std::error::Error for SourceIdError {}
impl fmt::Display for SourceIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "source id empty"), Self::InvalidCharacter => write!(f, "source id has invalid characters") }
    }
}

/// Dollar amount; always rendered with two decimals
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn amount(&self) -> Decimal { self.0 }
    /// Saturates at `Decimal::MAX`; remote prices are not range-checked.
    pub fn add(&self, other: Money) -> Money { Money(self.0.checked_add(other.0).unwrap_or(Decimal::MAX)) }
    pub fn multiply(&self, qty: u32) -> Money { Money(self.0.checked_mul(Decimal::from(qty)).unwrap_or(Decimal::MAX)) }

    /// Two-decimal amount without the currency sign, e.g. `104.99`.
    pub fn plain(&self) -> String { format!("{:.2}", self.0.round_dp(2)) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "${}", self.plain()) }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self { iter.fold(Money::ZERO, |acc, m| acc.add(m)) }
}

/// Payment method picked at checkout; only changes which inputs are shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Card => "card", Self::Paypal => "paypal" }
    }
}

/// Checkout steps in their fixed order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CheckoutStep {
    #[default]
    Cart = 1,
    Details = 2,
    Payment = 3,
    Confirmation = 4,
}

impl CheckoutStep {
    pub fn number(&self) -> u8 { *self as u8 }
    pub fn previous(&self) -> Option<Self> {
        match self { Self::Cart => None, Self::Details => Some(Self::Cart), Self::Payment => Some(Self::Details), Self::Confirmation => Some(Self::Payment) }
    }
}
