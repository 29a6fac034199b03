//! Locating product lists inside each endpoint's payload.

use serde_json::Value;

use super::normalize::{is_present, normalize_product};
use super::{CatalogError, Endpoint};
use crate::domain::aggregates::Product;

const PRODUCT_FIELD_TYPES: &[&str] = &["control_payment", "control_products"];
const PRODUCT_LIST_MARKER: &str = "productList";
const ANSWER_PRODUCT_KEYS: &[&str] = &["products", "paymentProducts"];

/// Normalized products found in an endpoint response. A response without
/// `content` is malformed; a well-formed one may still hold no products.
pub(crate) fn products(endpoint: Endpoint, payload: &Value) -> Result<Vec<Product>, CatalogError> {
    let content = payload
        .get("content")
        .filter(|c| !c.is_null())
        .ok_or_else(|| CatalogError::Malformed(format!("{endpoint} response has no content")))?;

    Ok(match endpoint {
        Endpoint::PaymentInfo => from_payment_info(content),
        Endpoint::Questions => from_questions(content),
        Endpoint::Submissions => from_submissions(content),
    })
}

/// Either `content.products`, or the first answer carrying a product list.
fn from_payment_info(content: &Value) -> Vec<Product> {
    if let Some(list) = content.get("products").and_then(Value::as_array) {
        return normalize_all(list);
    }

    let answer = values(content.get("answers"))
        .find(|answer| answer.get("paymentProducts").is_some() || answer.get("products").is_some());
    let list = answer.and_then(|answer| {
        answer
            .get("paymentProducts")
            .filter(|v| is_present(v))
            .or_else(|| answer.get("products"))
            .and_then(Value::as_array)
    });
    list.map(|list| normalize_all(list)).unwrap_or_default()
}

fn from_questions(content: &Value) -> Vec<Product> {
    let mut products = Vec::new();
    for field in values(Some(content)).filter(|field| is_product_field(field)) {
        for raw in field.get("products").and_then(Value::as_array).into_iter().flatten() {
            products.push(normalize_product(raw, products.len()));
        }
    }
    products
}

fn is_product_field(field: &Value) -> bool {
    let field_type = field.get("type").and_then(Value::as_str).unwrap_or_default();
    let name = field.get("name").and_then(Value::as_str).unwrap_or_default();
    PRODUCT_FIELD_TYPES.contains(&field_type) || name.contains(PRODUCT_LIST_MARKER)
}

/// Products embedded in past submissions, first occurrence of each name kept.
fn from_submissions(content: &Value) -> Vec<Product> {
    let mut products: Vec<Product> = Vec::new();
    for submission in content.as_array().into_iter().flatten() {
        for answer in values(submission.get("answers")) {
            for key in ANSWER_PRODUCT_KEYS {
                for raw in answer.get(*key).and_then(Value::as_array).into_iter().flatten() {
                    let product = normalize_product(raw, products.len());
                    if !products.iter().any(|p| p.name == product.name) {
                        products.push(product);
                    }
                }
            }
        }
    }
    products
}

fn normalize_all(list: &[Value]) -> Vec<Product> {
    list.iter().enumerate().map(|(index, raw)| normalize_product(raw, index)).collect()
}

/// Children of a JSON object or array; nothing for scalars.
fn values(container: Option<&Value>) -> Box<dyn Iterator<Item = &Value> + '_> {
    match container {
        Some(Value::Object(map)) => Box::new(map.values()),
        Some(Value::Array(items)) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}
