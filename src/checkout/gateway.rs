//! Order submission.
//!
//! [`OrderGateway::submit`] never fails from the caller's point of view:
//! every problem, local or remote, is folded into
//! [`SubmissionOutcome::Rejected`] with a message fit to show the customer.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::payload::order_fields;
use crate::catalog::FormApiClient;
use crate::config::{ConfigError, FieldMapping, StorefrontConfig};
use crate::domain::aggregates::Order;
use crate::domain::value_objects::{Money, SourceId};

pub const ACCEPTED_MESSAGE: &str = "Order submitted successfully";
pub const DEV_ACCEPTED_MESSAGE: &str = "Order submitted successfully (development fallback)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted { message: String, submission_id: String },
    Rejected { message: String },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool { matches!(self, Self::Accepted { .. }) }

    pub fn message(&self) -> &str {
        match self {
            Self::Accepted { message, .. } | Self::Rejected { message } => message,
        }
    }
}

/// Checks made before anything goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Customer name is required")]
    MissingName,
    #[error("Customer address is required")]
    MissingAddress,
    #[error("Order must contain at least one item")]
    NoItems,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("no response from order endpoint: {0}")]
    NoResponse(#[source] reqwest::Error),

    #[error("order endpoint returned HTTP {status}")]
    Status { status: u16, message: Option<String> },

    #[error("order endpoint refused the submission")]
    Refused { message: Option<String> },

    #[error("unreadable order response: {0}")]
    Unparseable(String),
}

impl GatewayError {
    /// Text shown to the customer.
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(e) => e.to_string(),
            Self::NoResponse(_) => "No response from server. Check your internet connection.".to_string(),
            Self::Status { status, message } => message.clone().unwrap_or_else(|| format!("Server error: {status}. Please try again.")),
            Self::Refused { message } => message.clone().unwrap_or_else(|| "Order submission failed. Please try again.".to_string()),
            Self::Unparseable(_) => "An error occurred during submission. Please try again later.".to_string(),
        }
    }

    /// Whether the failure happened after the request left the process.
    pub fn is_remote(&self) -> bool { !matches!(self, Self::Invalid(_)) }
}

pub fn validate_order(order: &Order) -> Result<(), ValidationError> {
    if order.customer.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if order.customer.address.trim().is_empty() {
        return Err(ValidationError::MissingAddress);
    }
    if order.items.is_empty() {
        return Err(ValidationError::NoItems);
    }
    Ok(())
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn submit(&self, order: &Order) -> SubmissionOutcome;
}

#[async_trait]
impl<T: OrderGateway + ?Sized> OrderGateway for Arc<T> {
    async fn submit(&self, order: &Order) -> SubmissionOutcome { (**self).submit(order).await }
}

/// Posts orders to a form's submissions endpoint.
#[derive(Clone, Debug)]
pub struct FormOrderGateway {
    client: FormApiClient,
    form: SourceId,
    fields: FieldMapping,
    shipping_fee: Money,
    dev_fallback: bool,
}

impl FormOrderGateway {
    pub fn new(config: &StorefrontConfig, client: FormApiClient) -> Result<Self, ConfigError> {
        let form = config.order_form().cloned().ok_or_else(|| ConfigError::MissingEnvVar("FORMCART_ORDER_FORM".into()))?;
        Ok(Self {
            client,
            form,
            fields: config.fields.clone(),
            shipping_fee: config.shipping_fee,
            dev_fallback: config.allows_dev_fallback(),
        })
    }

    /// Submission id on success.
    pub async fn try_submit(&self, order: &Order) -> Result<String, GatewayError> {
        validate_order(order)?;
        let fields = order_fields(order, self.client.api_key(), &self.fields, self.shipping_fee);
        let (status, body) = self.client.post_submission(&self.form, &fields).await.map_err(GatewayError::NoResponse)?;
        interpret_response(status.as_u16(), &body)
    }
}

#[async_trait]
impl OrderGateway for FormOrderGateway {
    async fn submit(&self, order: &Order) -> SubmissionOutcome {
        match self.try_submit(order).await {
            Ok(submission_id) => {
                info!(form = %self.form, submission_id = %submission_id, items = order.items.len(), "order accepted");
                SubmissionOutcome::Accepted { message: ACCEPTED_MESSAGE.to_string(), submission_id }
            }
            Err(e) if e.is_remote() && self.dev_fallback => {
                warn!(form = %self.form, error = %e, "order submission failed, substituting development fallback");
                SubmissionOutcome::Accepted { message: DEV_ACCEPTED_MESSAGE.to_string(), submission_id: dev_submission_id() }
            }
            Err(e) => {
                warn!(form = %self.form, error = %e, "order rejected");
                SubmissionOutcome::Rejected { message: e.user_message() }
            }
        }
    }
}

/// Maps a raw response onto a submission id or a failure.
pub fn interpret_response(status: u16, body: &str) -> Result<String, GatewayError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<Value>(body).ok().and_then(|v| server_message(&v));
        return Err(GatewayError::Status { status, message });
    }

    let payload: Value = serde_json::from_str(body).map_err(|e| GatewayError::Unparseable(e.to_string()))?;
    let accepted = payload.get("responseCode").and_then(Value::as_i64) == Some(200);
    let submission_id = payload.get("content").and_then(|c| c.get("submissionID")).and_then(|id| match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    match submission_id {
        Some(id) if accepted => Ok(id),
        _ => Err(GatewayError::Refused { message: server_message(&payload) }),
    }
}

fn server_message(payload: &Value) -> Option<String> {
    payload.get("message").and_then(Value::as_str).filter(|m| !m.is_empty()).map(str::to_string)
}

fn dev_submission_id() -> String {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
    format!("DEV-{millis}")
}
