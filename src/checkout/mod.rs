//! Checkout state machine.
//!
//! `Cart → Details → Payment → Confirmation`. Forward moves are guarded:
//! leaving `Cart` needs a non-empty cart, leaving `Details` needs a name and
//! an address, and leaving `Payment` submits the order. A failed guard or a
//! rejected submission leaves the step unchanged and surfaces a notice.
//! After a successful order the flow resets itself once the confirmation
//! delay has passed.

mod gateway;
mod payload;

pub use gateway::{
    interpret_response, validate_order, FormOrderGateway, GatewayError, OrderGateway, SubmissionOutcome, ValidationError,
    ACCEPTED_MESSAGE, DEV_ACCEPTED_MESSAGE,
};
pub use payload::{order_fields, order_summary, product_field_id};
pub use crate::domain::value_objects::CheckoutStep;

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::aggregates::{CheckoutDraft, Order, OrderRecord};
use crate::domain::events::{CheckoutEvent, DomainEvent};
use crate::domain::value_objects::PaymentMethod;
use crate::shop::ShopState;
use crate::store::{keys, load_json, save_json, PersistentStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please fill out all required fields")]
    MissingFields,

    /// Gateway rejection, message passed through untouched
    #[error("{0}")]
    Rejected(String),
}

/// Message shown in the checkout panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self { Self { text: text.into(), is_error: true } }
    pub fn success(text: impl Into<String>) -> Self { Self { text: text.into(), is_error: false } }
}

pub struct CheckoutFlow<G> {
    gateway: G,
    store: Arc<dyn PersistentStore>,
    step: CheckoutStep,
    open: bool,
    draft: CheckoutDraft,
    notice: Option<Notice>,
    reset_after: Duration,
    reset_pending: bool,
    events: Vec<DomainEvent>,
}

impl<G: OrderGateway> CheckoutFlow<G> {
    /// Restores the persisted draft; the separately stored payment method
    /// wins over the one inside the draft.
    pub fn load(gateway: G, store: Arc<dyn PersistentStore>, reset_after: Duration) -> Self {
        let mut draft: CheckoutDraft = read(store.as_ref(), keys::CHECKOUT_DRAFT).unwrap_or_default();
        if let Some(method) = read::<PaymentMethod>(store.as_ref(), keys::PAYMENT_METHOD) {
            draft.payment_method = method;
        }
        Self {
            gateway,
            store,
            step: CheckoutStep::Cart,
            open: false,
            draft,
            notice: None,
            reset_after,
            reset_pending: false,
            events: Vec::new(),
        }
    }

    pub fn step(&self) -> CheckoutStep { self.step }
    pub fn is_open(&self) -> bool { self.open }
    pub fn draft(&self) -> &CheckoutDraft { &self.draft }
    pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }
    pub fn gateway(&self) -> &G { &self.gateway }

    /// Delay before the automatic reset, while one is pending.
    pub fn pending_reset(&self) -> Option<Duration> { self.reset_pending.then_some(self.reset_after) }

    pub fn open(&mut self) {
        self.open = true;
        self.notice = None;
        self.set_step(CheckoutStep::Cart);
    }

    pub fn close(&mut self) { self.open = false; }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
        self.persist_draft();
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.draft.address = address.into();
        self.persist_draft();
    }

    pub fn set_email(&mut self, email: Option<String>) {
        self.draft.email = email.filter(|e| !e.trim().is_empty());
        self.persist_draft();
    }

    pub fn set_phone(&mut self, phone: Option<String>) {
        self.draft.phone = phone.filter(|p| !p.trim().is_empty());
        self.persist_draft();
    }

    pub fn set_order_date(&mut self, date: NaiveDate) {
        self.draft.order_date = date;
        self.persist_draft();
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.draft.payment_method = method;
        self.persist_draft();
        if let Err(e) = save_json(self.store.as_ref(), keys::PAYMENT_METHOD, &method) {
            warn!(error = %e, "failed to persist payment method");
        }
    }

    /// Moves one step forward, submitting the order when leaving `Payment`.
    /// On failure the step is unchanged and the message is also kept as the
    /// current notice.
    pub async fn advance(&mut self, shop: &mut ShopState) -> Result<CheckoutStep, CheckoutError> {
        let current = self.step;
        let outcome = match current {
            CheckoutStep::Cart => cart_guard(shop).map(|()| CheckoutStep::Details),
            CheckoutStep::Details => self.details_guard().map(|()| CheckoutStep::Payment),
            CheckoutStep::Payment => self.submit(shop).await.map(|()| CheckoutStep::Confirmation),
            CheckoutStep::Confirmation => Ok(CheckoutStep::Confirmation),
        };

        match outcome {
            Ok(next) => {
                if next != CheckoutStep::Confirmation {
                    self.notice = None;
                }
                self.set_step(next);
                Ok(next)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// One step back from `Details` or `Payment`; the draft is kept.
    pub fn back(&mut self) -> CheckoutStep {
        if matches!(self.step, CheckoutStep::Details | CheckoutStep::Payment) {
            if let Some(previous) = self.step.previous() {
                self.notice = None;
                self.set_step(previous);
            }
        }
        self.step
    }

    /// Jumps to `target` when every guard up to it passes. `Confirmation`
    /// is only reachable by submitting. Returns whether the jump happened.
    pub fn go_to(&mut self, target: CheckoutStep, shop: &ShopState) -> bool {
        if target == CheckoutStep::Confirmation {
            return false;
        }
        let reachable = (target < CheckoutStep::Details || cart_guard(shop).is_ok())
            && (target < CheckoutStep::Payment || self.details_guard().is_ok());
        if !reachable {
            debug!(from = ?self.step, to = ?target, "step jump refused");
            return false;
        }
        self.notice = None;
        self.set_step(target);
        true
    }

    /// Sleeps out the confirmation delay, then resets. Returns `false`
    /// immediately when no reset is pending.
    pub async fn await_auto_reset(&mut self) -> bool {
        if !self.reset_pending {
            return false;
        }
        tokio::time::sleep(self.reset_after).await;
        self.reset();
        true
    }

    /// Back to a closed panel at `Cart` with the customer fields cleared.
    pub fn reset(&mut self) {
        self.set_step(CheckoutStep::Cart);
        self.open = false;
        self.notice = None;
        self.reset_pending = false;
        self.draft.clear_customer();
        self.persist_draft();
        self.raise_event(DomainEvent::Checkout(CheckoutEvent::Reset));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    fn details_guard(&self) -> Result<(), CheckoutError> {
        if self.draft.has_required_fields() { Ok(()) } else { Err(CheckoutError::MissingFields) }
    }

    async fn submit(&mut self, shop: &mut ShopState) -> Result<(), CheckoutError> {
        let order = Order::from_cart(&self.draft, shop.cart());
        match self.gateway.submit(&order).await {
            SubmissionOutcome::Accepted { message, submission_id } => {
                info!(submission_id = %submission_id, total = %order.total_amount, "checkout complete");
                shop.record_order(OrderRecord { submission_id: submission_id.clone(), order, placed_at: Utc::now() });
                shop.clear_cart();
                self.notice = Some(Notice::success(message));
                self.reset_pending = true;
                self.raise_event(DomainEvent::Checkout(CheckoutEvent::OrderAccepted { submission_id }));
                Ok(())
            }
            SubmissionOutcome::Rejected { message } => Err(CheckoutError::Rejected(message)),
        }
    }

    fn fail(&mut self, error: &CheckoutError) {
        let message = error.to_string();
        debug!(step = ?self.step, error = %message, "checkout step refused");
        self.notice = Some(Notice::error(message.clone()));
        let event = match error {
            CheckoutError::Rejected(_) => CheckoutEvent::OrderRejected { message },
            _ => CheckoutEvent::ValidationFailed { step: self.step, message },
        };
        self.raise_event(DomainEvent::Checkout(event));
    }

    fn set_step(&mut self, to: CheckoutStep) {
        if to != CheckoutStep::Confirmation {
            self.reset_pending = false;
        }
        if to != self.step {
            let from = std::mem::replace(&mut self.step, to);
            debug!(from = ?from, to = ?to, "checkout step changed");
            self.raise_event(DomainEvent::Checkout(CheckoutEvent::StepChanged { from, to }));
        }
    }

    fn persist_draft(&self) {
        if let Err(e) = save_json(self.store.as_ref(), keys::CHECKOUT_DRAFT, &self.draft) {
            warn!(error = %e, "failed to persist checkout draft");
        }
    }

    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

fn cart_guard(shop: &ShopState) -> Result<(), CheckoutError> {
    if shop.cart().is_empty() { Err(CheckoutError::EmptyCart) } else { Ok(()) }
}

fn read<T: serde::de::DeserializeOwned>(store: &dyn PersistentStore, key: &str) -> Option<T> {
    load_json(store, key).unwrap_or_else(|e| {
        warn!(key, error = %e, "failed to read checkout state");
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::seed_catalog;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Gateway answering every call with the same outcome.
    struct ScriptedGateway {
        outcome: SubmissionOutcome,
        orders: Mutex<Vec<Order>>,
    }

    impl ScriptedGateway {
        fn accepting() -> Self {
            Self::new(SubmissionOutcome::Accepted { message: ACCEPTED_MESSAGE.into(), submission_id: "5912".into() })
        }
        fn rejecting(message: &str) -> Self { Self::new(SubmissionOutcome::Rejected { message: message.into() }) }
        fn new(outcome: SubmissionOutcome) -> Self { Self { outcome, orders: Mutex::new(Vec::new()) } }
        fn calls(&self) -> usize { self.orders.lock().unwrap().len() }
    }

    #[async_trait]
    impl OrderGateway for ScriptedGateway {
        async fn submit(&self, order: &Order) -> SubmissionOutcome {
            self.orders.lock().unwrap().push(order.clone());
            self.outcome.clone()
        }
    }

    fn setup(gateway: ScriptedGateway) -> (MemoryStore, ShopState, CheckoutFlow<ScriptedGateway>) {
        let store = MemoryStore::new();
        let shop = ShopState::load(Arc::new(store.connect()));
        let flow = CheckoutFlow::load(gateway, Arc::new(store.connect()), Duration::from_secs(3));
        (store, shop, flow)
    }

    async fn reach_payment(shop: &mut ShopState, flow: &mut CheckoutFlow<ScriptedGateway>) {
        shop.add_to_cart(&seed_catalog()[0], 2);
        flow.open();
        flow.advance(shop).await.unwrap();
        flow.set_name("Ada Lovelace");
        flow.set_address("12 Analytical St");
        flow.advance(shop).await.unwrap();
        assert_eq!(flow.step(), CheckoutStep::Payment);
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_advance() {
        let (_, mut shop, mut flow) = setup(ScriptedGateway::accepting());
        flow.open();
        let err = flow.advance(&mut shop).await.unwrap_err();
        assert_eq!(flow.step(), CheckoutStep::Cart);
        assert!(!err.to_string().is_empty());
        assert_eq!(flow.notice(), Some(&Notice::error("Your cart is empty")));
    }

    #[tokio::test]
    async fn test_details_require_name_and_address() {
        let (_, mut shop, mut flow) = setup(ScriptedGateway::accepting());
        shop.add_to_cart(&seed_catalog()[0], 1);
        flow.open();
        flow.advance(&mut shop).await.unwrap();
        flow.set_name("Ada");
        assert_eq!(flow.advance(&mut shop).await, Err(CheckoutError::MissingFields));
        assert_eq!(flow.step(), CheckoutStep::Details);
        flow.set_address("1 Loop");
        assert_eq!(flow.advance(&mut shop).await, Ok(CheckoutStep::Payment));
        assert!(flow.notice().is_none());
    }

    #[tokio::test]
    async fn test_rejection_keeps_payment_and_cart() {
        let (_, mut shop, mut flow) = setup(ScriptedGateway::rejecting("Server error"));
        reach_payment(&mut shop, &mut flow).await;

        let err = flow.advance(&mut shop).await.unwrap_err();
        assert_eq!(err.to_string(), "Server error");
        assert_eq!(flow.step(), CheckoutStep::Payment);
        assert!(!shop.cart().is_empty());
        assert_eq!(flow.notice().map(|n| n.text.as_str()), Some("Server error"));
        assert!(shop.order_history().is_empty());
        assert!(flow.pending_reset().is_none());
    }

    #[tokio::test]
    async fn test_acceptance_clears_cart_and_records_history() {
        let (_, mut shop, mut flow) = setup(ScriptedGateway::accepting());
        reach_payment(&mut shop, &mut flow).await;

        assert_eq!(flow.advance(&mut shop).await, Ok(CheckoutStep::Confirmation));
        assert!(shop.cart().is_empty());
        assert_eq!(flow.notice(), Some(&Notice::success(ACCEPTED_MESSAGE)));
        assert_eq!(flow.pending_reset(), Some(Duration::from_secs(3)));

        let history = shop.order_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].submission_id, "5912");
        assert_eq!(history[0].order.total_amount.plain(), "108.00");
        assert_eq!(flow.gateway().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_reset_after_delay() {
        let (_, mut shop, mut flow) = setup(ScriptedGateway::accepting());
        reach_payment(&mut shop, &mut flow).await;
        flow.set_email(Some("ada@example.com".into()));
        flow.set_payment_method(PaymentMethod::Paypal);
        flow.advance(&mut shop).await.unwrap();

        let started = tokio::time::Instant::now();
        assert!(flow.await_auto_reset().await);
        assert!(started.elapsed() >= Duration::from_secs(3));

        assert_eq!(flow.step(), CheckoutStep::Cart);
        assert!(!flow.is_open());
        assert!(flow.notice().is_none());
        assert!(flow.draft().name.is_empty());
        assert!(flow.draft().address.is_empty());
        assert_eq!(flow.draft().payment_method, PaymentMethod::Paypal);
        assert!(!flow.await_auto_reset().await);
    }

    #[tokio::test]
    async fn test_back_keeps_draft() {
        let (_, mut shop, mut flow) = setup(ScriptedGateway::accepting());
        reach_payment(&mut shop, &mut flow).await;
        assert_eq!(flow.back(), CheckoutStep::Details);
        assert_eq!(flow.back(), CheckoutStep::Cart);
        assert_eq!(flow.back(), CheckoutStep::Cart);
        assert_eq!(flow.draft().name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_go_to_respects_guards() {
        let (_, mut shop, mut flow) = setup(ScriptedGateway::accepting());
        flow.open();
        assert!(!flow.go_to(CheckoutStep::Details, &shop));
        shop.add_to_cart(&seed_catalog()[0], 1);
        assert!(flow.go_to(CheckoutStep::Details, &shop));
        assert!(!flow.go_to(CheckoutStep::Payment, &shop));
        flow.set_name("Ada");
        flow.set_address("1 Loop");
        assert!(flow.go_to(CheckoutStep::Payment, &shop));
        assert!(!flow.go_to(CheckoutStep::Confirmation, &shop));
        assert!(flow.go_to(CheckoutStep::Cart, &shop));
        assert_eq!(flow.step(), CheckoutStep::Cart);
        assert_eq!(flow.gateway().calls(), 0);
        assert_eq!(flow.advance(&mut shop).await, Ok(CheckoutStep::Details));
    }

    #[tokio::test]
    async fn test_draft_survives_reload() {
        let (store, _, mut flow) = setup(ScriptedGateway::accepting());
        flow.set_name("Ada");
        flow.set_phone(Some("555-0100".into()));
        flow.set_payment_method(PaymentMethod::Paypal);

        let reloaded = CheckoutFlow::load(ScriptedGateway::accepting(), Arc::new(store.connect()), Duration::from_secs(3));
        assert_eq!(reloaded.draft().name, "Ada");
        assert_eq!(reloaded.draft().phone.as_deref(), Some("555-0100"));
        assert_eq!(reloaded.draft().payment_method, PaymentMethod::Paypal);
        assert_eq!(reloaded.step(), CheckoutStep::Cart);
    }

    #[tokio::test]
    async fn test_events_recorded() {
        let (_, mut shop, mut flow) = setup(ScriptedGateway::rejecting("nope"));
        reach_payment(&mut shop, &mut flow).await;
        flow.take_events();
        let _ = flow.advance(&mut shop).await;
        assert_eq!(flow.take_events(), vec![DomainEvent::Checkout(CheckoutEvent::OrderRejected { message: "nope".into() })]);
    }
}
