//! Order reconciliation workflow
//!
//! Checkout is stateless: nothing is persisted until the processor
//! confirms payment. Confirmation performs two writes (insert order,
//! promote application) that are logically one transaction. The store
//! cannot make them atomic, so convergence is kept two ways: the status
//! write is retried a bounded number of times, and a replayed
//! confirmation re-asserts the Approved status before returning the
//! existing order.

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::db::repo::{ApplicationRepo, OrderRepo};
use crate::db::schemas::{ApplicationStatus, OrderDoc};
use crate::payments::{CheckoutParams, PaymentProcessor};
use crate::types::{HubError, Result};

const STATUS_WRITE_ATTEMPTS: u32 = 3;
const STATUS_WRITE_BACKOFF: Duration = Duration::from_millis(100);

/// Client request body for POST /create-checkout-session
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCheckoutRequest {
    #[serde(rename = "tutorId")]
    pub tutor_id: Option<String>,
    #[serde(rename = "tutorEmail")]
    pub tutor_email: Option<String>,
    #[serde(rename = "expectedSalary")]
    pub expected_salary: Option<f64>,
    pub name: Option<String>,
}

/// Result of a confirmed payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// A new order was recorded and the application promoted
    Recorded { order_id: ObjectId },
    /// Idempotent replay: the transaction was already recorded
    AlreadyRecorded { order_id: ObjectId },
}

impl PaymentOutcome {
    pub fn order_id(&self) -> ObjectId {
        match self {
            Self::Recorded { order_id } | Self::AlreadyRecorded { order_id } => *order_id,
        }
    }
}

/// Order persistence seam for the workflow
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<OrderDoc>>;
    async fn insert(&self, order: OrderDoc) -> Result<ObjectId>;
}

/// Application status seam for the workflow
#[async_trait]
pub trait ApplicationStatusStore: Send + Sync {
    /// Set the status, returning the matched count (0 when absent)
    async fn set_status(&self, id: &str, status: ApplicationStatus) -> Result<u64>;
}

#[async_trait]
impl OrderStore for OrderRepo {
    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<OrderDoc>> {
        OrderRepo::find_by_transaction(self, transaction_id).await
    }

    async fn insert(&self, order: OrderDoc) -> Result<ObjectId> {
        OrderRepo::insert(self, order).await
    }
}

#[async_trait]
impl ApplicationStatusStore for ApplicationRepo {
    async fn set_status(&self, id: &str, status: ApplicationStatus) -> Result<u64> {
        self.update_status(id, status).await
    }
}

/// Checkout and payment confirmation workflow
pub struct CheckoutService {
    processor: Arc<dyn PaymentProcessor>,
    orders: Arc<dyn OrderStore>,
    applications: Arc<dyn ApplicationStatusStore>,
    client_domain: String,
}

impl CheckoutService {
    pub fn new(
        processor: Arc<dyn PaymentProcessor>,
        orders: Arc<dyn OrderStore>,
        applications: Arc<dyn ApplicationStatusStore>,
        client_domain: String,
    ) -> Self {
        Self {
            processor,
            orders,
            applications,
            client_domain: client_domain.trim_end_matches('/').to_string(),
        }
    }

    /// Open a checkout session with the processor and return the redirect
    /// URL. Nothing is persisted locally at this step.
    pub async fn initiate_checkout(&self, request: CreateCheckoutRequest) -> Result<String> {
        let tutor_id = request
            .tutor_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| HubError::BadRequest("Missing payment info".into()))?;
        let expected_salary = request
            .expected_salary
            .ok_or_else(|| HubError::BadRequest("Missing payment info".into()))?;

        let params = CheckoutParams {
            product_name: format!(
                "Tuition Payment for {}",
                request.name.as_deref().unwrap_or("tutor")
            ),
            unit_amount: checkout_amount_cents(expected_salary),
            tutor_id,
            tutor_email: request.tutor_email.unwrap_or_default(),
            // The session id comes back to /payment-success for verification
            success_url: format!(
                "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
                self.client_domain
            ),
            cancel_url: format!("{}/dashboard/applied-tutors", self.client_domain),
        };

        let session = self.processor.create_checkout(params).await?;
        session
            .url
            .ok_or_else(|| HubError::Payment("checkout session has no redirect URL".into()))
    }

    /// Verify a payment against the processor and record its order.
    ///
    /// Idempotent on the processor's payment-intent id: a replayed
    /// confirmation returns the existing order without creating a
    /// duplicate, re-asserting the application's Approved status on the
    /// way out.
    pub async fn confirm_payment(&self, session_id: &str) -> Result<PaymentOutcome> {
        let session = self.processor.retrieve_session(session_id).await?;

        if !session.is_paid() {
            return Err(HubError::PaymentNotVerified);
        }

        let transaction_id = session
            .payment_intent
            .clone()
            .ok_or_else(|| HubError::Payment("paid session has no payment intent".into()))?;

        if let Some(existing) = self.orders.find_by_transaction(&transaction_id).await? {
            let order_id = existing
                ._id
                .ok_or_else(|| HubError::Database("stored order has no id".into()))?;
            // Replay doubles as a repair pass for a confirm that recorded
            // the order but lost the status write.
            if let Err(e) = self
                .promote_application(&existing.tutor_id)
                .await
            {
                warn!(
                    "Replay repair failed for application {}: {}",
                    existing.tutor_id, e
                );
            }
            info!("Order already recorded for transaction {}", transaction_id);
            return Ok(PaymentOutcome::AlreadyRecorded { order_id });
        }

        let tutor_id = session
            .metadata
            .get("tutorId")
            .cloned()
            .ok_or_else(|| HubError::Payment("session missing tutorId metadata".into()))?;

        let customer = session.customer_details.clone().unwrap_or_default();
        let order = OrderDoc {
            _id: None,
            tutor_id: tutor_id.clone(),
            transaction_id: transaction_id.clone(),
            user_email: customer.email.unwrap_or_default(),
            user_name: customer.name.unwrap_or_else(|| "Unknown".to_string()),
            amount: session.amount_total.unwrap_or(0) as f64 / 100.0,
            status: "Paid".to_string(),
            paid_at: DateTime::now(),
        };

        let order_id = match self.orders.insert(order).await {
            Ok(id) => id,
            // Concurrent confirmation won the unique-index race; fall back
            // to the replay path.
            Err(HubError::DuplicateKey(_)) => {
                let existing = self
                    .orders
                    .find_by_transaction(&transaction_id)
                    .await?
                    .ok_or_else(|| {
                        HubError::Database("duplicate order vanished during confirm".into())
                    })?;
                let order_id = existing
                    ._id
                    .ok_or_else(|| HubError::Database("stored order has no id".into()))?;
                self.promote_application(&tutor_id).await?;
                return Ok(PaymentOutcome::AlreadyRecorded { order_id });
            }
            Err(e) => return Err(e),
        };

        self.promote_application(&tutor_id).await?;
        info!(
            "Recorded order {} for transaction {}",
            order_id, transaction_id
        );

        Ok(PaymentOutcome::Recorded { order_id })
    }

    /// Promote the linked application to Approved, retrying transient
    /// store failures. A missing application is logged, not fatal: orders
    /// have no cascading constraint on applications.
    async fn promote_application(&self, tutor_id: &str) -> Result<()> {
        let mut last_err = None;

        for attempt in 1..=STATUS_WRITE_ATTEMPTS {
            match self
                .applications
                .set_status(tutor_id, ApplicationStatus::Approved)
                .await
            {
                Ok(0) => {
                    warn!("No application {} to promote after payment", tutor_id);
                    return Ok(());
                }
                Ok(_) => return Ok(()),
                Err(e) => {
                    warn!(
                        "Application status write failed (attempt {}/{}): {}",
                        attempt, STATUS_WRITE_ATTEMPTS, e
                    );
                    last_err = Some(e);
                    if attempt < STATUS_WRITE_ATTEMPTS {
                        tokio::time::sleep(STATUS_WRITE_BACKOFF).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| HubError::Internal("status write never attempted".into())))
    }
}

/// Checkout amount in minor units
pub fn checkout_amount_cents(expected_salary: f64) -> i64 {
    (expected_salary * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::{CheckoutSession, CustomerDetails, SessionDetails};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct FakeProcessor {
        sessions: HashMap<String, SessionDetails>,
    }

    #[async_trait]
    impl PaymentProcessor for FakeProcessor {
        async fn create_checkout(&self, params: CheckoutParams) -> Result<CheckoutSession> {
            Ok(CheckoutSession {
                id: "cs_fake".into(),
                url: Some(format!(
                    "https://checkout.example/pay/{}",
                    params.unit_amount
                )),
            })
        }

        async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails> {
            self.sessions
                .get(session_id)
                .cloned()
                .ok_or_else(|| HubError::Payment("no such session".into()))
        }
    }

    #[derive(Default)]
    struct FakeOrderStore {
        orders: Mutex<Vec<OrderDoc>>,
    }

    #[async_trait]
    impl OrderStore for FakeOrderStore {
        async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<OrderDoc>> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.transaction_id == transaction_id)
                .cloned())
        }

        async fn insert(&self, mut order: OrderDoc) -> Result<ObjectId> {
            let mut orders = self.orders.lock().unwrap();
            // Simulate the unique transactionId index
            if orders
                .iter()
                .any(|o| o.transaction_id == order.transaction_id)
            {
                return Err(HubError::DuplicateKey("transactionId".into()));
            }
            let id = ObjectId::new();
            order._id = Some(id);
            orders.push(order);
            Ok(id)
        }
    }

    #[derive(Default)]
    struct FakeApplicationStore {
        statuses: Mutex<HashMap<String, ApplicationStatus>>,
        fail_times: AtomicU32,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl ApplicationStatusStore for FakeApplicationStore {
        async fn set_status(&self, id: &str, status: ApplicationStatus) -> Result<u64> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_times.load(Ordering::SeqCst) > 0 {
                self.fail_times.fetch_sub(1, Ordering::SeqCst);
                return Err(HubError::Database("transient".into()));
            }
            let mut statuses = self.statuses.lock().unwrap();
            match statuses.get_mut(id) {
                Some(current) => {
                    *current = status;
                    Ok(1)
                }
                None => Ok(0),
            }
        }
    }

    const APP_ID: &str = "65f1a2b3c4d5e6f7a8b9c0d1";

    fn paid_session() -> SessionDetails {
        SessionDetails {
            id: "cs_1".into(),
            payment_status: "paid".into(),
            payment_intent: Some("pi_1".into()),
            amount_total: Some(450050),
            customer_details: Some(CustomerDetails {
                email: Some("payer@example.com".into()),
                name: Some("Payer".into()),
            }),
            metadata: HashMap::from([
                ("tutorId".to_string(), APP_ID.to_string()),
                ("tutorEmail".to_string(), "t@e.com".to_string()),
            ]),
        }
    }

    fn unpaid_session() -> SessionDetails {
        SessionDetails {
            payment_status: "unpaid".into(),
            payment_intent: None,
            ..paid_session()
        }
    }

    fn service_with(
        session: SessionDetails,
        applications: Arc<FakeApplicationStore>,
    ) -> (CheckoutService, Arc<FakeOrderStore>) {
        let orders = Arc::new(FakeOrderStore::default());
        let processor = FakeProcessor {
            sessions: HashMap::from([(session.id.clone(), session)]),
        };
        let service = CheckoutService::new(
            Arc::new(processor),
            Arc::clone(&orders) as Arc<dyn OrderStore>,
            applications as Arc<dyn ApplicationStatusStore>,
            "https://tuitions.example".into(),
        );
        (service, orders)
    }

    fn pending_application_store() -> Arc<FakeApplicationStore> {
        let store = FakeApplicationStore::default();
        store
            .statuses
            .lock()
            .unwrap()
            .insert(APP_ID.to_string(), ApplicationStatus::Pending);
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_confirm_records_order_and_promotes_application() {
        let applications = pending_application_store();
        let (service, orders) = service_with(paid_session(), Arc::clone(&applications));

        let outcome = service.confirm_payment("cs_1").await.unwrap();
        assert!(matches!(outcome, PaymentOutcome::Recorded { .. }));

        let stored = orders.orders.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].transaction_id, "pi_1");
        assert_eq!(stored[0].amount, 4500.5);
        assert_eq!(stored[0].user_email, "payer@example.com");
        assert_eq!(stored[0].status, "Paid");

        assert_eq!(
            applications.statuses.lock().unwrap()[APP_ID],
            ApplicationStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent() {
        let applications = pending_application_store();
        let (service, orders) = service_with(paid_session(), applications);

        let first = service.confirm_payment("cs_1").await.unwrap();
        let second = service.confirm_payment("cs_1").await.unwrap();

        assert!(matches!(first, PaymentOutcome::Recorded { .. }));
        assert!(matches!(second, PaymentOutcome::AlreadyRecorded { .. }));
        assert_eq!(first.order_id(), second.order_id());
        assert_eq!(orders.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unpaid_session_is_rejected_without_writes() {
        let applications = pending_application_store();
        let (service, orders) = service_with(unpaid_session(), Arc::clone(&applications));

        let err = service.confirm_payment("cs_1").await.unwrap_err();
        assert!(matches!(err, HubError::PaymentNotVerified));

        assert!(orders.orders.lock().unwrap().is_empty());
        assert_eq!(
            applications.statuses.lock().unwrap()[APP_ID],
            ApplicationStatus::Pending
        );
        assert_eq!(applications.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_status_write_is_retried() {
        let applications = pending_application_store();
        applications.fail_times.store(2, Ordering::SeqCst);
        let (service, _orders) = service_with(paid_session(), Arc::clone(&applications));

        let outcome = service.confirm_payment("cs_1").await.unwrap();
        assert!(matches!(outcome, PaymentOutcome::Recorded { .. }));
        assert_eq!(applications.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(
            applications.statuses.lock().unwrap()[APP_ID],
            ApplicationStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_replay_repairs_lost_status_write() {
        let applications = pending_application_store();
        // All retries exhausted on the first confirm
        applications.fail_times.store(10, Ordering::SeqCst);
        let (service, orders) = service_with(paid_session(), Arc::clone(&applications));

        let err = service.confirm_payment("cs_1").await.unwrap_err();
        assert!(matches!(err, HubError::Database(_)));
        // Order was persisted before the status write failed
        assert_eq!(orders.orders.lock().unwrap().len(), 1);
        assert_eq!(
            applications.statuses.lock().unwrap()[APP_ID],
            ApplicationStatus::Pending
        );

        // Client retries once the store recovers; replay repairs the status
        applications.fail_times.store(0, Ordering::SeqCst);
        let outcome = service.confirm_payment("cs_1").await.unwrap();
        assert!(matches!(outcome, PaymentOutcome::AlreadyRecorded { .. }));
        assert_eq!(orders.orders.lock().unwrap().len(), 1);
        assert_eq!(
            applications.statuses.lock().unwrap()[APP_ID],
            ApplicationStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_initiate_checkout_validates_required_fields() {
        let applications = pending_application_store();
        let (service, _) = service_with(paid_session(), applications);

        let err = service
            .initiate_checkout(CreateCheckoutRequest {
                tutor_id: None,
                expected_salary: Some(4500.0),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::BadRequest(_)));

        let err = service
            .initiate_checkout(CreateCheckoutRequest {
                tutor_id: Some(APP_ID.into()),
                expected_salary: None,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_initiate_checkout_returns_redirect_url() {
        let applications = pending_application_store();
        let (service, _) = service_with(paid_session(), applications);

        let url = service
            .initiate_checkout(CreateCheckoutRequest {
                tutor_id: Some(APP_ID.into()),
                tutor_email: Some("t@e.com".into()),
                expected_salary: Some(45.5),
                name: Some("Tutor".into()),
            })
            .await
            .unwrap();

        // Fake processor echoes the minor-unit amount into the URL
        assert_eq!(url, "https://checkout.example/pay/4550");
    }

    #[test]
    fn test_checkout_amount_rounding() {
        assert_eq!(checkout_amount_cents(45.5), 4550);
        assert_eq!(checkout_amount_cents(4500.0), 450000);
        // 99.99 * 100 lands just under 9999 in f64; round recovers it
        assert_eq!(checkout_amount_cents(99.99), 9999);
    }
}
