//! Payment processor integration
//!
//! The processor is an external collaborator reached over its REST API.
//! Workflows depend on the `PaymentProcessor` trait so order
//! reconciliation can be exercised with a fake processor in tests.

pub mod stripe;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::types::Result;

pub use stripe::StripeClient;

/// Session payment state the processor reports for a paid checkout
pub const PAYMENT_STATUS_PAID: &str = "paid";

/// Request to open a checkout session with the processor
#[derive(Debug, Clone)]
pub struct CheckoutParams {
    /// Display name on the processor's checkout page
    pub product_name: String,
    /// Amount in minor units (cents)
    pub unit_amount: i64,
    /// Application id carried through as opaque metadata
    pub tutor_id: String,
    /// Tutor email carried through as opaque metadata
    pub tutor_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Newly created checkout session handle
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Redirect target for the client
    pub url: Option<String>,
}

/// Authoritative session state retrieved from the processor
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDetails {
    pub id: String,
    /// "paid", "unpaid", or "no_payment_required"
    pub payment_status: String,
    /// Payment-intent id; the order dedup key
    pub payment_intent: Option<String>,
    /// Total in minor units
    pub amount_total: Option<i64>,
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl SessionDetails {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PAYMENT_STATUS_PAID
    }
}

/// Checkout-session operations against the payment processor
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Open a checkout session, returning its handle and redirect URL
    async fn create_checkout(&self, params: CheckoutParams) -> Result<CheckoutSession>;

    /// Retrieve authoritative session state. Never trust a client-supplied
    /// "paid" flag; this call is the only source of payment truth.
    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails>;
}
