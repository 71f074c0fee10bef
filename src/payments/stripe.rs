//! Stripe checkout-session client
//!
//! Thin REST client over the Stripe API: form-encoded requests,
//! bearer-key auth, JSON responses.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::payments::{CheckoutParams, CheckoutSession, PaymentProcessor, SessionDetails};
use crate::types::{HubError, Result};

/// Stripe REST client
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(api_base: String, secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_base, path)
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_checkout(&self, params: CheckoutParams) -> Result<CheckoutSession> {
        let unit_amount = params.unit_amount.to_string();
        let form: Vec<(&str, &str)> = vec![
            ("payment_method_types[0]", "card"),
            ("line_items[0][price_data][currency]", "usd"),
            (
                "line_items[0][price_data][product_data][name]",
                &params.product_name,
            ),
            ("line_items[0][price_data][unit_amount]", &unit_amount),
            ("line_items[0][quantity]", "1"),
            ("mode", "payment"),
            ("metadata[tutorId]", &params.tutor_id),
            ("metadata[tutorEmail]", &params.tutor_email),
            ("success_url", &params.success_url),
            ("cancel_url", &params.cancel_url),
        ];

        let response = self
            .http
            .post(self.endpoint("checkout/sessions"))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Stripe checkout create failed ({}): {}", status, body);
            return Err(HubError::Payment(format!(
                "checkout session create failed with status {}",
                status
            )));
        }

        let session: CheckoutSession = response.json().await?;
        debug!("Created checkout session {}", session.id);
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails> {
        let response = self
            .http
            .get(self.endpoint(&format!("checkout/sessions/{}", session_id)))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Stripe session retrieve failed ({}): {}", status, body);
            return Err(HubError::Payment(format!(
                "session retrieve failed with status {}",
                status
            )));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_building() {
        let client = StripeClient::new("https://api.stripe.com/".into(), "sk_test".into());
        assert_eq!(
            client.endpoint("checkout/sessions"),
            "https://api.stripe.com/v1/checkout/sessions"
        );
        assert_eq!(
            client.endpoint("checkout/sessions/cs_123"),
            "https://api.stripe.com/v1/checkout/sessions/cs_123"
        );
    }

    #[test]
    fn test_session_details_parsing() {
        let json = r#"{
            "id": "cs_test_1",
            "payment_status": "paid",
            "payment_intent": "pi_123",
            "amount_total": 450050,
            "customer_details": { "email": "payer@example.com", "name": "Payer" },
            "metadata": { "tutorId": "65f1a2b3c4d5e6f7a8b9c0d1", "tutorEmail": "t@e.com" }
        }"#;

        let details: SessionDetails = serde_json::from_str(json).unwrap();
        assert!(details.is_paid());
        assert_eq!(details.payment_intent.as_deref(), Some("pi_123"));
        assert_eq!(details.amount_total, Some(450050));
        assert_eq!(
            details.metadata.get("tutorId").map(String::as_str),
            Some("65f1a2b3c4d5e6f7a8b9c0d1")
        );
    }

    #[test]
    fn test_unpaid_session() {
        let json = r#"{ "id": "cs_test_2", "payment_status": "unpaid" }"#;
        let details: SessionDetails = serde_json::from_str(json).unwrap();
        assert!(!details.is_paid());
        assert!(details.payment_intent.is_none());
        assert!(details.metadata.is_empty());
    }
}
