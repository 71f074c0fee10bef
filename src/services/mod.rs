//! Domain workflows
//!
//! The two sequences with actual ordering requirements live here:
//! payment confirmation (order reconciliation) and the email-keyed user
//! upsert. Everything else is a direct repository call from a route.

pub mod accounts;
pub mod checkout;

pub use accounts::{AccountService, UpsertOutcome, UserProfile, UserStore};
pub use checkout::{
    ApplicationStatusStore, CheckoutService, CreateCheckoutRequest, OrderStore, PaymentOutcome,
};
