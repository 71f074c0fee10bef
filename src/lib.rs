//! tuition-hub - REST backend for the tuition marketplace
//!
//! Tuition postings, tutor applications, user accounts, and payment
//! checkout over MongoDB, with JWT bearer identity from an external
//! provider and Stripe checkout sessions for payments.
//!
//! ## Services
//!
//! - **Postings**: public board, search/sort, pagination, admin approval
//! - **Applications**: tutor submissions with a Pending/Approved/Rejected lifecycle
//! - **Checkout**: stateless session creation, idempotent payment confirmation
//! - **Accounts**: email-keyed user upsert and role-gated management

pub mod auth;
pub mod config;
pub mod db;
pub mod payments;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{HubError, Result};
