//! Database schemas for tuition-hub
//!
//! Defines MongoDB document structures for postings, applications,
//! orders, and users.

mod application;
mod order;
mod tuition;
mod user;

pub use application::{ApplicationDoc, ApplicationStatus, APPLICATION_COLLECTION};
pub use order::{OrderDoc, ORDER_COLLECTION};
pub use tuition::{TuitionDoc, TuitionStatus, TUITION_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
