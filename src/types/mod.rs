//! Shared types for tuition-hub

mod error;

pub use error::{HubError, Result};
