//! Repository layer over the typed MongoDB collections
//!
//! One repository per collection, holding the typed collection handle
//! injected at startup. Handlers never touch raw collections directly.

mod applications;
mod orders;
mod tuitions;
mod users;

pub use applications::{ApplicationRepo, ApplicationUpdate};
pub use orders::OrderRepo;
pub use tuitions::{PageWindow, SearchParams, SortMode, TuitionRepo, TuitionUpdate};
pub use users::{UserPatch, UserRepo};

use bson::oid::ObjectId;

use crate::types::{HubError, Result};

/// Parse a hex document id from a path segment
pub fn parse_object_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| HubError::BadRequest(format!("Invalid id: {}", id)))
}
