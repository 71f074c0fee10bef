//! User document schema
//!
//! Users are keyed by email (unique index). The upsert workflow in
//! `services::accounts` relies on that index to resolve concurrent
//! first-login races.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User record stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Unique key
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Role string as stored ("student", "tutor", "admin")
    #[serde(default = "default_role")]
    pub role: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default)]
    pub verified: bool,

    pub created_at: DateTime,

    #[serde(rename = "last_loggedIn")]
    pub last_logged_in: DateTime,

    pub timestamp: DateTime,

    /// Additional profile fields from the client (photo URL etc.)
    #[serde(flatten)]
    pub extra: Document,
}

fn default_role() -> String {
    "student".to_string()
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_logged_in_wire_name() {
        let user = UserDoc {
            _id: None,
            email: "a@b.c".into(),
            name: Some("A".into()),
            role: "student".into(),
            status: None,
            verified: false,
            created_at: DateTime::now(),
            last_logged_in: DateTime::now(),
            timestamp: DateTime::now(),
            extra: Document::new(),
        };

        let value = bson::to_document(&user).unwrap();
        assert!(value.contains_key("last_loggedIn"));
        assert!(!value.contains_key("last_logged_in"));
    }
}
