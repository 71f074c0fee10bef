//! Tuition posting document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for tuition postings
pub const TUITION_COLLECTION: &str = "tuitions";

/// Lifecycle status of a tuition posting.
/// Only `Approved` postings appear on the public board.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TuitionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl TuitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

/// Tuition posting stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TuitionDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub subject: String,

    #[serde(rename = "classLevel")]
    pub class_level: String,

    pub location: String,

    pub budget: f64,

    #[serde(default)]
    pub status: TuitionStatus,

    /// Additional posting fields from the client (contact info etc.)
    #[serde(flatten)]
    pub extra: Document,
}

impl IntoIndexes for TuitionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Status index for the public board filter
            (
                doc! { "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("status_index".to_string())
                        .build(),
                ),
            ),
            // Class level filter on /all-tuitions
            (
                doc! { "classLevel": 1 },
                Some(
                    IndexOptions::builder()
                        .name("class_level_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&TuitionStatus::Approved).unwrap();
        assert_eq!(json, "\"Approved\"");

        let parsed: TuitionStatus = serde_json::from_str("\"Pending\"").unwrap();
        assert_eq!(parsed, TuitionStatus::Pending);

        // Unknown status strings are rejected, not silently accepted
        assert!(serde_json::from_str::<TuitionStatus>("\"Archived\"").is_err());
    }

    #[test]
    fn test_extra_fields_roundtrip() {
        let json = r#"{
            "subject": "Mathematics",
            "classLevel": "Class 8",
            "location": "Dhaka",
            "budget": 5000,
            "studentName": "Rahim"
        }"#;

        let doc: TuitionDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.status, TuitionStatus::Pending);
        assert_eq!(
            doc.extra.get_str("studentName").unwrap(),
            "Rahim"
        );
    }
}
