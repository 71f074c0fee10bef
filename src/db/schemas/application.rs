//! Tutor application document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for tutor applications
pub const APPLICATION_COLLECTION: &str = "applications";

/// Application lifecycle: Pending until an admin approves/rejects,
/// or until a confirmed payment promotes it to Approved.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

/// Tutor application stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApplicationDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(rename = "tutorEmail")]
    pub tutor_email: String,

    #[serde(default)]
    pub qualifications: String,

    #[serde(default)]
    pub experience: String,

    #[serde(rename = "expectedSalary")]
    pub expected_salary: f64,

    #[serde(default)]
    pub status: ApplicationStatus,

    /// Set by the repository at creation time
    #[serde(rename = "appliedAt", skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime>,

    /// Additional application fields from the client (tuition ref, tutor name etc.)
    #[serde(flatten)]
    pub extra: Document,
}

impl IntoIndexes for ApplicationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Caller-scoped listing (/my-ongoing-tuitions, /applications/{email})
            (
                doc! { "tutorEmail": 1 },
                Some(
                    IndexOptions::builder()
                        .name("tutor_email_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("status_index".to_string())
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
    fn test_wire_field_names() {
        let json = r#"{
            "tutorEmail": "tutor@example.com",
            "qualifications": "BSc",
            "experience": "3 years",
            "expectedSalary": 4500.5,
            "tuitionId": "abc123"
        }"#;

        let doc: ApplicationDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.tutor_email, "tutor@example.com");
        assert_eq!(doc.expected_salary, 4500.5);
        assert_eq!(doc.status, ApplicationStatus::Pending);
        assert_eq!(doc.extra.get_str("tuitionId").unwrap(), "abc123");

        let out = serde_json::to_value(&doc).unwrap();
        assert!(out.get("tutorEmail").is_some());
        assert!(out.get("expectedSalary").is_some());
    }
}
