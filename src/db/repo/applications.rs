//! Tutor application repository

use bson::{doc, oid::ObjectId, DateTime, Document};
use serde::Deserialize;

use crate::db::mongo::MongoCollection;
use crate::db::repo::parse_object_id;
use crate::db::schemas::{ApplicationDoc, ApplicationStatus};
use crate::types::Result;

/// Fields a tutor may edit while the application is still Pending
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationUpdate {
    pub qualifications: String,
    pub experience: String,
    #[serde(rename = "expectedSalary")]
    pub expected_salary: f64,
}

/// Filter for a conditional edit: matches only while still Pending, so a
/// concurrent approve/reject cannot interleave between check and write
pub fn pending_edit_filter(oid: ObjectId) -> Document {
    doc! {
        "_id": oid,
        "status": ApplicationStatus::Pending.as_str(),
    }
}

/// `$set` document for the tutor-editable fields
pub fn edit_update(fields: &ApplicationUpdate) -> Document {
    doc! {
        "$set": {
            "qualifications": &fields.qualifications,
            "experience": &fields.experience,
            "expectedSalary": fields.expected_salary,
        }
    }
}

/// Repository for tutor applications
#[derive(Clone)]
pub struct ApplicationRepo {
    collection: MongoCollection<ApplicationDoc>,
}

impl ApplicationRepo {
    pub fn new(collection: MongoCollection<ApplicationDoc>) -> Self {
        Self { collection }
    }

    /// Create an application. Status and appliedAt are set here, not
    /// taken from the client.
    pub async fn create(&self, mut application: ApplicationDoc) -> Result<ObjectId> {
        application._id = None;
        application.status = ApplicationStatus::Pending;
        application.applied_at = Some(DateTime::now());
        self.collection.insert_one(application).await
    }

    pub async fn list_all(&self) -> Result<Vec<ApplicationDoc>> {
        self.collection.find_many(Document::new()).await
    }

    pub async fn list_by_tutor_email(&self, email: &str) -> Result<Vec<ApplicationDoc>> {
        self.collection.find_many(doc! { "tutorEmail": email }).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ApplicationDoc>> {
        let oid = parse_object_id(id)?;
        self.collection.find_one(doc! { "_id": oid }).await
    }

    /// Conditional edit: the Pending check is part of the update filter,
    /// so the store evaluates condition and mutation atomically.
    /// Returns the matched count: 0 means absent or no longer Pending.
    pub async fn update_if_pending(&self, id: &str, fields: &ApplicationUpdate) -> Result<u64> {
        let oid = parse_object_id(id)?;
        let result = self
            .collection
            .update_one(pending_edit_filter(oid), edit_update(fields))
            .await?;
        Ok(result.matched_count)
    }

    /// Unconditional status transition (admin approve/reject, payment promotion)
    pub async fn update_status(&self, id: &str, status: ApplicationStatus) -> Result<u64> {
        let oid = parse_object_id(id)?;
        let result = self
            .collection
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "status": status.as_str() } },
            )
            .await?;
        Ok(result.matched_count)
    }

    pub async fn delete(&self, id: &str) -> Result<u64> {
        let oid = parse_object_id(id)?;
        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_fields() -> ApplicationUpdate {
        ApplicationUpdate {
            qualifications: "MSc".into(),
            experience: "5 years".into(),
            expected_salary: 6000.0,
        }
    }

    #[test]
    fn test_pending_edit_filter_requires_pending_status() {
        let oid = ObjectId::new();
        let filter = pending_edit_filter(oid);

        // Both conditions travel in one filter, so a document that has
        // already been approved or rejected matches nothing.
        assert_eq!(filter.get_object_id("_id").unwrap(), oid);
        assert_eq!(filter.get_str("status").unwrap(), "Pending");
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_edit_update_touches_only_editable_fields() {
        let update = edit_update(&update_fields());
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_str("qualifications").unwrap(), "MSc");
        assert_eq!(set.get_str("experience").unwrap(), "5 years");
        assert_eq!(set.get_f64("expectedSalary").unwrap(), 6000.0);
        // Status and tutorEmail are never client-editable through this path
        assert!(!set.contains_key("status"));
        assert!(!set.contains_key("tutorEmail"));
        assert_eq!(set.len(), 3);
    }
}
