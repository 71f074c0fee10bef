//! User repository

use bson::{doc, DateTime, Document};
use serde::Deserialize;

use crate::db::mongo::MongoCollection;
use crate::db::repo::parse_object_id;
use crate::db::schemas::UserDoc;
use crate::types::Result;

/// Admin patch: unconditional overwrite of profile and role fields
#[derive(Debug, Clone, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: String,
    pub role: String,
    pub status: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

/// Repository for user records
#[derive(Clone)]
pub struct UserRepo {
    collection: MongoCollection<UserDoc>,
}

impl UserRepo {
    pub fn new(collection: MongoCollection<UserDoc>) -> Self {
        Self { collection }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.collection.find_one(doc! { "email": email }).await
    }

    /// Insert a new user; the unique email index rejects a concurrent
    /// duplicate with `HubError::DuplicateKey`.
    pub async fn insert(&self, mut user: UserDoc) -> Result<bson::oid::ObjectId> {
        user._id = None;
        self.collection.insert_one(user).await
    }

    /// Returning-caller path: update only the last login time
    pub async fn touch_last_login(&self, email: &str, at: DateTime) -> Result<u64> {
        let result = self
            .collection
            .update_one(
                doc! { "email": email },
                doc! { "$set": { "last_loggedIn": at } },
            )
            .await?;
        Ok(result.matched_count)
    }

    /// All users except the caller, so an admin's own record is omitted
    /// from the management list
    pub async fn list_all_except(&self, caller_email: &str) -> Result<Vec<UserDoc>> {
        self.collection
            .find_many(doc! { "email": { "$ne": caller_email } })
            .await
    }

    pub async fn patch(&self, id: &str, fields: &UserPatch) -> Result<u64> {
        let oid = parse_object_id(id)?;
        let mut set = Document::new();
        set.insert("name", fields.name.clone());
        set.insert("email", &fields.email);
        set.insert("role", &fields.role);
        set.insert("status", fields.status.clone());
        set.insert("verified", fields.verified);

        let result = self
            .collection
            .update_one(doc! { "_id": oid }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count)
    }

    pub async fn delete(&self, id: &str) -> Result<u64> {
        let oid = parse_object_id(id)?;
        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count)
    }

    pub async fn role_of(&self, email: &str) -> Result<Option<String>> {
        Ok(self.find_by_email(email).await?.map(|user| user.role))
    }
}
