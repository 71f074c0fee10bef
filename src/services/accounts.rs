//! User upsert workflow
//!
//! Insert-or-touch keyed by email. The sequence is read-then-branch-then-
//! write, so two concurrent first logins can both take the insert branch;
//! the unique email index rejects the loser, and that rejection is
//! retried as the touch-update rather than surfaced as an error.

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime, Document};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::db::repo::UserRepo;
use crate::db::schemas::UserDoc;
use crate::types::{HubError, Result};

/// Profile fields supplied by the client at login
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub verified: bool,
    /// Remaining profile fields (photo URL etc.)
    #[serde(flatten)]
    pub extra: Document,
}

/// Result of an upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First login: a new record was created
    Created(ObjectId),
    /// Returning caller: only last_loggedIn was updated
    Touched,
}

/// User persistence seam for the workflow
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>>;
    /// Must fail with `HubError::DuplicateKey` on a unique email violation
    async fn insert(&self, user: UserDoc) -> Result<ObjectId>;
    async fn touch_last_login(&self, email: &str, at: DateTime) -> Result<u64>;
}

#[async_trait]
impl UserStore for UserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        UserRepo::find_by_email(self, email).await
    }

    async fn insert(&self, user: UserDoc) -> Result<ObjectId> {
        UserRepo::insert(self, user).await
    }

    async fn touch_last_login(&self, email: &str, at: DateTime) -> Result<u64> {
        UserRepo::touch_last_login(self, email, at).await
    }
}

/// Account upsert workflow
pub struct AccountService {
    users: Arc<dyn UserStore>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Insert-or-touch keyed by email
    pub async fn upsert(&self, email: &str, profile: UserProfile) -> Result<UpsertOutcome> {
        let now = DateTime::now();

        if self.users.find_by_email(email).await?.is_some() {
            self.users.touch_last_login(email, now).await?;
            return Ok(UpsertOutcome::Touched);
        }

        let user = UserDoc {
            _id: None,
            email: email.to_string(),
            name: profile.name,
            role: profile.role.unwrap_or_else(|| "student".to_string()),
            status: profile.status,
            verified: profile.verified,
            created_at: now,
            last_logged_in: now,
            timestamp: now,
            extra: profile.extra,
        };

        match self.users.insert(user).await {
            Ok(id) => Ok(UpsertOutcome::Created(id)),
            // Concurrent first login won the insert race; treat as an
            // existing user and retry as the touch-update.
            Err(HubError::DuplicateKey(_)) => {
                debug!("Concurrent first login for {}, retrying as touch", email);
                self.users.touch_last_login(email, now).await?;
                Ok(UpsertOutcome::Touched)
            }
            Err(e) => Err(e),
        }
    }
}
