//! Role-based authorization
//!
//! Roles are stored on the user record and loaded per request. Ordering
//! matters: a higher role may do everything a lower one can.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles a user record may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student = 0,
    Tutor = 1,
    Admin = 2,
}

impl Role {
    /// Parse a stored role string. Unknown or missing roles degrade to
    /// Student, never to a privileged role.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.to_ascii_lowercase()).as_deref() {
            Some("admin") => Self::Admin,
            Some("tutor") => Self::Tutor,
            _ => Self::Student,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Tutor => write!(f, "tutor"),
            Role::Admin => write!(f, "admin"),
        }
    }
}
