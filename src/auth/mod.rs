//! Authentication and authorization
//!
//! Provides:
//! - Bearer credential verification against the external identity provider
//! - Role-based authorization for privileged routes

pub mod identity;
pub mod permissions;

pub use identity::{extract_bearer, Claims, IdentityVerifier, JwtIdentityVerifier, VerifiedIdentity};
pub use permissions::Role;
