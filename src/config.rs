//! Configuration for tuition-hub
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// tuition-hub - REST backend for the tuition marketplace
#[derive(Parser, Debug, Clone)]
#[command(name = "tuition-hub")]
#[command(about = "Tuition marketplace backend: postings, applications, checkout")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "tuitionsDB")]
    pub mongodb_db: String,

    /// Shared secret for verifying identity-provider bearer tokens (HS256)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Payment processor secret key
    #[arg(long, env = "STRIPE_SECRET_KEY")]
    pub stripe_secret_key: Option<String>,

    /// Payment processor API base URL (overridable for testing)
    #[arg(long, env = "STRIPE_API_BASE", default_value = "https://api.stripe.com")]
    pub stripe_api_base: String,

    /// Frontend origin, used for CORS and checkout redirect URLs
    #[arg(long, env = "CLIENT_DOMAIN", default_value = "http://localhost:5173")]
    pub client_domain: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration, returning a human-readable error message
    pub fn validate(&self) -> Result<(), String> {
        match &self.jwt_secret {
            None => return Err("JWT_SECRET is required".to_string()),
            Some(secret) if secret.len() < 32 => {
                return Err("JWT_SECRET must be at least 32 characters".to_string());
            }
            _ => {}
        }

        match &self.stripe_secret_key {
            None => return Err("STRIPE_SECRET_KEY is required".to_string()),
            Some(key) if key.is_empty() => {
                return Err("STRIPE_SECRET_KEY must not be empty".to_string());
            }
            _ => {}
        }

        if self.client_domain.is_empty() {
            return Err("CLIENT_DOMAIN must not be empty".to_string());
        }

        Ok(())
    }
}
