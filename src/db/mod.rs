//! MongoDB storage layer

pub mod mongo;
pub mod repo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection};
