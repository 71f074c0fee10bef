//! Order document schema
//!
//! An order is the local record of a confirmed payment. The processor's
//! payment-intent id is the dedup key: the unique index below guarantees
//! at most one order per transaction.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for orders
pub const ORDER_COLLECTION: &str = "orders";

/// Order stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Hex id of the tutor application this payment is for
    #[serde(rename = "tutorId")]
    pub tutor_id: String,

    /// Payment-intent id from the processor (unique)
    #[serde(rename = "transactionId")]
    pub transaction_id: String,

    #[serde(rename = "userEmail")]
    pub user_email: String,

    #[serde(rename = "userName")]
    pub user_name: String,

    /// Amount in dollars (processor total minor units / 100)
    pub amount: f64,

    pub status: String,

    #[serde(rename = "paidAt")]
    pub paid_at: DateTime,
}

impl IntoIndexes for OrderDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "transactionId": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("transaction_id_unique".to_string())
                        .build(),
                ),
            ),
            // Caller-scoped listing (/my-orders)
            (
                doc! { "userEmail": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_email_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
