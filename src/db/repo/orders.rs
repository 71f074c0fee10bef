//! Order repository

use bson::{doc, oid::ObjectId, Document};

use crate::db::mongo::MongoCollection;
use crate::db::schemas::OrderDoc;
use crate::types::Result;

/// Repository for confirmed-payment orders
#[derive(Clone)]
pub struct OrderRepo {
    collection: MongoCollection<OrderDoc>,
}

impl OrderRepo {
    pub fn new(collection: MongoCollection<OrderDoc>) -> Self {
        Self { collection }
    }

    /// Insert an order. The unique transactionId index rejects a
    /// concurrent duplicate with `HubError::DuplicateKey`.
    pub async fn insert(&self, mut order: OrderDoc) -> Result<ObjectId> {
        order._id = None;
        self.collection.insert_one(order).await
    }

    pub async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<OrderDoc>> {
        self.collection
            .find_one(doc! { "transactionId": transaction_id })
            .await
    }

    pub async fn list_by_user_email(&self, email: &str) -> Result<Vec<OrderDoc>> {
        self.collection.find_many(doc! { "userEmail": email }).await
    }

    pub async fn list_all(&self) -> Result<Vec<OrderDoc>> {
        self.collection.find_many(Document::new()).await
    }
}
