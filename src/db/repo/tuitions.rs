//! Tuition posting repository
//!
//! Filter, sort, and pagination documents are built by pure functions so the
//! query shapes are unit-testable without a running MongoDB.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::FindOptions;
use serde::Deserialize;

use crate::db::mongo::MongoCollection;
use crate::db::repo::parse_object_id;
use crate::db::schemas::{TuitionDoc, TuitionStatus};
use crate::types::Result;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;

/// Sort modes for the search listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    BudgetLow,
    BudgetHigh,
    Newest,
    #[default]
    None,
}

impl SortMode {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("budgetLow") => Self::BudgetLow,
            Some("budgetHigh") => Self::BudgetHigh,
            Some("newest") => Self::Newest,
            _ => Self::None,
        }
    }
}

/// Search/filter parameters for `/all-tuitions`
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    /// Case-insensitive substring match on subject
    pub subject: Option<String>,
    /// Exact match on class level
    pub class_level: Option<String>,
    /// Case-insensitive substring match on location
    pub location: Option<String>,
    pub sort: SortMode,
}

/// Resolved pagination window for `/tuitions-listing`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub size: i64,
    pub skip: u64,
}

impl PageWindow {
    /// Resolve raw query values; absent or non-numeric values fall back
    /// to page 1 / size 10.
    pub fn resolve(page: Option<&str>, size: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let size = size
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|s| *s >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            page,
            size,
            // Query values are client-controlled; saturate rather than
            // overflow on absurd page numbers.
            skip: (page - 1).saturating_mul(size as u64),
        }
    }
}

/// Build the filter document for a search listing
pub fn search_filter(params: &SearchParams) -> Document {
    let mut filter = Document::new();

    if let Some(subject) = params.subject.as_deref().filter(|s| !s.is_empty()) {
        filter.insert("subject", doc! { "$regex": subject, "$options": "i" });
    }
    if let Some(class_level) = params.class_level.as_deref().filter(|c| !c.is_empty()) {
        filter.insert("classLevel", class_level);
    }
    if let Some(location) = params.location.as_deref().filter(|l| !l.is_empty()) {
        filter.insert("location", doc! { "$regex": location, "$options": "i" });
    }

    filter
}

/// Build the sort document for a search listing.
/// "newest" sorts on `_id` descending: ObjectIds are creation-ordered.
pub fn search_sort(mode: SortMode) -> Option<Document> {
    match mode {
        SortMode::BudgetLow => Some(doc! { "budget": 1 }),
        SortMode::BudgetHigh => Some(doc! { "budget": -1 }),
        SortMode::Newest => Some(doc! { "_id": -1 }),
        SortMode::None => None,
    }
}

/// Fields a posting owner may update
#[derive(Debug, Clone, Deserialize)]
pub struct TuitionUpdate {
    pub subject: String,
    #[serde(rename = "classLevel")]
    pub class_level: String,
    pub location: String,
    pub budget: f64,
}

/// Repository for tuition postings
#[derive(Clone)]
pub struct TuitionRepo {
    collection: MongoCollection<TuitionDoc>,
}

impl TuitionRepo {
    pub fn new(collection: MongoCollection<TuitionDoc>) -> Self {
        Self { collection }
    }

    /// Create a posting. Status is forced to Pending so only
    /// admin-approved postings reach the public board.
    pub async fn create(&self, mut posting: TuitionDoc) -> Result<ObjectId> {
        posting._id = None;
        posting.status = TuitionStatus::Pending;
        self.collection.insert_one(posting).await
    }

    pub async fn list_all(&self) -> Result<Vec<TuitionDoc>> {
        self.collection.find_many(Document::new()).await
    }

    /// Approved-only listing for the public board
    pub async fn list_approved(&self) -> Result<Vec<TuitionDoc>> {
        self.collection
            .find_many(doc! { "status": TuitionStatus::Approved.as_str() })
            .await
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Vec<TuitionDoc>> {
        let filter = search_filter(params);

        match search_sort(params.sort) {
            Some(sort) => {
                let options = FindOptions::builder().sort(sort).build();
                self.collection.find_with_options(filter, options).await
            }
            None => self.collection.find_many(filter).await,
        }
    }

    /// The `n` most recently created postings
    pub async fn list_latest(&self, n: i64) -> Result<Vec<TuitionDoc>> {
        let options = FindOptions::builder()
            .sort(doc! { "_id": -1 })
            .limit(n)
            .build();
        self.collection
            .find_with_options(Document::new(), options)
            .await
    }

    /// Paginated listing, newest first, with total count
    pub async fn list_page(&self, window: PageWindow) -> Result<(Vec<TuitionDoc>, u64)> {
        let total_count = self.collection.count_documents(Document::new()).await?;

        let options = FindOptions::builder()
            .sort(doc! { "_id": -1 })
            .skip(window.skip)
            .limit(window.size)
            .build();
        let items = self
            .collection
            .find_with_options(Document::new(), options)
            .await?;

        Ok((items, total_count))
    }

    /// Update posting fields, returning the matched count (0 when absent)
    pub async fn update(&self, id: &str, fields: &TuitionUpdate) -> Result<u64> {
        let oid = parse_object_id(id)?;
        let update = doc! {
            "$set": {
                "subject": &fields.subject,
                "classLevel": &fields.class_level,
                "location": &fields.location,
                "budget": fields.budget,
            }
        };

        let result = self.collection.update_one(doc! { "_id": oid }, update).await?;
        Ok(result.matched_count)
    }

    pub async fn update_status(&self, id: &str, status: TuitionStatus) -> Result<u64> {
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

    /// Delete by id, returning the deleted count (0 when absent)
    pub async fn delete(&self, id: &str) -> Result<u64> {
        let oid = parse_object_id(id)?;
        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults() {
        let window = PageWindow::resolve(None, None);
        assert_eq!(window.page, 1);
        assert_eq!(window.size, 10);
        assert_eq!(window.skip, 0);

        // Non-numeric values fall back to defaults
        let window = PageWindow::resolve(Some("abc"), Some("xyz"));
        assert_eq!(window.page, 1);
        assert_eq!(window.size, 10);

        // Zero is not a usable page or size
        let window = PageWindow::resolve(Some("0"), Some("0"));
        assert_eq!(window.page, 1);
        assert_eq!(window.size, 10);

        // Absurd page numbers saturate instead of overflowing the skip
        let window = PageWindow::resolve(Some("18446744073709551615"), Some("10"));
        assert_eq!(window.page, u64::MAX);
        assert_eq!(window.skip, u64::MAX);
    }

    #[test]
    fn test_page_window_skip_math() {
        // Page 2 of size 10 covers items 11-20
        let window = PageWindow::resolve(Some("2"), Some("10"));
        assert_eq!(window.skip, 10);
        assert_eq!(window.size, 10);

        let window = PageWindow::resolve(Some("3"), Some("7"));
        assert_eq!(window.skip, 14);
    }

    #[test]
    fn test_search_filter_case_insensitive() {
        let params = SearchParams {
            subject: Some("math".into()),
            class_level: None,
            location: Some("dhaka".into()),
            sort: SortMode::None,
        };
        let filter = search_filter(&params);

        let subject = filter.get_document("subject").unwrap();
        assert_eq!(subject.get_str("$regex").unwrap(), "math");
        assert_eq!(subject.get_str("$options").unwrap(), "i");

        let location = filter.get_document("location").unwrap();
        assert_eq!(location.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_search_filter_exact_class_level() {
        let params = SearchParams {
            class_level: Some("Class 8".into()),
            ..Default::default()
        };
        let filter = search_filter(&params);
        assert_eq!(filter.get_str("classLevel").unwrap(), "Class 8");
    }

    #[test]
    fn test_search_filter_empty_params() {
        let filter = search_filter(&SearchParams::default());
        assert!(filter.is_empty());

        // Empty strings are treated as absent filters
        let params = SearchParams {
            subject: Some(String::new()),
            ..Default::default()
        };
        assert!(search_filter(&params).is_empty());
    }

    #[test]
    fn test_search_sort_modes() {
        assert_eq!(search_sort(SortMode::BudgetLow), Some(doc! { "budget": 1 }));
        assert_eq!(search_sort(SortMode::BudgetHigh), Some(doc! { "budget": -1 }));
        assert_eq!(search_sort(SortMode::Newest), Some(doc! { "_id": -1 }));
        assert_eq!(search_sort(SortMode::None), None);
    }

    #[test]
    fn test_sort_mode_parse() {
        assert_eq!(SortMode::parse(Some("budgetLow")), SortMode::BudgetLow);
        assert_eq!(SortMode::parse(Some("budgetHigh")), SortMode::BudgetHigh);
        assert_eq!(SortMode::parse(Some("newest")), SortMode::Newest);
        assert_eq!(SortMode::parse(Some("oldest")), SortMode::None);
        assert_eq!(SortMode::parse(None), SortMode::None);
    }
}
