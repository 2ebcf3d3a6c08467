//! Read-only access to the time-stamped count records.
//!
//! The records live in an external document store; this crate only ever
//! aggregates them. [`RecordRepository`] is the seam between the HTTP layer
//! and whichever backend evaluates the pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RecordError;

pub mod memory;
pub mod mongo;

pub use memory::{InMemoryRecordRepository, RawRecord};
pub use mongo::MongoRecordRepository;

/// One aggregated row: a record with its counts summed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRecord {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub total_count: i64,
}

/// Resolved filter for one aggregation call.
///
/// Both ranges are open: endpoints are excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min_count: i64,
    pub max_count: i64,
}

impl RecordQuery {
    pub fn contains_date(&self, at: &DateTime<Utc>) -> bool {
        self.start < *at && *at < self.end
    }

    pub fn contains_count(&self, total: i64) -> bool {
        self.min_count < total && total < self.max_count
    }
}

/// Orders rows by `total_count`, then `key`, then `created_at`.
pub fn sort_rows(rows: &mut [CountRecord]) {
    rows.sort_by(|a, b| {
        a.total_count
            .cmp(&b.total_count)
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}

#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Run date match → count sum → count match → sort and return every row.
    ///
    /// Fails as a whole; partial results are never returned.
    async fn aggregate(&self, query: &RecordQuery) -> Result<Vec<CountRecord>, RecordError>;
}
