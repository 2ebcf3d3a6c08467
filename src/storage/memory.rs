use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{sort_rows, CountRecord, RecordQuery, RecordRepository};
use crate::errors::RecordError;

/// A stored record before aggregation.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub counts: Vec<i64>,
}

impl RawRecord {
    pub fn new(key: impl Into<String>, created_at: DateTime<Utc>, counts: Vec<i64>) -> Self {
        Self {
            key: key.into(),
            created_at,
            counts,
        }
    }
}

/// Evaluates the aggregation in process over a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordRepository {
    records: Vec<RawRecord>,
}

impl InMemoryRecordRepository {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn aggregate(&self, query: &RecordQuery) -> Result<Vec<CountRecord>, RecordError> {
        let mut rows: Vec<CountRecord> = self
            .records
            .iter()
            .filter(|r| query.contains_date(&r.created_at))
            .map(|r| CountRecord {
                key: r.key.clone(),
                created_at: r.created_at,
                total_count: r.counts.iter().sum(),
            })
            .filter(|r| query.contains_count(r.total_count))
            .collect();

        sort_rows(&mut rows);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn repo() -> InMemoryRecordRepository {
        InMemoryRecordRepository::new(vec![
            RawRecord::new("on-start", day(2016, 1, 1), vec![50]),
            RawRecord::new("on-end", day(2017, 1, 1), vec![50]),
            RawRecord::new("b", day(2016, 3, 1), vec![30, 20]),
            RawRecord::new("a", day(2016, 4, 1), vec![25, 25]),
            RawRecord::new("low", day(2016, 5, 1), vec![10]),
            RawRecord::new("at-min", day(2016, 5, 2), vec![5, 5, 10]),
            RawRecord::new("at-max", day(2016, 5, 3), vec![100]),
            RawRecord::new("mid", day(2016, 6, 1), vec![1, 2, 3, 40]),
        ])
    }

    fn query() -> RecordQuery {
        RecordQuery {
            start: day(2016, 1, 1),
            end: day(2017, 1, 1),
            min_count: 20,
            max_count: 100,
        }
    }

    #[tokio::test]
    async fn applies_windows_and_sorts_ascending() {
        let rows = repo().aggregate(&query()).await.unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();

        assert_eq!(keys, vec!["mid", "a", "b"]);
        assert_eq!(rows[0].total_count, 46);
        assert!(rows.windows(2).all(|w| w[0].total_count <= w[1].total_count));
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let q = RecordQuery {
            min_count: 1000,
            max_count: 2000,
            ..query()
        };
        assert!(repo().aggregate(&q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn records_without_counts_sum_to_zero() {
        let repo = InMemoryRecordRepository::new(vec![RawRecord::new("none", day(2016, 2, 1), vec![])]);
        let q = RecordQuery {
            min_count: -1,
            max_count: 1,
            ..query()
        };

        let rows = repo.aggregate(&q).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_count, 0);
    }
}
