use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    options::ClientOptions,
    Client, Collection,
};
use serde::Deserialize;

use super::{CountRecord, RecordQuery, RecordRepository};
use crate::errors::RecordError;

/// How long startup waits for the server to answer a ping.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Aggregates records stored in a MongoDB collection.
#[derive(Clone)]
pub struct MongoRecordRepository {
    collection: Collection<Document>,
}

/// Row shape produced by the `$project` stage.
#[derive(Debug, Deserialize)]
struct ProjectedRecord {
    key: String,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
    #[serde(rename = "totalCount")]
    total_count: Bson,
}

/// `$sum` yields Int32, Int64 or Double depending on the stored counts.
/// Whole-number doubles are accepted; fractions are a decode error.
fn whole_count(value: &Bson) -> Result<i64, RecordError> {
    match *value {
        Bson::Int32(n) => Ok(i64::from(n)),
        Bson::Int64(n) => Ok(n),
        Bson::Double(f)
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 =>
        {
            Ok(f as i64)
        }
        ref other => Err(RecordError::Decode(format!(
            "totalCount is not a whole number: {other}"
        ))),
    }
}

impl ProjectedRecord {
    fn into_record(self) -> Result<CountRecord, RecordError> {
        let millis = self.created_at.timestamp_millis();
        let created_at = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| RecordError::Decode(format!("createdAt out of range: {millis}")))?;

        Ok(CountRecord {
            key: self.key,
            created_at,
            total_count: whole_count(&self.total_count)?,
        })
    }
}

impl MongoRecordRepository {
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    /// Connect and ping; an unreachable server is an error.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, RecordError> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        tokio::time::timeout(
            CONNECT_TIMEOUT,
            client.database("admin").run_command(doc! { "ping": 1 }, None),
        )
        .await
        .map_err(|_| RecordError::Timeout(CONNECT_TIMEOUT))??;

        tracing::info!("Connected to MongoDB ({database}.{collection})");

        Ok(Self::new(
            client.database(database).collection::<Document>(collection),
        ))
    }

    async fn run(&self, query: &RecordQuery) -> Result<Vec<CountRecord>, RecordError> {
        let mut cursor = self.collection.aggregate(pipeline(query), None).await?;

        let mut rows = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            let row: ProjectedRecord = bson::from_document(document)?;
            rows.push(row.into_record()?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl RecordRepository for MongoRecordRepository {
    async fn aggregate(&self, query: &RecordQuery) -> Result<Vec<CountRecord>, RecordError> {
        self.run(query).await.map_err(|e| {
            tracing::error!(error = %e, "Record aggregation failed");
            e
        })
    }
}

fn to_bson_date(at: &DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

/// The four aggregation stages for `query`.
pub fn pipeline(query: &RecordQuery) -> Vec<Document> {
    vec![
        doc! {
            "$match": {
                "createdAt": {
                    "$gt": to_bson_date(&query.start),
                    "$lt": to_bson_date(&query.end)
                }
            }
        },
        doc! {
            "$project": {
                "_id": 0,
                "key": "$key",
                "createdAt": "$createdAt",
                "totalCount": { "$sum": "$counts" }
            }
        },
        doc! {
            "$match": {
                "totalCount": {
                    "$gt": query.min_count,
                    "$lt": query.max_count
                }
            }
        },
        doc! {
            "$sort": { "totalCount": 1, "key": 1, "createdAt": 1 }
        },
    ]
}
