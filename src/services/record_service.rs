use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RecordError;
use crate::storage::{CountRecord, RecordQuery, RecordRepository};

/// Body of `POST /records`.
///
/// Missing fields decode as empty/zero so validation can name them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordsRequest {
    pub start_date: String,
    pub end_date: String,
    pub min_count: i64,
    pub max_count: i64,
}

/// Success envelope returned by [`fetch_records`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsResponse {
    pub code: i32,
    pub msg: String,
    pub records: Vec<CountRecord>,
}

impl RecordsResponse {
    pub fn success(records: Vec<CountRecord>) -> Self {
        Self {
            code: 0,
            msg: "Success".to_string(),
            records,
        }
    }
}

/// Four digits, `-`, two digits, `-`, two digits.
fn has_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a strict `YYYY-MM-DD` date as midnight UTC.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, RecordError> {
    if !has_date_shape(raw) {
        return Err(RecordError::DateFormat);
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| RecordError::DateFormat)?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or(RecordError::DateFormat)?;
    Ok(Utc.from_utc_datetime(&midnight))
}

impl TryFrom<&RecordsRequest> for RecordQuery {
    type Error = RecordError;

    fn try_from(req: &RecordsRequest) -> Result<Self, Self::Error> {
        Ok(RecordQuery {
            start: parse_date(&req.start_date)?,
            end: parse_date(&req.end_date)?,
            min_count: req.min_count,
            max_count: req.max_count,
        })
    }
}

/// Resolve `req` and run it against `repo`.
///
/// A malformed date fails before any query is issued.
pub async fn fetch_records(
    repo: &dyn RecordRepository,
    req: &RecordsRequest,
) -> Result<RecordsResponse, RecordError> {
    let query = RecordQuery::try_from(req)?;
    let records = repo.aggregate(&query).await?;
    Ok(RecordsResponse::success(records))
}
