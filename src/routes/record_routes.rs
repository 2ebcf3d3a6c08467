use std::sync::Arc;

use axum::{body::Bytes, extract::State, routing::post, Json, Router};

use crate::errors::ApiError;
use crate::services::record_service::{self, RecordsRequest, RecordsResponse};
use crate::storage::RecordRepository;

pub fn routes(records: Arc<dyn RecordRepository>) -> Router {
    Router::new()
        .route("/records", post(fetch_records))
        .with_state(records)
}

/// Checked in the same order the messages are documented.
fn validate(req: &RecordsRequest) -> Result<(), ApiError> {
    if req.start_date.is_empty() {
        return Err(ApiError::StartDateRequired);
    }
    if req.end_date.is_empty() {
        return Err(ApiError::EndDateRequired);
    }
    if req.max_count <= 0 {
        return Err(ApiError::MaxCountRequired);
    }
    if req.min_count <= 0 {
        return Err(ApiError::MinCountRequired);
    }
    Ok(())
}

//
// ─────────────────────────────────────────────────────────────
// POST /records
// Aggregate count records inside a date and count window
// ─────────────────────────────────────────────────────────────
//
async fn fetch_records(
    State(records): State<Arc<dyn RecordRepository>>,
    body: Bytes,
) -> Result<Json<RecordsResponse>, ApiError>
{
    let req: RecordsRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::InvalidPayload)?;
    validate(&req)?;

    let resp = record_service::fetch_records(records.as_ref(), &req).await?;
    Ok(Json(resp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RecordsRequest {
        RecordsRequest {
            start_date: "2016-05-26".into(),
            end_date: "2020-02-02".into(),
            min_count: 2700,
            max_count: 3000,
        }
    }

    #[test]
    fn accepts_complete_request() {
        assert!(validate(&valid()).is_ok());
    }

    #[test]
    fn reports_first_missing_field() {
        assert!(matches!(
            validate(&RecordsRequest::default()),
            Err(ApiError::StartDateRequired)
        ));

        let req = RecordsRequest { end_date: String::new(), ..valid() };
        assert!(matches!(validate(&req), Err(ApiError::EndDateRequired)));

        let req = RecordsRequest { max_count: 0, min_count: 0, ..valid() };
        assert!(matches!(validate(&req), Err(ApiError::MaxCountRequired)));

        let req = RecordsRequest { min_count: -3, ..valid() };
        assert!(matches!(validate(&req), Err(ApiError::MinCountRequired)));
    }
}
