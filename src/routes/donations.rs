use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json as AxumJson},
    Json,
};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use tokio::sync::broadcast;

use crate::db::{self, models::FESTIVALS};
use crate::error::AppError;
use crate::live::{self, DonationChange};
use crate::validation::{self, DonationForm};
use crate::AppState;

pub async fn create_donation(
    State(state): State<AppState>,
    Json(form): Json<DonationForm>,
) -> Result<impl IntoResponse, AppError> {
    // Full gate runs before anything touches the store; first failure wins
    // and nothing partial is written.
    let record = validation::canonicalize(form)?;

    let id = db::create_donation(&state.db, &record).await?;

    state.feed.publish(DonationChange {
        receipt_id: record.receipt_id.clone(),
    });

    Ok((
        StatusCode::CREATED,
        AxumJson(json!({
            "status": "created",
            "id": id,
            "receipt_id": record.receipt_id,
        })),
    ))
}

pub async fn list_donations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let donations = db::list_donations(&state.db).await?;
    Ok(AxumJson(json!({ "donations": donations })))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub donor: String,
}

pub async fn search_by_donor(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let donations = db::search_by_donor(&state.db, &params.donor).await?;
    Ok(AxumJson(json!({ "donations": donations })))
}

#[derive(Deserialize)]
pub struct RangeParams {
    pub start: String,
    pub end: String,
}

pub async fn get_by_date_range(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let donations = db::get_by_date_range(&state.db, &params.start, &params.end).await?;
    Ok(AxumJson(json!({ "donations": donations })))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let count = db::get_count(&state.db).await?;
    let total_amount = db::get_total_amount(&state.db).await?;
    let average_amount = if count == 0 {
        0
    } else {
        (total_amount / count as f64).round() as i64
    };

    Ok(AxumJson(json!({
        "count": count,
        "total_amount": total_amount,
        "average_amount": average_amount,
    })))
}

pub async fn list_festivals() -> impl IntoResponse {
    AxumJson(json!({ "festivals": FESTIVALS }))
}

/// Live view of the records screen: one full snapshot now, then one per
/// store mutation. Snapshots replace each other, so a lagged subscriber
/// just skips ahead to the current state.
pub async fn stream_donations(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.feed.subscribe();
    let pool = state.db.clone();

    let stream = async_stream::stream! {
        loop {
            match live::snapshot(&pool).await {
                Ok(snap) => match Event::default().event("snapshot").json_data(&snap) {
                    Ok(event) => yield Ok::<Event, Infallible>(event),
                    Err(e) => tracing::error!("Snapshot encode error: {}", e),
                },
                Err(e) => tracing::error!("Snapshot query error: {}", e),
            }

            match rx.recv().await {
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Snapshot subscriber lagged behind by {} changes", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
