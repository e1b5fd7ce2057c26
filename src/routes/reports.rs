use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Json as AxumJson, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::db::{self, models::Donation, DbPool};
use crate::error::AppError;
use crate::receipt;
use crate::AppState;

#[derive(Deserialize, Default)]
pub struct ReportParams {
    pub donor: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Reports run over whatever the records screen is showing: a donor search,
/// a date range, or the full list.
async fn load_filtered(pool: &DbPool, params: &ReportParams) -> anyhow::Result<Vec<Donation>> {
    if let Some(donor) = params.donor.as_deref().filter(|d| !d.trim().is_empty()) {
        return db::search_by_donor(pool, donor.trim()).await;
    }
    if let (Some(start), Some(end)) = (params.start.as_deref(), params.end.as_deref()) {
        return db::get_by_date_range(pool, start, end).await;
    }
    db::list_donations(pool).await
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        let escaped = s.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        s.to_string()
    }
}

pub async fn export_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Html<String>, AppError> {
    let donations = load_filtered(&state.db, &params).await?;
    Ok(Html(receipt::report_html(&donations)))
}

pub async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Response, AppError> {
    let donations = load_filtered(&state.db, &params).await?;

    let mut w = String::new();
    w.push_str(
        "receipt_id,donor_name,mandal_name,festival_name,amount,donation_date,donation_time,mobile_number,email\n",
    );
    for d in donations {
        let amount = format!("{}", d.amount);
        let email = d.email.clone().unwrap_or_default();
        w.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            csv_escape(&d.receipt_id),
            csv_escape(&d.donor_name),
            csv_escape(&d.mandal_name),
            csv_escape(&d.festival_name),
            csv_escape(&amount),
            csv_escape(&d.donation_date),
            csv_escape(&d.donation_time),
            csv_escape(&d.mobile_number),
            csv_escape(&email),
        ));
    }

    let mut resp = Response::new(w.into());
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=donations.csv"),
    );
    Ok(resp)
}

pub async fn report_pdf(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    let donations = load_filtered(&state.db, &params).await?;
    let file = state
        .gateways
        .render_pdf(&receipt::report_html(&donations))
        .await?;

    Ok(AxumJson(json!({ "file_url": file.url })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_escape_quotes_separators_and_quotes() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }
}
