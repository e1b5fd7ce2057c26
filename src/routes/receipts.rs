use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Json as AxumJson},
};
use serde_json::json;

use crate::db::{self, models::Donation};
use crate::error::AppError;
use crate::receipt;
use crate::share::MailMessage;
use crate::AppState;

async fn load_by_receipt_id(state: &AppState, receipt_id: &str) -> Result<Donation, AppError> {
    db::get_by_receipt_id(&state.db, receipt_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("receipt {}", receipt_id)))
}

/// The styled receipt document itself, as served to a preview or handed to
/// the rasterizer.
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let donation = load_by_receipt_id(&state, &receipt_id).await?;
    Ok(Html(receipt::receipt_html(&donation)))
}

/// Generic share: rasterize the receipt and hand back the file reference.
pub async fn render_receipt_pdf(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let donation = load_by_receipt_id(&state, &receipt_id).await?;
    let file = state
        .gateways
        .render_pdf(&receipt::receipt_html(&donation))
        .await?;

    Ok(AxumJson(json!({ "file_url": file.url })))
}

pub async fn email_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // Check the capability up front so an unconfigured mail gateway does not
    // cost a PDF render first.
    if !state.gateways.mail_available() {
        return Err(AppError::Unavailable("Email"));
    }

    let donation = load_by_receipt_id(&state, &receipt_id).await?;
    let file = state
        .gateways
        .render_pdf(&receipt::receipt_html(&donation))
        .await?;

    let message = MailMessage {
        recipients: donation.email.iter().cloned().collect(),
        subject: receipt::email_subject(&donation),
        body: receipt::email_body(&donation),
        attachment: Some(file.url),
    };
    state.gateways.send_mail(&message).await?;

    Ok(AxumJson(json!({ "status": "sent" })))
}

pub async fn sms_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let donation = load_by_receipt_id(&state, &receipt_id).await?;

    state
        .gateways
        .send_sms(&donation.mobile_number, &receipt::sms_text(&donation))
        .await?;

    Ok(AxumJson(json!({ "status": "sent" })))
}
