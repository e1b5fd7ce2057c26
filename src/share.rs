use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("{0}")]
    Unavailable(&'static str),

    #[error("upstream service returned {0}")]
    UpstreamStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// File reference handed back by the HTML-to-PDF service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRef {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachment: Option<String>,
}

/// Outbound clients for the document renderer and the share sinks. Each
/// capability is optional; callers must treat a missing endpoint as a
/// user-visible "not available" condition, never a crash.
#[derive(Clone)]
pub struct Gateways {
    http: reqwest::Client,
    pdf_url: Option<String>,
    mail_url: Option<String>,
    sms_url: Option<String>,
}

fn endpoint(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl Gateways {
    pub fn from_env() -> Self {
        Self {
            http: reqwest::Client::new(),
            pdf_url: endpoint("PDF_SERVICE_URL"),
            mail_url: endpoint("MAIL_GATEWAY_URL"),
            sms_url: endpoint("SMS_GATEWAY_URL"),
        }
    }

    #[cfg(test)]
    pub fn disconnected() -> Self {
        Self {
            http: reqwest::Client::new(),
            pdf_url: None,
            mail_url: None,
            sms_url: None,
        }
    }

    pub fn pdf_available(&self) -> bool {
        self.pdf_url.is_some()
    }

    pub fn mail_available(&self) -> bool {
        self.mail_url.is_some()
    }

    pub fn sms_available(&self) -> bool {
        self.sms_url.is_some()
    }

    /// Hands the markup to the external rasterizer and returns its file
    /// reference.
    pub async fn render_pdf(&self, html: &str) -> Result<FileRef, ShareError> {
        let url = self
            .pdf_url
            .as_deref()
            .ok_or(ShareError::Unavailable("PDF rendering"))?;

        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({ "html": html }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ShareError::UpstreamStatus(resp.status()));
        }

        Ok(resp.json().await?)
    }

    pub async fn send_mail(&self, message: &MailMessage) -> Result<(), ShareError> {
        let url = self
            .mail_url
            .as_deref()
            .ok_or(ShareError::Unavailable("Email"))?;

        let resp = self.http.post(url).json(message).send().await?;
        if !resp.status().is_success() {
            return Err(ShareError::UpstreamStatus(resp.status()));
        }

        Ok(())
    }

    pub async fn send_sms(&self, to: &str, body: &str) -> Result<(), ShareError> {
        let url = self
            .sms_url
            .as_deref()
            .ok_or(ShareError::Unavailable("SMS"))?;

        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({ "to": to, "body": body }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ShareError::UpstreamStatus(resp.status()));
        }

        Ok(())
    }
}
