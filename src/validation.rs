use chrono::Local;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::OnceLock;

use crate::db::models::NewDonation;
use crate::receipt::generate_receipt_id;

pub const MOBILE_NUMBER_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// The raw submission payload, before any gate has run.
#[derive(Debug, Deserialize)]
pub struct DonationForm {
    pub mandal_name: String,
    pub donor_name: String,
    pub amount: f64,
    pub mobile_number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub festival_name: Option<String>,
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_amount(amount: f64) -> ValidationResult {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::new(
            "amount",
            "must be a number greater than zero",
        ));
    }

    Ok(())
}

pub fn validate_mobile_number(mobile: &str) -> ValidationResult {
    if mobile.len() != MOBILE_NUMBER_LEN || !mobile.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new(
            "mobile_number",
            format!("must be exactly {} digits", MOBILE_NUMBER_LEN),
        ));
    }

    Ok(())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Runs the submission gate in order (first failure wins) and assembles the
/// canonical record: date and time stamped from the local clock, a fresh
/// receipt id, festival carried through as selected.
pub fn canonicalize(form: DonationForm) -> Result<NewDonation, ValidationError> {
    let donor_name = form.donor_name.trim().to_string();
    let mobile_number = form.mobile_number.trim().to_string();
    let mandal_name = form.mandal_name.trim().to_string();

    validate_required("donor_name", &donor_name)?;
    validate_required("mobile_number", &mobile_number)?;
    validate_amount(form.amount)?;
    validate_mobile_number(&mobile_number)?;
    validate_required("mandal_name", &mandal_name)?;

    let email = form
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    if let Some(ref email) = email {
        if !is_valid_email(email) {
            return Err(ValidationError::new("email", "must be a valid email address"));
        }
    }

    let now = Local::now();

    Ok(NewDonation {
        mandal_name,
        donor_name,
        amount: form.amount,
        mobile_number,
        email,
        donation_date: now.format("%Y-%m-%d").to_string(),
        donation_time: now.format("%H:%M:%S").to_string(),
        receipt_id: generate_receipt_id(),
        festival_name: form
            .festival_name
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> DonationForm {
        DonationForm {
            mandal_name: "Shree Ganesh Mandal".to_string(),
            donor_name: "Asha Patel".to_string(),
            amount: 500.0,
            mobile_number: "9876543210".to_string(),
            email: None,
            festival_name: Some("Ganpati Festival".to_string()),
        }
    }

    #[test]
    fn validates_required_field() {
        assert!(validate_required("donor_name", "Asha").is_ok());
        assert!(validate_required("donor_name", "   ").is_err());
        assert!(validate_required("donor_name", "").is_err());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(validate_amount(500.0).is_ok());
        assert!(validate_amount(0.5).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-10.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn accepts_only_ten_digit_mobile_numbers() {
        assert!(validate_mobile_number("9876543210").is_ok());
        assert!(validate_mobile_number("12345").is_err());
        assert!(validate_mobile_number("98765432101").is_err());
        assert!(validate_mobile_number("987654321a").is_err());
        assert!(validate_mobile_number("").is_err());
    }

    #[test]
    fn validates_email_pattern() {
        assert!(is_valid_email("asha@example.com"));
        assert!(is_valid_email("a.b@mandal.org.in"));
        assert!(!is_valid_email("asha"));
        assert!(!is_valid_email("asha@nodomain"));
        assert!(!is_valid_email("a sha@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn canonicalize_stamps_date_time_and_receipt_id() {
        let record = canonicalize(form()).expect("valid form");

        assert_eq!(record.donor_name, "Asha Patel");
        assert_eq!(record.donation_date.len(), 10);
        assert_eq!(&record.donation_date[4..5], "-");
        assert_eq!(record.donation_time.len(), 8);
        assert!(record.receipt_id.starts_with("NM"));
        assert_eq!(record.festival_name.as_deref(), Some("Ganpati Festival"));
    }

    #[test]
    fn canonicalize_trims_fields_and_drops_empty_email() {
        let mut f = form();
        f.donor_name = "  Asha Patel  ".to_string();
        f.email = Some("   ".to_string());

        let record = canonicalize(f).expect("valid form");
        assert_eq!(record.donor_name, "Asha Patel");
        assert_eq!(record.email, None);
    }

    #[test]
    fn canonicalize_rejects_bad_mobile_before_anything_else_sees_it() {
        let mut f = form();
        f.mobile_number = "12345".to_string();

        let err = canonicalize(f).expect_err("short mobile");
        assert_eq!(err.field, "mobile_number");
    }

    #[test]
    fn canonicalize_enforces_email_gate_when_provided() {
        let mut f = form();
        f.email = Some("not-an-email".to_string());

        let err = canonicalize(f).expect_err("bad email");
        assert_eq!(err.field, "email");
    }

    #[test]
    fn canonicalize_keeps_missing_festival_unset() {
        let mut f = form();
        f.festival_name = None;

        // Defaulting is the store's single normalization point, not ours.
        let record = canonicalize(f).expect("valid form");
        assert_eq!(record.festival_name, None);
    }
}
