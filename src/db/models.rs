use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Applied whenever a donation is stored without a festival. Rows written
/// before the festival field existed are patched to this by the backfill.
pub const DEFAULT_FESTIVAL: &str = "General Donation";

/// The fixed festival list offered by the entry form. "Other" admits free
/// text, so membership is never enforced on stored rows.
pub const FESTIVALS: &[&str] = &[
    "Ganpati Festival",
    "Holi",
    "Diwali",
    "Ram Navami",
    "Navratri",
    "Durga Puja",
    "Kali Puja",
    "Saraswati Puja",
    "Other",
];

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Donation {
    pub id: String,
    pub mandal_name: String,
    pub donor_name: String,
    pub amount: f64,
    pub mobile_number: String,
    pub email: Option<String>,
    pub donation_date: String,
    pub donation_time: String,
    pub receipt_id: String,
    pub festival_name: String,
    pub created_at: DateTime<Utc>,
}

/// A fully validated donation minus the store-assigned identity and
/// insertion timestamp.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewDonation {
    pub mandal_name: String,
    pub donor_name: String,
    pub amount: f64,
    pub mobile_number: String,
    pub email: Option<String>,
    pub donation_date: String,
    pub donation_time: String,
    pub receipt_id: String,
    pub festival_name: Option<String>,
}

#[derive(Serialize, Debug, Clone, Copy)]
pub struct BackfillOutcome {
    pub total: i64,
    pub updated: i64,
}
