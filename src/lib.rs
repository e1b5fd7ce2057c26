pub mod db;
pub mod error;
pub mod live;
pub mod receipt;
pub mod routes;
pub mod share;
pub mod validation;

#[derive(Clone)]
pub struct AppState {
    pub db: db::DbPool,
    pub gateways: share::Gateways,
    pub feed: live::DonationFeed,
}
