use serde::Serialize;
use tokio::sync::broadcast;

use crate::db::{self, models::Donation, DbPool};

/// What a subscriber receives after each change: a full replacement of the
/// list and aggregate views, never a delta.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub donations: Vec<Donation>,
    pub total_amount: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DonationChange {
    pub receipt_id: String,
}

/// Broadcast hub for store mutations. Publishing never blocks and never
/// fails; with no subscribers the event is simply dropped.
#[derive(Clone)]
pub struct DonationFeed {
    tx: broadcast::Sender<DonationChange>,
}

impl DonationFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn publish(&self, change: DonationChange) {
        let _ = self.tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DonationChange> {
        self.tx.subscribe()
    }
}

impl Default for DonationFeed {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn snapshot(pool: &DbPool) -> anyhow::Result<Snapshot> {
    let donations = db::list_donations(pool).await?;
    let total_amount = db::get_total_amount(pool).await?;
    let count = db::get_count(pool).await?;

    Ok(Snapshot {
        donations,
        total_amount,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_changes() {
        let feed = DonationFeed::new();
        let mut rx = feed.subscribe();

        feed.publish(DonationChange {
            receipt_id: "NMABC123".to_string(),
        });

        let change = rx.recv().await.expect("change delivered");
        assert_eq!(change.receipt_id, "NMABC123");
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let feed = DonationFeed::new();
        feed.publish(DonationChange {
            receipt_id: "NMX".to_string(),
        });
    }
}
