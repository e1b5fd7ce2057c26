use chanda_tracker::db::{
    self,
    models::{NewDonation, DEFAULT_FESTIVAL},
};

fn sample(
    donor: &str,
    amount: f64,
    date: &str,
    receipt_id: &str,
    festival: Option<&str>,
) -> NewDonation {
    NewDonation {
        mandal_name: "Shree Ganesh Mandal".to_string(),
        donor_name: donor.to_string(),
        amount,
        mobile_number: "9876543210".to_string(),
        email: None,
        donation_date: date.to_string(),
        donation_time: "10:30:00".to_string(),
        receipt_id: receipt_id.to_string(),
        festival_name: festival.map(str::to_string),
    }
}

async fn temp_pool(dir: &tempfile::TempDir) -> db::DbPool {
    let path = dir.path().join("chanda.db");
    db::init_pool_at(path.to_str().expect("utf8 path"))
        .await
        .expect("init pool")
}

#[tokio::test]
async fn donation_store_flow() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = temp_pool(&dir).await;

    assert_eq!(db::get_count(&pool).await.expect("count"), 0);
    assert_eq!(db::get_total_amount(&pool).await.expect("total"), 0.0);

    db::create_donation(
        &pool,
        &sample("Asha Patel", 500.0, "2024-01-15", "NMAAA11", Some("Ganpati Festival")),
    )
    .await
    .expect("create");
    db::create_donation(
        &pool,
        &sample("Ravi Kumar", 250.0, "2024-01-20", "NMBBB22", Some("Holi")),
    )
    .await
    .expect("create");
    db::create_donation(
        &pool,
        &sample("Asha Patel", 1000.0, "2024-02-01", "NMCCC33", None),
    )
    .await
    .expect("create");

    // List is newest first and agrees with the aggregates.
    let all = db::list_donations(&pool).await.expect("list");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].receipt_id, "NMCCC33");
    assert_eq!(all[2].receipt_id, "NMAAA11");

    let count = db::get_count(&pool).await.expect("count");
    assert_eq!(count, all.len() as i64);

    let total = db::get_total_amount(&pool).await.expect("total");
    let listed_sum: f64 = all.iter().map(|d| d.amount).sum();
    assert!((total - listed_sum).abs() < f64::EPSILON);
    assert!((total - 1750.0).abs() < f64::EPSILON);

    // Donor search is exact-match.
    let asha = db::search_by_donor(&pool, "Asha Patel").await.expect("search");
    assert_eq!(asha.len(), 2);
    assert!(asha.iter().all(|d| d.donor_name == "Asha Patel"));
    let nobody = db::search_by_donor(&pool, "Asha").await.expect("search");
    assert!(nobody.is_empty());

    // Inclusive date range keeps January and excludes 2024-02-01.
    let january = db::get_by_date_range(&pool, "2024-01-01", "2024-01-31")
        .await
        .expect("range");
    assert_eq!(january.len(), 2);
    assert!(january.iter().all(|d| d.donation_date.starts_with("2024-01")));

    // Festival round-trip: explicit value survives, omission reads back as
    // the default.
    let by_receipt = db::get_by_receipt_id(&pool, "NMAAA11")
        .await
        .expect("lookup")
        .expect("exists");
    assert_eq!(by_receipt.festival_name, "Ganpati Festival");

    let defaulted = db::get_by_receipt_id(&pool, "NMCCC33")
        .await
        .expect("lookup")
        .expect("exists");
    assert_eq!(defaulted.festival_name, DEFAULT_FESTIVAL);

    let missing = db::get_by_receipt_id(&pool, "NMZZZ99").await.expect("lookup");
    assert!(missing.is_none());
}

#[tokio::test]
async fn submit_scenario_updates_aggregates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = temp_pool(&dir).await;

    let count_before = db::get_count(&pool).await.expect("count");
    let total_before = db::get_total_amount(&pool).await.expect("total");

    db::create_donation(
        &pool,
        &sample("Asha Patel", 500.0, "2024-09-07", "NMSCEN1", Some("Ganpati Festival")),
    )
    .await
    .expect("create");

    assert_eq!(db::get_count(&pool).await.expect("count"), count_before + 1);
    let total_after = db::get_total_amount(&pool).await.expect("total");
    assert!((total_after - total_before - 500.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn backfill_patches_only_legacy_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = temp_pool(&dir).await;

    db::create_donation(
        &pool,
        &sample("Asha Patel", 500.0, "2024-01-15", "NMNEW01", Some("Diwali")),
    )
    .await
    .expect("create");

    // Simulate rows written before the festival column existed.
    {
        let conn = pool.get().expect("conn");
        conn.execute(
            "INSERT INTO donations (id, mandal_name, donor_name, amount, mobile_number, email, \
             donation_date, donation_time, receipt_id, festival_name, created_at) \
             VALUES ('legacy-1', 'Shree Ganesh Mandal', 'Old Donor', 100.0, '9123456780', NULL, \
             '2023-09-01', '09:00:00', 'NMOLD01', NULL, '2023-09-01T09:00:00.000000Z')",
            [],
        )
        .expect("insert legacy");
        conn.execute(
            "INSERT INTO donations (id, mandal_name, donor_name, amount, mobile_number, email, \
             donation_date, donation_time, receipt_id, festival_name, created_at) \
             VALUES ('legacy-2', 'Shree Ganesh Mandal', 'Older Donor', 75.0, '9123456781', NULL, \
             '2023-08-15', '18:30:00', 'NMOLD02', '  ', '2023-08-15T18:30:00.000000Z')",
            [],
        )
        .expect("insert legacy");
    }

    let outcome = db::backfill_festival_names(&pool).await.expect("backfill");
    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.updated, 2);

    let all = db::list_donations(&pool).await.expect("list");
    assert!(all.iter().all(|d| !d.festival_name.trim().is_empty()));
    let legacy = db::get_by_receipt_id(&pool, "NMOLD01")
        .await
        .expect("lookup")
        .expect("exists");
    assert_eq!(legacy.festival_name, DEFAULT_FESTIVAL);
    let untouched = db::get_by_receipt_id(&pool, "NMNEW01")
        .await
        .expect("lookup")
        .expect("exists");
    assert_eq!(untouched.festival_name, "Diwali");

    // Re-running finds nothing left to patch.
    let second = db::backfill_festival_names(&pool).await.expect("backfill");
    assert_eq!(second.updated, 0);
}
