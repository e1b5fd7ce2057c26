use chanda_tracker::db;

/// One-time backfill: donations recorded before the festival field existed
/// get the default festival name. Safe to re-run; already-patched rows are
/// left alone.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if it exists
    dotenvy::dotenv().ok();

    println!("Starting festival name backfill...");

    let pool = db::init_pool().await?;
    let outcome = db::backfill_festival_names(&pool).await?;

    println!("Scanned {} donations.", outcome.total);
    println!(
        "Updated {} donations with default festival name.",
        outcome.updated
    );

    Ok(())
}
