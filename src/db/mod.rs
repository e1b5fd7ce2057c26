use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Row};
use std::env;
use uuid::Uuid;

pub mod models;

use models::{BackfillOutcome, Donation, NewDonation, DEFAULT_FESTIVAL};

pub type DbPool = Pool<SqliteConnectionManager>;

// Secondary indexes mirror the query surface: donor equality, date range,
// mandal, amount, festival.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS donations (
    id            TEXT PRIMARY KEY,
    mandal_name   TEXT NOT NULL,
    donor_name    TEXT NOT NULL,
    amount        REAL NOT NULL,
    mobile_number TEXT NOT NULL,
    email         TEXT,
    donation_date TEXT NOT NULL,
    donation_time TEXT NOT NULL,
    receipt_id    TEXT NOT NULL,
    festival_name TEXT,
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_donations_donor    ON donations(donor_name);
CREATE INDEX IF NOT EXISTS idx_donations_date     ON donations(donation_date);
CREATE INDEX IF NOT EXISTS idx_donations_mandal   ON donations(mandal_name);
CREATE INDEX IF NOT EXISTS idx_donations_amount   ON donations(amount);
CREATE INDEX IF NOT EXISTS idx_donations_festival ON donations(festival_name);
CREATE INDEX IF NOT EXISTS idx_donations_receipt  ON donations(receipt_id);
";

const DONATION_COLUMNS: &str = "id, mandal_name, donor_name, amount, mobile_number, email, \
     donation_date, donation_time, receipt_id, festival_name, created_at";

pub async fn init_pool() -> anyhow::Result<DbPool> {
    let path = env::var("DATABASE_PATH").unwrap_or_else(|_| "chanda.db".to_string());
    init_pool_at(&path).await
}

pub async fn init_pool_at(path: &str) -> anyhow::Result<DbPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
    });
    let pool = Pool::builder()
        // Tolerate transient contention on the single database file
        .max_size(10)
        .connection_timeout(std::time::Duration::from_secs(60))
        .build(manager)
        .map_err(|e| anyhow::anyhow!("Failed to create DB pool: {}", e))?;

    let conn = pool.get()?;
    conn.execute_batch(SCHEMA)?;

    Ok(pool)
}

fn donation_from_row(row: &Row<'_>) -> rusqlite::Result<Donation> {
    let created_at: String = row.get(10)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
        })?;

    // Rows older than the festival column may still hold NULL until the
    // backfill has run; a read never surfaces an empty festival.
    let festival_name: Option<String> = row.get(9)?;
    let festival_name = festival_name
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FESTIVAL.to_string());

    Ok(Donation {
        id: row.get(0)?,
        mandal_name: row.get(1)?,
        donor_name: row.get(2)?,
        amount: row.get(3)?,
        mobile_number: row.get(4)?,
        email: row.get(5)?,
        donation_date: row.get(6)?,
        donation_time: row.get(7)?,
        receipt_id: row.get(8)?,
        festival_name,
        created_at,
    })
}

/// Inserts a validated donation. The store assigns the record id and the
/// insertion timestamp; business validation is the caller's job.
pub async fn create_donation(pool: &DbPool, new: &NewDonation) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    // Fixed-width UTC timestamp, so insertion order survives string comparison
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    let festival_name = new
        .festival_name
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FESTIVAL);

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO donations (id, mandal_name, donor_name, amount, mobile_number, email, \
         donation_date, donation_time, receipt_id, festival_name, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id,
            new.mandal_name,
            new.donor_name,
            new.amount,
            new.mobile_number,
            new.email,
            new.donation_date,
            new.donation_time,
            new.receipt_id,
            festival_name,
            created_at,
        ],
    )?;

    Ok(id)
}

/// All donations, most recent first.
pub async fn list_donations(pool: &DbPool) -> anyhow::Result<Vec<Donation>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {DONATION_COLUMNS} FROM donations ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map([], donation_from_row)?;

    let mut donations = Vec::new();
    for row in rows {
        donations.push(row?);
    }
    Ok(donations)
}

/// Exact donor-name matches via the donor index.
pub async fn search_by_donor(pool: &DbPool, donor_name: &str) -> anyhow::Result<Vec<Donation>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {DONATION_COLUMNS} FROM donations WHERE donor_name = ?1 \
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![donor_name], donation_from_row)?;

    let mut donations = Vec::new();
    for row in rows {
        donations.push(row?);
    }
    Ok(donations)
}

/// Inclusive date range. Plain string comparison is correct because the
/// stored form is fixed-width zero-padded YYYY-MM-DD.
pub async fn get_by_date_range(
    pool: &DbPool,
    start_date: &str,
    end_date: &str,
) -> anyhow::Result<Vec<Donation>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {DONATION_COLUMNS} FROM donations \
         WHERE donation_date >= ?1 AND donation_date <= ?2 \
         ORDER BY donation_date, rowid"
    ))?;
    let rows = stmt.query_map(params![start_date, end_date], donation_from_row)?;

    let mut donations = Vec::new();
    for row in rows {
        donations.push(row?);
    }
    Ok(donations)
}

pub async fn get_by_receipt_id(
    pool: &DbPool,
    receipt_id: &str,
) -> anyhow::Result<Option<Donation>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {DONATION_COLUMNS} FROM donations WHERE receipt_id = ?1 LIMIT 1"
    ))?;
    let mut rows = stmt.query_map(params![receipt_id], donation_from_row)?;

    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub async fn get_total_amount(pool: &DbPool) -> anyhow::Result<f64> {
    let conn = pool.get()?;
    let total = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM donations",
        [],
        |row| row.get::<_, f64>(0),
    )?;
    Ok(total)
}

pub async fn get_count(pool: &DbPool) -> anyhow::Result<i64> {
    let conn = pool.get()?;
    let count = conn.query_row("SELECT COUNT(*) FROM donations", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(count)
}

/// One-off administrative walk: patch rows stored before the festival
/// column existed. Returns how many rows were touched.
pub async fn backfill_festival_names(pool: &DbPool) -> anyhow::Result<BackfillOutcome> {
    let conn = pool.get()?;
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM donations", [], |row| row.get(0))?;
    let updated = conn.execute(
        "UPDATE donations SET festival_name = ?1 \
         WHERE festival_name IS NULL OR TRIM(festival_name) = ''",
        params![DEFAULT_FESTIVAL],
    )? as i64;

    Ok(BackfillOutcome { total, updated })
}
