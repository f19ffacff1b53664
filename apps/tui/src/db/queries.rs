use sqlx::{query_as, SqlitePool};

use crate::db::models::ReportRecord;
use crate::domain::NewReport;

/// Retrieves every report, newest first. Ties on `created_at` fall back to the
/// insertion key so the order is stable.
pub async fn get_reports(pool: &SqlitePool) -> Result<Vec<ReportRecord>, sqlx::Error> {
    let reports = query_as::<_, ReportRecord>(
        "SELECT id, latitude, longitude, photo_url, created_at
         FROM reports
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(reports)
}

/// Inserts a report and returns the committed row, including the id and
/// timestamp SQLite assigned.
pub async fn insert_report(
    pool: &SqlitePool,
    report: &NewReport,
) -> Result<ReportRecord, sqlx::Error> {
    query_as::<_, ReportRecord>(
        "INSERT INTO reports (latitude, longitude, photo_url)
         VALUES (?, ?, ?)
         RETURNING id, latitude, longitude, photo_url, created_at",
    )
    .bind(report.latitude)
    .bind(report.longitude)
    .bind(&report.photo_url)
    .fetch_one(pool)
    .await
}
