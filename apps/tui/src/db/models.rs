use crate::domain::{Report, ReportId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A row of the `reports` table as SQLite stores it.
#[derive(Debug, FromRow, Clone)]
pub struct ReportRecord {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub photo_url: String,
    pub created_at: String, // ISO-8601 text, sortable
}

impl TryFrom<ReportRecord> for Report {
    type Error = chrono::ParseError;

    fn try_from(record: ReportRecord) -> Result<Self, Self::Error> {
        let created_at = DateTime::parse_from_rfc3339(&record.created_at)?.with_timezone(&Utc);

        Ok(Self {
            id: ReportId::new(record.id.to_string()),
            latitude: record.latitude,
            longitude: record.longitude,
            photo_url: record.photo_url,
            created_at,
        })
    }
}
