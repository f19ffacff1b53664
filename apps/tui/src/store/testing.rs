//! In-memory `ReportStore` double that records every call.

use crate::domain::{NewReport, Report, ReportId};
use crate::store::{ReportStore, StoreError, StoreFuture, Subscription};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeStore {
    pub calls: Mutex<Vec<&'static str>>,
    pub blobs: Mutex<Vec<String>>,
    pub rows: Mutex<Vec<NewReport>>,
    pub listing: Mutex<Vec<Report>>,
    pub fail_list: bool,
    pub fail_insert: bool,
}

impl FakeStore {
    pub fn with_listing(reports: Vec<Report>) -> Self {
        Self {
            listing: Mutex::new(reports),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl ReportStore for FakeStore {
    fn list_reports(&self) -> StoreFuture<'_, Vec<Report>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push("list");
            if self.fail_list {
                return Err(StoreError::new("Network error: connection refused"));
            }
            Ok(self.listing.lock().unwrap().clone())
        })
    }

    fn create_report<'a>(&'a self, report: &'a NewReport) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.calls.lock().unwrap().push("insert");
            if self.fail_insert {
                return Err(StoreError::new("Database error: insert rejected"));
            }
            self.rows.lock().unwrap().push(report.clone());
            Ok(())
        })
    }

    fn upload_photo<'a>(
        &'a self,
        object_path: &'a str,
        _bytes: Vec<u8>,
        _content_type: &'a str,
    ) -> StoreFuture<'a, String> {
        Box::pin(async move {
            self.calls.lock().unwrap().push("upload");
            self.blobs.lock().unwrap().push(object_path.to_string());
            Ok(object_path.to_string())
        })
    }

    fn public_url(&self, object_path: &str) -> String {
        format!("https://cdn.test/{object_path}")
    }

    fn subscribe_inserts(&self) -> StoreFuture<'_, Subscription> {
        Box::pin(async move {
            self.calls.lock().unwrap().push("subscribe");
            Err(StoreError::new("live feed unavailable"))
        })
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}

/// A report created `minute` minutes after a fixed base time.
pub fn report(id: &str, latitude: f64, longitude: f64, minute: i64) -> Report {
    let base = Utc.with_ymd_and_hms(2025, 4, 21, 10, 0, 0).unwrap();
    Report {
        id: ReportId::new(id),
        latitude,
        longitude,
        photo_url: format!("https://cdn.test/{id}.jpg"),
        created_at: base + Duration::minutes(minute),
    }
}
