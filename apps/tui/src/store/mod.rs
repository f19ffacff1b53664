//! Report store client: the `reports` table, the photo bucket and the insert
//! feed behind one dyn-compatible trait.

pub mod local;
pub mod photo;
pub mod rest;
pub mod subscription;
#[cfg(test)]
pub mod testing;

use crate::config::{AppConfig, BackendKind};
use crate::domain::{NewReport, Report};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

pub use local::LocalReportStore;
pub use rest::RestReportStore;
pub use subscription::Subscription;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// The one failure type the store surfaces. The message is shown to the user
/// as is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::new(format!("Database error: {err}"))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("Network error: {err}"))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("Storage error: {err}"))
    }
}

/// Typed façade over the backing service.
///
/// Returns boxed futures (instead of `async fn`) so the trait stays
/// dyn-compatible and can be shared as `Arc<dyn ReportStore>`.
pub trait ReportStore: Send + Sync {
    /// Every report, newest first.
    fn list_reports(&self) -> StoreFuture<'_, Vec<Report>>;

    /// Inserts one row; the backend assigns `id` and `created_at`.
    fn create_report<'a>(&'a self, report: &'a NewReport) -> StoreFuture<'a, ()>;

    /// Stores photo bytes under `object_path` and returns the stored path.
    fn upload_photo<'a>(
        &'a self,
        object_path: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
    ) -> StoreFuture<'a, String>;

    /// Stable public reference for a stored object.
    fn public_url(&self, object_path: &str) -> String;

    /// Opens the live insert feed. Delivery starts with the first insert
    /// committed after this call; nothing earlier is replayed.
    fn subscribe_inserts(&self) -> StoreFuture<'_, Subscription>;

    fn backend_name(&self) -> &'static str;
}

/// Builds the store selected by `BACKEND_URL`.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn ReportStore>, StoreError> {
    match config.backend_kind() {
        BackendKind::Sqlite => {
            let store = LocalReportStore::open(
                &config.backend_url,
                &config.photo_dir,
                &config.photo_bucket,
            )
            .await?;
            Ok(Arc::new(store))
        }
        BackendKind::Rest => {
            let store = RestReportStore::new(
                &config.backend_url,
                &config.backend_key,
                &config.photo_bucket,
                config.feed_poll,
            )?;
            Ok(Arc::new(store))
        }
    }
}
