use crate::db::{create_database_pool, queries};
use crate::domain::{NewReport, Report};
use crate::store::{ReportStore, StoreError, StoreFuture, Subscription};
use reqwest::Url;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info, warn};

const FEED_CAPACITY: usize = 256;

/// Report store backed by a local SQLite database and a photo directory.
///
/// Inserts are serialized so feed delivery follows commit order.
#[derive(Debug)]
pub struct LocalReportStore {
    pool: SqlitePool,
    bucket_dir: PathBuf,
    inserts: broadcast::Sender<Report>,
    write_lock: Mutex<()>,
}

impl LocalReportStore {
    pub async fn open(
        database_url: &str,
        photo_dir: &Path,
        bucket: &str,
    ) -> Result<Self, StoreError> {
        let pool = create_database_pool(database_url).await?;
        Self::with_pool(pool, photo_dir, bucket).await
    }

    pub async fn with_pool(
        pool: SqlitePool,
        photo_dir: &Path,
        bucket: &str,
    ) -> Result<Self, StoreError> {
        let bucket_dir = photo_dir.join(bucket);
        tokio::fs::create_dir_all(&bucket_dir).await?;
        // Public references must be absolute file URLs
        let bucket_dir = tokio::fs::canonicalize(&bucket_dir).await?;
        info!(bucket_dir = %bucket_dir.display(), "local report store ready");

        let (inserts, _) = broadcast::channel(FEED_CAPACITY);
        Ok(Self {
            pool,
            bucket_dir,
            inserts,
            write_lock: Mutex::new(()),
        })
    }

    fn object_file(&self, object_path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(object_path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(StoreError::new(format!("Invalid object path: {object_path}")));
        }
        Ok(self.bucket_dir.join(relative))
    }
}

impl ReportStore for LocalReportStore {
    fn list_reports(&self) -> StoreFuture<'_, Vec<Report>> {
        Box::pin(async move {
            let records = queries::get_reports(&self.pool).await?;
            let reports = records
                .into_iter()
                .map(Report::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::new(format!("Corrupt report timestamp: {e}")))?;
            debug!(count = reports.len(), "listed reports");
            Ok(reports)
        })
    }

    fn create_report<'a>(&'a self, report: &'a NewReport) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let record = queries::insert_report(&self.pool, report).await?;
            let created = Report::try_from(record)
                .map_err(|e| StoreError::new(format!("Corrupt report timestamp: {e}")))?;
            info!(id = %created.id, "report created");
            // No receivers is fine: nobody is watching the feed
            let _ = self.inserts.send(created);
            Ok(())
        })
    }

    fn upload_photo<'a>(
        &'a self,
        object_path: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
    ) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let target = self.object_file(object_path)?;
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, &bytes).await?;
            debug!(object_path, content_type, size = bytes.len(), "photo stored");
            Ok(object_path.to_string())
        })
    }

    fn public_url(&self, object_path: &str) -> String {
        let path = self.bucket_dir.join(object_path);
        Url::from_file_path(&path)
            .map_or_else(|()| path.display().to_string(), |url| url.to_string())
    }

    fn subscribe_inserts(&self) -> StoreFuture<'_, Subscription> {
        Box::pin(async move {
            let mut source = self.inserts.subscribe();
            let (tx, rx) = mpsc::unbounded_channel();

            let feed = tokio::spawn(async move {
                loop {
                    match source.recv().await {
                        Ok(report) => {
                            if tx.send(report).is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "insert feed lagged; events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                debug!("local insert feed closed");
            });

            info!("subscribed to local insert feed");
            Ok(Subscription::new(rx, feed))
        })
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
