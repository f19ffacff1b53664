use crate::domain::{NewReport, Report};
use crate::store::{ReportStore, StoreError, StoreFuture, Subscription};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, Url};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const REPORTS_PATH: &str = "rest/v1/reports";
const STORAGE_PATH: &str = "storage/v1/object";
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Report store speaking the PostgREST / Storage REST dialect of a hosted
/// backend.
///
/// The insert feed pages rows newer than the last one seen, in ascending
/// `created_at` order, on a fixed interval.
#[derive(Debug, Clone)]
pub struct RestReportStore {
    client: Client,
    base: Url,
    bucket: String,
    poll_interval: Duration,
}

impl RestReportStore {
    pub fn new(
        base_url: &str,
        public_key: &str,
        bucket: &str,
        poll_interval: Duration,
    ) -> Result<Self, StoreError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| StoreError::new(format!("Invalid backend URL {base_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(public_key)
            .map_err(|_| StoreError::new("Backend key contains invalid characters"))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {public_key}"))
            .map_err(|_| StoreError::new("Backend key contains invalid characters"))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base,
            bucket: bucket.to_string(),
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base
            .join(path)
            .map_err(|e| StoreError::new(format!("Invalid endpoint {path}: {e}")))
    }

    fn reports_url(&self) -> Result<Url, StoreError> {
        self.endpoint(REPORTS_PATH)
    }

    fn object_url(&self, object_path: &str) -> Result<Url, StoreError> {
        self.endpoint(&format!("{STORAGE_PATH}/{}/{object_path}", self.bucket))
    }

    async fn latest_created_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let response = self
            .client
            .get(self.reports_url()?)
            .query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", "1"),
            ])
            .send()
            .await?;
        let rows: Vec<Report> = check(response).await?.json().await?;
        Ok(rows.first().map(|r| r.created_at))
    }
}

impl ReportStore for RestReportStore {
    fn list_reports(&self) -> StoreFuture<'_, Vec<Report>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.reports_url()?)
                .query(&[("select", "*"), ("order", "created_at.desc")])
                .send()
                .await?;
            let reports: Vec<Report> = check(response).await?.json().await?;
            debug!(count = reports.len(), "listed reports");
            Ok(reports)
        })
    }

    fn create_report<'a>(&'a self, report: &'a NewReport) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.reports_url()?)
                .header("Prefer", "return=minimal")
                .json(&[report])
                .send()
                .await?;
            check(response).await?;
            info!("report created");
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
            let size = bytes.len();
            let response = self
                .client
                .post(self.object_url(object_path)?)
                .header(CONTENT_TYPE, content_type)
                .header("cache-control", "3600")
                .header("x-upsert", "false")
                .body(bytes)
                .send()
                .await?;
            check(response).await?;
            debug!(object_path, content_type, size, "photo uploaded");
            Ok(object_path.to_string())
        })
    }

    fn public_url(&self, object_path: &str) -> String {
        format!(
            "{}{STORAGE_PATH}/public/{}/{object_path}",
            self.base, self.bucket
        )
    }

    fn subscribe_inserts(&self) -> StoreFuture<'_, Subscription> {
        Box::pin(async move {
            let cursor = self.latest_created_at().await?;
            let (tx, rx) = mpsc::unbounded_channel();
            let store = self.clone();

            let feed = tokio::spawn(async move {
                store.poll_inserts(cursor, tx).await;
            });

            info!(
                interval_ms = self.poll_interval.as_millis(),
                "subscribed to remote insert feed"
            );
            Ok(Subscription::new(rx, feed))
        })
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

impl RestReportStore {
    async fn poll_inserts(
        &self,
        mut cursor: Option<DateTime<Utc>>,
        tx: mpsc::UnboundedSender<Report>,
    ) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.fetch_newer_than(cursor).await {
                Ok(page) => match deliver_page(cursor, page, &tx) {
                    FeedStep::Advanced(next) => cursor = next,
                    FeedStep::Closed => {
                        debug!("remote insert feed receiver dropped");
                        return;
                    }
                },
                // The feed keeps ticking; the next page picks up from the cursor
                Err(err) => warn!(error = %err, "insert feed poll failed"),
            }
        }
    }

    async fn fetch_newer_than(
        &self,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<Vec<Report>, StoreError> {
        let response = self
            .client
            .get(self.reports_url()?)
            .query(&feed_query(cursor))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum FeedStep {
    Advanced(Option<DateTime<Utc>>),
    Closed,
}

/// Sends one page in the order the backend returned it and moves the cursor
/// to the newest `created_at` sent. Rows at or behind the cursor were already
/// delivered and are dropped.
fn deliver_page(
    mut cursor: Option<DateTime<Utc>>,
    page: Vec<Report>,
    tx: &mpsc::UnboundedSender<Report>,
) -> FeedStep {
    for report in page {
        if cursor.is_some_and(|seen| report.created_at <= seen) {
            continue;
        }
        cursor = Some(report.created_at);
        if tx.send(report).is_err() {
            return FeedStep::Closed;
        }
    }
    FeedStep::Advanced(cursor)
}

fn feed_query(cursor: Option<DateTime<Utc>>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("order", "created_at.asc".to_string()),
    ];
    if let Some(cursor) = cursor {
        query.push((
            "created_at",
            format!("gt.{}", cursor.to_rfc3339_opts(SecondsFormat::Micros, true)),
        ));
    }
    query
}

/// Turns a non-success response into a `StoreError` carrying the backend's
/// own message when it sent one.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::new(error_message(status.as_u16(), &body)))
}

fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| format!("Backend responded with HTTP {status}"))
}
