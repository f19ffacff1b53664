use crate::app::state::AppEvent;
use crate::location::LocationProvider;
use crate::store::ReportStore;
use crate::upload::{submit_report, SelectedPhoto};
use reqwest::Url;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Background work started from the UI. Each job posts exactly one
/// [`AppEvent`] back to the event loop when it finishes.
#[derive(Clone)]
pub struct AppActions {
    store: Arc<dyn ReportStore>,
    location: Arc<LocationProvider>,
    events: UnboundedSender<AppEvent>,
}

impl std::fmt::Debug for AppActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppActions")
            .field("backend", &self.store.backend_name())
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl AppActions {
    pub fn new(
        store: Arc<dyn ReportStore>,
        location: Arc<LocationProvider>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            store,
            location,
            events,
        }
    }

    pub fn location(&self) -> &LocationProvider {
        &self.location
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    fn post(&self, event: AppEvent) {
        if self.events.send(event).is_err() {
            debug!("event loop gone; dropping background result");
        }
    }

    /// Initial load (or retry). Posts [`AppEvent::ReportsLoaded`].
    pub fn fetch_reports(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let result = this.store.list_reports().await;
            this.post(AppEvent::ReportsLoaded(result));
        });
    }

    /// Full reload after an upload. Posts [`AppEvent::ReportsRefreshed`].
    pub fn refresh_reports(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let result = this.store.list_reports().await;
            this.post(AppEvent::ReportsRefreshed(result));
        });
    }

    pub fn open_feed(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let result = this.store.subscribe_inserts().await;
            this.post(AppEvent::FeedOpened(result));
        });
    }

    pub fn submit(&self, photo: SelectedPhoto) {
        let this = self.clone();
        tokio::spawn(async move {
            let result = submit_report(this.store.as_ref(), &this.location, &photo).await;
            this.post(AppEvent::UploadFinished(result));
        });
    }
}

/// Hands a URL to the platform opener (browser, image viewer).
pub fn open_external(target: &str) -> std::io::Result<()> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };

    debug!(opener, target, "opening externally");
    Command::new(opener)
        .arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .inspect_err(|e| warn!(error = %e, opener, "external opener failed"))
}

/// Whether a photo reference can be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoStatus {
    Available(String),
    Broken,
}

/// File references must exist on disk; remote references only need to be
/// well-formed.
pub fn photo_status(photo_url: &str) -> PhotoStatus {
    let Ok(url) = Url::parse(photo_url) else {
        return PhotoStatus::Broken;
    };

    match url.scheme() {
        "file" => match url.to_file_path() {
            Ok(path) if path.is_file() => PhotoStatus::Available(photo_url.to_string()),
            _ => PhotoStatus::Broken,
        },
        "http" | "https" => PhotoStatus::Available(photo_url.to_string()),
        _ => PhotoStatus::Broken,
    }
}
