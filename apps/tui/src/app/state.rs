use crate::app::actions::AppActions;
use crate::config::MapStyle;
use crate::domain::Report;
use crate::heatmap::{HeatmapView, MapEvent, MapPhase, ReportCollection, Viewport};
use crate::location::Permission;
use crate::store::{StoreError, Subscription};
use crate::ui;
use crate::upload::{UploadError, UploadForm};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use throbber_widgets_tui::ThrobberState;
use tracing::{debug, info, warn};

const THROBBER_STEP: Duration = Duration::from_millis(120);

/// Results of background work, delivered to the UI task.
#[derive(Debug)]
pub enum AppEvent {
    ReportsLoaded(Result<Vec<Report>, StoreError>),
    ReportsRefreshed(Result<Vec<Report>, StoreError>),
    FeedOpened(Result<Subscription, StoreError>),
    ReportInserted(Report),
    UploadFinished(Result<(), UploadError>),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AppScreen {
    Map,
    Upload,
    Details,
}

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub screen: AppScreen,
    pub show_help: bool,
    pub permission_prompt: bool,
    pub status_message: String,
    pub reports: ReportCollection,
    pub heatmap: HeatmapView,
    pub upload: UploadForm,
    pub selected_report: Option<Report>,
    pub map_style: MapStyle,
    pub map_area: Rect,
    pub throbber: ThrobberState,
    pub actions: AppActions,
    feed: Option<Subscription>,
    drag: Option<DragState>,
    last_frame: Instant,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    column: u16,
    row: u16,
    moved: bool,
}

impl App {
    pub fn new(actions: AppActions, map_style: MapStyle) -> Self {
        Self {
            running: true,
            screen: AppScreen::Map,
            show_help: false,
            permission_prompt: false,
            status_message: "Loading reports...".to_string(),
            reports: ReportCollection::new(),
            heatmap: HeatmapView::default(),
            upload: UploadForm::default(),
            selected_report: None,
            map_style,
            map_area: Rect::default(),
            throbber: ThrobberState::default(),
            actions,
            feed: None,
            drag: None,
            last_frame: Instant::now(),
        }
    }

    /// Kicks off the initial load.
    pub fn start(&self) {
        info!("loading reports");
        self.actions.fetch_reports();
    }

    /// Advances the busy spinner.
    pub fn update(&mut self) {
        if self.last_frame.elapsed() >= THROBBER_STEP {
            self.throbber.calc_next();
            self.last_frame = Instant::now();
        }
    }

    /// Records the full frame size so input can map cells onto the map.
    pub fn set_frame_area(&mut self, area: Rect) {
        self.map_area = ui::map_area(area);
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            u32::from(self.map_area.width) * 2,
            u32::from(self.map_area.height) * 4,
        )
    }

    pub const fn is_live(&self) -> bool {
        self.feed.is_some()
    }

    fn transition(&mut self, event: &MapEvent) {
        if let Err(err) = self.heatmap.process_event(event) {
            debug!(error = %err, "ignored map event");
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ReportsLoaded(Ok(reports)) => {
                info!(count = reports.len(), "reports loaded");
                self.status_message = format!("{} reports", reports.len());
                self.reports = ReportCollection::from_newest_first(reports);
                self.transition(&MapEvent::FetchSucceeded);
                if self.feed.is_none() {
                    self.actions.open_feed();
                }
            }
            AppEvent::ReportsLoaded(Err(err)) => {
                warn!(error = %err, "report listing failed");
                self.status_message = format!("Error: {err}");
                self.transition(&MapEvent::FetchFailed(err.message));
            }
            AppEvent::ReportsRefreshed(Ok(reports)) => {
                debug!(count = reports.len(), "reports refreshed");
                self.reports.replace(reports);
            }
            AppEvent::ReportsRefreshed(Err(err)) => {
                warn!(error = %err, "report refresh failed");
                self.status_message = format!("Could not refresh reports: {err}");
            }
            AppEvent::FeedOpened(Ok(subscription)) => {
                info!("live updates on");
                self.feed = Some(subscription);
            }
            AppEvent::FeedOpened(Err(err)) => {
                warn!(error = %err, "live updates unavailable");
                self.status_message = format!("Live updates unavailable: {err}");
            }
            AppEvent::ReportInserted(report) => {
                debug!(id = %report.id, "live insert");
                self.reports.prepend(report);
                self.status_message = format!("{} reports", self.reports.len());
            }
            AppEvent::UploadFinished(result) => self.finish_upload(result),
        }
    }

    /// Applies every insert the feed has buffered since the last tick.
    pub fn drain_feed(&mut self) {
        let Some(feed) = self.feed.as_mut() else {
            return;
        };

        let finished = feed.is_finished();
        let mut inserted = Vec::new();
        while let Some(report) = feed.try_next() {
            inserted.push(report);
        }
        if finished {
            warn!("live insert feed ended");
            self.feed = None;
            self.status_message = "Live updates stopped".to_string();
        }

        for report in inserted {
            self.handle_event(AppEvent::ReportInserted(report));
        }
    }

    pub fn retry(&mut self) {
        if self.heatmap.phase() != MapPhase::Error {
            return;
        }
        self.transition(&MapEvent::Retry);
        self.status_message = "Loading reports...".to_string();
        self.actions.fetch_reports();
    }

    pub fn open_details(&mut self, report: Report) {
        info!(id = %report.id, "report selected");
        self.selected_report = Some(report);
        self.screen = AppScreen::Details;
    }

    pub fn close_details(&mut self) {
        self.selected_report = None;
        self.screen = AppScreen::Map;
    }

    /// Picks whatever sits under a map pixel and opens it.
    pub fn pick_at(&mut self, x: f64, y: f64) {
        let picked = self
            .heatmap
            .pick(&self.reports, self.viewport(), x, y)
            .cloned();
        match picked {
            Some(report) => self.open_details(report),
            None => debug!(x, y, "nothing to pick"),
        }
    }

    /// Picks under the crosshair in the middle of the map.
    pub fn pick_center(&mut self) {
        let viewport = self.viewport();
        self.pick_at(
            f64::from(viewport.width) / 2.0,
            f64::from(viewport.height) / 2.0,
        );
    }

    /// Map pixel at the middle of a terminal cell, if the cell is on the map.
    pub fn cell_to_pixel(&self, column: u16, row: u16) -> Option<(f64, f64)> {
        let area = self.map_area;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        inside.then(|| {
            (
                f64::from(column - area.x).mul_add(2.0, 1.0),
                f64::from(row - area.y).mul_add(4.0, 2.0),
            )
        })
    }

    pub fn press(&mut self, column: u16, row: u16) {
        if self.cell_to_pixel(column, row).is_some() {
            self.drag = Some(DragState {
                column,
                row,
                moved: false,
            });
        }
    }

    pub fn drag_to(&mut self, column: u16, row: u16) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let dx = (f64::from(column) - f64::from(drag.column)) * 2.0;
        let dy = (f64::from(row) - f64::from(drag.row)) * 4.0;
        drag.column = column;
        drag.row = row;
        drag.moved = true;
        self.heatmap.drag(dx, dy);
    }

    /// Ends a press: a press without movement is a click and picks.
    pub fn release(&mut self, column: u16, row: u16) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if drag.moved {
            self.heatmap.end_gesture();
        } else if let Some((x, y)) = self.cell_to_pixel(column, row) {
            self.pick_at(x, y);
        }
    }

    pub fn open_upload(&mut self) {
        self.screen = AppScreen::Upload;
    }

    pub fn close_upload(&mut self) {
        if !self.upload.is_uploading() {
            self.screen = AppScreen::Map;
        }
    }

    /// Submits the selected photo, asking for location permission first if
    /// it has not been answered this session.
    pub fn request_submit(&mut self) {
        if !self.upload.can_submit() {
            return;
        }
        let location = self.actions.location();
        if location.is_supported() && location.permission() == Permission::Prompt {
            self.permission_prompt = true;
            return;
        }
        self.start_upload();
    }

    pub fn answer_permission(&mut self, granted: bool) {
        self.actions.location().set_permission(granted);
        self.permission_prompt = false;
        self.start_upload();
    }

    fn start_upload(&mut self) {
        if let Some(photo) = self.upload.begin_submit() {
            info!(path = %photo.path.display(), "submitting report");
            self.status_message = "Submitting report...".to_string();
            self.actions.submit(photo);
        }
    }

    fn finish_upload(&mut self, result: Result<(), UploadError>) {
        self.upload.finish(&result);
        match result {
            Ok(()) => {
                info!("report submitted");
                self.status_message = "Report submitted".to_string();
                self.screen = AppScreen::Map;
                // With a live feed the new row arrives on its own
                if self.feed.is_none() {
                    self.actions.refresh_reports();
                }
            }
            Err(err) => {
                warn!(error = %err, "report submission failed");
                self.status_message = format!("Upload failed: {err}");
            }
        }
    }
}
