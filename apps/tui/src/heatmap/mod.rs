//! Density heat layer over the report collection: projection, kernel
//! accumulation, colour ramp, picking and the view's phase machine.

mod collection;
mod color;
mod phase;
mod surface;
mod view_state;

pub use collection::ReportCollection;
pub use color::{ColorRamp, Rgb, RAMP_STOPS, YL_OR_RD};
pub use phase::{MapEvent, MapMachine, MapPhase, PhaseTransitionError};
pub use surface::{DensitySurface, HeatmapStyle, LitPixel};
pub use view_state::{GeoBounds, ViewState, Viewport, DEFAULT_VIEW, MAX_ZOOM, MIN_ZOOM};

use crate::domain::Report;
use serde::Serialize;
use std::collections::HashMap;
use surface::Accumulator;
use tracing::debug;

/// Every report counts once.
const REPORT_WEIGHT: f64 = 1.0;

/// Pure render of the collection under a camera.
///
/// Surface indices refer to positions in `collection`.
pub fn render(
    collection: &ReportCollection,
    view: &ViewState,
    viewport: Viewport,
    style: &HeatmapStyle,
) -> DensitySurface {
    let mut acc = Accumulator::new(viewport.width as usize, viewport.height as usize);

    for (index, report) in collection.iter().enumerate() {
        if let Some((x, y)) = view.project(report.longitude, report.latitude, viewport) {
            acc.add(index, x, y, REPORT_WEIGHT, style.radius_pixels);
        }
    }

    acc.finish(style)
}

/// Camera, phase and style of the map view. The collection itself is owned by
/// the caller and passed in read-only.
#[derive(Debug, Default)]
pub struct HeatmapView {
    pub view: ViewState,
    pub style: HeatmapStyle,
    machine: MapMachine,
}

impl HeatmapView {
    pub fn new(view: ViewState, style: HeatmapStyle) -> Self {
        Self {
            view,
            style,
            machine: MapMachine::new(),
        }
    }

    pub const fn phase(&self) -> MapPhase {
        self.machine.phase()
    }

    pub fn error(&self) -> Option<&str> {
        self.machine.error()
    }

    pub const fn shows_map(&self) -> bool {
        self.machine.shows_map()
    }

    pub fn process_event(&mut self, event: &MapEvent) -> Result<(), PhaseTransitionError> {
        let from = self.machine.phase();
        self.machine.process_event(event)?;
        debug!(%from, to = %self.machine.phase(), %event, "map phase transition");
        Ok(())
    }

    pub fn render(&self, collection: &ReportCollection, viewport: Viewport) -> DensitySurface {
        render(collection, &self.view, viewport, &self.style)
    }

    /// The report under a screen pixel, if any. Only answers while the map is
    /// on screen.
    pub fn pick<'a>(
        &self,
        collection: &'a ReportCollection,
        viewport: Viewport,
        x: f64,
        y: f64,
    ) -> Option<&'a Report> {
        if !self.shows_map() {
            return None;
        }
        self.render(collection, viewport)
            .pick(x, y)
            .and_then(|index| collection.get(index))
    }

    /// Drag gesture step; only moves the camera while the map is shown.
    pub fn drag(&mut self, dx: f64, dy: f64) {
        if self.process_event(&MapEvent::GestureStart).is_ok() {
            self.view.pan_by(dx, dy);
        }
    }

    pub fn zoom(&mut self, delta: f64) {
        if self.process_event(&MapEvent::GestureStart).is_ok() {
            self.view.zoom_by(delta);
            self.finish_gesture();
        }
    }

    /// One keyboard pan step, as a whole gesture.
    pub fn nudge(&mut self, dx: f64, dy: f64) {
        self.drag(dx, dy);
        self.finish_gesture();
    }

    pub fn end_gesture(&mut self) {
        if self.machine.phase() == MapPhase::Interacting {
            self.finish_gesture();
        }
    }

    fn finish_gesture(&mut self) {
        if let Err(err) = self.process_event(&MapEvent::GestureEnd) {
            debug!(error = %err, "ignored gesture end");
        }
    }

    pub fn reset_camera(&mut self) {
        self.view = DEFAULT_VIEW;
    }
}

/// Reports grouped on a 0.01 degree grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hotspot {
    pub latitude: f64,
    pub longitude: f64,
    pub count: usize,
}

/// Densest grid cells, most reports first.
#[allow(clippy::cast_possible_truncation)]
pub fn hotspots(collection: &ReportCollection, limit: usize) -> Vec<Hotspot> {
    let mut cells: HashMap<(i64, i64), usize> = HashMap::new();
    for report in collection.iter() {
        if !report.latitude.is_finite() || !report.longitude.is_finite() {
            continue;
        }
        let key = (
            (report.latitude * 100.0).round() as i64,
            (report.longitude * 100.0).round() as i64,
        );
        *cells.entry(key).or_default() += 1;
    }

    let mut ranked: Vec<_> = cells.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|((lat, lng), count)| Hotspot {
            latitude: lat as f64 / 100.0,
            longitude: lng as f64 / 100.0,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReportId;
    use chrono::{Duration, TimeZone, Utc};

    const VIEWPORT: Viewport = Viewport::new(160, 96);

    fn report(id: &str, latitude: f64, longitude: f64, minute: i64) -> Report {
        let base = Utc.with_ymd_and_hms(2025, 4, 21, 10, 0, 0).unwrap();
        Report {
            id: ReportId::new(id),
            latitude,
            longitude,
            photo_url: format!("https://x/{id}.jpg"),
            created_at: base + Duration::minutes(minute),
        }
    }

    fn ready_view() -> HeatmapView {
        let mut view = HeatmapView::default();
        view.process_event(&MapEvent::FetchSucceeded).unwrap();
        view
    }

    fn ids(collection: &ReportCollection) -> Vec<String> {
        collection.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn live_insert_lands_ahead_of_the_initial_list() {
        let mut collection = ReportCollection::from_newest_first(vec![
            report("r2", 16.29, 80.46, 2),
            report("r1", 16.30, 80.47, 1),
        ]);
        collection.prepend(report("r3", 16.28, 80.45, 3));
        assert_eq!(ids(&collection), vec!["r3", "r2", "r1"]);
    }

    #[test]
    fn inserts_precede_earlier_entries_in_delivery_order() {
        let initial = vec![report("a", 16.29, 80.46, 0), report("b", 16.3, 80.4, 0)];
        let mut collection = ReportCollection::from_newest_first(initial);
        for id in ["e1", "e2", "e3"] {
            collection.prepend(report(id, 16.29, 80.46, 5));
        }
        assert_eq!(ids(&collection), vec!["e3", "e2", "e1", "a", "b"]);
    }

    #[test]
    fn rendering_leaves_reports_untouched() {
        let collection = ReportCollection::from_newest_first(vec![
            report("r2", 16.29, 80.46, 2),
            report("r1", 16.30, 80.47, 1),
        ]);
        let before = collection.clone();
        let view = ready_view();

        let _ = view.render(&collection, VIEWPORT);
        let _ = view.pick(&collection, VIEWPORT, 80.0, 48.0);

        let after: Vec<_> = collection.iter().cloned().collect();
        let before: Vec<_> = before.iter().cloned().collect();
        assert_eq!(after, before);
    }

    #[test]
    fn picking_the_same_spot_twice_returns_the_same_report() {
        let collection = ReportCollection::from_newest_first(vec![
            report("r2", 16.29, 80.46, 2),
            report("r1", 16.30, 80.47, 1),
        ]);
        let view = ready_view();

        let first = view.pick(&collection, VIEWPORT, 80.5, 48.5).cloned();
        let second = view.pick(&collection, VIEWPORT, 80.5, 48.5).cloned();

        assert_eq!(first.as_ref().map(|r| r.id.as_str()), Some("r2"));
        assert_eq!(first, second);
    }

    #[test]
    fn coincident_reports_pick_the_newest() {
        let collection = ReportCollection::from_newest_first(vec![
            report("new", 16.29, 80.46, 2),
            report("old", 16.29, 80.46, 1),
        ]);
        let view = ready_view();
        let picked = view.pick(&collection, VIEWPORT, 80.5, 48.5).unwrap();
        assert_eq!(picked.id.as_str(), "new");
    }

    #[test]
    fn empty_collection_has_no_pickable_targets() {
        let collection = ReportCollection::new();
        let view = ready_view();
        let surface = view.render(&collection, VIEWPORT);

        assert_eq!(surface.pickable_count(), 0);
        assert_eq!(surface.lit_pixels().count(), 0);
        assert!(view.pick(&collection, VIEWPORT, 80.0, 48.0).is_none());
    }

    #[test]
    fn non_finite_positions_contribute_nothing() {
        let collection = ReportCollection::from_newest_first(vec![
            report("bad", f64::NAN, 80.46, 1),
            report("pole", 120.0, 80.46, 1),
        ]);
        let surface = render(&collection, &DEFAULT_VIEW, VIEWPORT, &HeatmapStyle::default());
        assert_eq!(surface.pickable_count(), 0);
    }

    #[test]
    fn no_picks_while_loading() {
        let collection = ReportCollection::from_newest_first(vec![report("r", 16.29, 80.46, 0)]);
        let view = HeatmapView::default();
        assert!(view.pick(&collection, VIEWPORT, 80.5, 48.5).is_none());
    }

    #[test]
    fn gestures_move_the_camera_and_return_to_ready() {
        let mut view = ready_view();
        view.drag(10.0, 0.0);
        assert_eq!(view.phase(), MapPhase::Interacting);
        assert!(view.view.longitude < DEFAULT_VIEW.longitude);

        view.end_gesture();
        assert_eq!(view.phase(), MapPhase::Ready);

        view.zoom(1.0);
        assert_eq!(view.phase(), MapPhase::Ready);
        assert!((view.view.zoom - 13.0).abs() < 1e-9);

        view.reset_camera();
        assert_eq!(view.view, DEFAULT_VIEW);
    }

    #[test]
    fn gestures_are_ignored_until_loaded() {
        let mut view = HeatmapView::default();
        view.nudge(50.0, 0.0);
        view.zoom(2.0);
        assert_eq!(view.view, DEFAULT_VIEW);
        assert_eq!(view.phase(), MapPhase::Loading);
    }

    #[test]
    fn gestures_after_a_failed_load_keep_the_error() {
        let mut view = HeatmapView::default();
        view.process_event(&MapEvent::FetchFailed("offline".to_string())).unwrap();

        view.nudge(0.0, 24.0);
        view.zoom(-1.0);
        view.end_gesture();

        assert_eq!(view.phase(), MapPhase::Error);
        assert_eq!(view.error(), Some("offline"));
        assert_eq!(view.view, DEFAULT_VIEW);
    }

    #[test]
    fn hotspots_rank_grid_cells_by_count() {
        let collection = ReportCollection::from_newest_first(vec![
            report("a", 16.291, 80.461, 0),
            report("b", 16.289, 80.459, 0),
            report("c", 16.30, 80.47, 0),
        ]);
        let spots = hotspots(&collection, 5);
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].count, 2);
        assert!((spots[0].latitude - 16.29).abs() < 1e-9);
        assert!((spots[0].longitude - 80.46).abs() < 1e-9);
    }
}
