use std::f64::consts::PI;

/// Side of one Web-Mercator tile at zoom 0, in pixels.
pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 20.0;
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

/// Camera every session starts from. Not derived from the data.
pub const DEFAULT_VIEW: ViewState = ViewState {
    longitude: 80.46,
    latitude: 16.29,
    zoom: 12.0,
};

/// Camera parameters of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        DEFAULT_VIEW
    }
}

/// Drawable area in pixels (braille dots in the terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn center(self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Geographic extent of a viewport, used to frame the base map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

/// Normalised Web-Mercator position, both axes in `[0, 1]` for valid input.
/// Out-of-range latitudes come back non-finite.
fn to_world(longitude: f64, latitude: f64) -> (f64, f64) {
    let x = (longitude + 180.0) / 360.0;
    let lat = latitude.to_radians();
    let y = (1.0 - (PI / 4.0 + lat / 2.0).tan().ln() / PI) / 2.0;
    (x, y)
}

fn from_world(x: f64, y: f64) -> (f64, f64) {
    let longitude = x.mul_add(360.0, -180.0);
    let latitude = (PI * 2.0f64.mul_add(-y, 1.0)).sinh().atan().to_degrees();
    (longitude, latitude)
}

impl ViewState {
    fn scale(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    /// Screen position of a coordinate, `None` when it does not project to a
    /// finite point.
    pub fn project(&self, longitude: f64, latitude: f64, viewport: Viewport) -> Option<(f64, f64)> {
        let (wx, wy) = to_world(longitude, latitude);
        let (cx, cy) = to_world(self.longitude, self.latitude);
        let (half_w, half_h) = viewport.center();
        let scale = self.scale();

        let x = (wx - cx).mul_add(scale, half_w);
        let y = (wy - cy).mul_add(scale, half_h);
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    /// Coordinate under a screen position: `(longitude, latitude)`.
    pub fn unproject(&self, x: f64, y: f64, viewport: Viewport) -> (f64, f64) {
        let (cx, cy) = to_world(self.longitude, self.latitude);
        let (half_w, half_h) = viewport.center();
        let scale = self.scale();
        from_world(cx + (x - half_w) / scale, cy + (y - half_h) / scale)
    }

    /// Drags the map content by `(dx, dy)` pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let (cx, cy) = to_world(self.longitude, self.latitude);
        let scale = self.scale();
        let (longitude, latitude) = from_world(cx - dx / scale, cy - dy / scale);

        self.longitude = (longitude + 180.0).rem_euclid(360.0) - 180.0;
        self.latitude = latitude.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn bounds(&self, viewport: Viewport) -> GeoBounds {
        let (west, north) = self.unproject(0.0, 0.0, viewport);
        let (east, south) =
            self.unproject(f64::from(viewport.width), f64::from(viewport.height), viewport);
        GeoBounds {
            west,
            east,
            south,
            north,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport::new(200, 120);

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(diff < 1e-6, "expected {expected}, got {actual}, diff {diff}");
    }

    #[test]
    fn camera_center_projects_to_viewport_center() {
        let view = ViewState::default();
        let (x, y) = view.project(view.longitude, view.latitude, VIEWPORT).unwrap();
        assert_close(x, 100.0);
        assert_close(y, 60.0);
    }

    #[test]
    fn unproject_inverts_project() {
        let view = ViewState::default();
        let (x, y) = view.project(80.47, 16.30, VIEWPORT).unwrap();
        let (lng, lat) = view.unproject(x, y, VIEWPORT);
        assert_close(lng, 80.47);
        assert_close(lat, 16.30);
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let view = ViewState::default();
        let (x, y) = view.project(80.47, 16.30, VIEWPORT).unwrap();
        assert!(x > 100.0);
        assert!(y < 60.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = ViewState::default();
        view.zoom_by(100.0);
        assert_close(view.zoom, MAX_ZOOM);
        view.zoom_by(-100.0);
        assert_close(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn dragging_moves_content_with_the_pointer() {
        let mut view = ViewState::default();
        let before = view.project(80.47, 16.30, VIEWPORT).unwrap();
        view.pan_by(10.0, -5.0);
        let after = view.project(80.47, 16.30, VIEWPORT).unwrap();

        assert_close(after.0 - before.0, 10.0);
        assert_close(after.1 - before.1, -5.0);
    }

    #[test]
    fn longitude_wraps_when_panning_across_the_antimeridian() {
        let mut view = ViewState {
            longitude: 179.9,
            latitude: 0.0,
            zoom: 2.0,
        };
        view.pan_by(-200.0, 0.0);
        assert!((-180.0..180.0).contains(&view.longitude));
    }

    #[test]
    fn out_of_range_latitude_does_not_project() {
        let view = ViewState::default();
        assert!(view.project(80.46, 95.0, VIEWPORT).is_none());
        // Longitude beyond 180 is still projected as given.
        assert!(view.project(200.0, 16.29, VIEWPORT).is_some());
    }

    #[test]
    fn bounds_frame_the_camera() {
        let view = ViewState::default();
        let bounds = view.bounds(VIEWPORT);
        assert!(bounds.west < view.longitude && view.longitude < bounds.east);
        assert!(bounds.south < view.latitude && view.latitude < bounds.north);
    }
}
