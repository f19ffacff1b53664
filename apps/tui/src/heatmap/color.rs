/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub const RAMP_STOPS: usize = 8;

/// Yellow to dark red, low density first.
pub const YL_OR_RD: [Rgb; RAMP_STOPS] = [
    Rgb::new(255, 255, 204),
    Rgb::new(255, 237, 160),
    Rgb::new(254, 217, 118),
    Rgb::new(254, 178, 76),
    Rgb::new(253, 141, 60),
    Rgb::new(252, 78, 42),
    Rgb::new(227, 26, 28),
    Rgb::new(177, 0, 38),
];

/// Maps normalised density in `[0, 1]` onto a fixed list of stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRamp {
    stops: [Rgb; RAMP_STOPS],
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self { stops: YL_OR_RD }
    }
}

impl ColorRamp {
    pub const fn new(stops: [Rgb; RAMP_STOPS]) -> Self {
        Self { stops }
    }

    /// Stop index for a density; 1.0 lands on the last stop.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn stop_index(&self, density: f64) -> usize {
        let scaled = (density.clamp(0.0, 1.0) * RAMP_STOPS as f64).floor() as usize;
        scaled.min(RAMP_STOPS - 1)
    }

    pub fn stop(&self, index: usize) -> Rgb {
        self.stops[index.min(RAMP_STOPS - 1)]
    }

    pub fn color_for(&self, density: f64) -> Rgb {
        self.stop(self.stop_index(density))
    }

    pub fn stops(&self) -> &[Rgb; RAMP_STOPS] {
        &self.stops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_maps_to_ramp_ends() {
        let ramp = ColorRamp::default();
        assert_eq!(ramp.color_for(0.0), Rgb::new(255, 255, 204));
        assert_eq!(ramp.color_for(1.0), Rgb::new(177, 0, 38));
        assert_eq!(ramp.color_for(7.5), Rgb::new(177, 0, 38));
        assert_eq!(ramp.color_for(-1.0), Rgb::new(255, 255, 204));
    }

    #[test]
    fn stops_are_monotonic_in_density() {
        let ramp = ColorRamp::default();
        let indices: Vec<usize> = (0..=20).map(|i| ramp.stop_index(f64::from(i) / 20.0)).collect();
        assert!(indices.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(indices[10], 4);
    }
}
