use super::color::{ColorRamp, Rgb};
use std::collections::HashSet;

pub const DEFAULT_RADIUS_PIXELS: f64 = 20.0;
pub const DEFAULT_INTENSITY: f64 = 1.0;
pub const DEFAULT_THRESHOLD: f64 = 0.03;

/// Rendering parameters of the heat layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapStyle {
    /// Kernel reach in pixels; the Gaussian's sigma is a third of it.
    pub radius_pixels: f64,
    /// Multiplier applied after normalisation, clipped to 1.
    pub intensity: f64,
    /// Densities below this are transparent and not pickable.
    pub threshold: f64,
    pub ramp: ColorRamp,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self {
            radius_pixels: DEFAULT_RADIUS_PIXELS,
            intensity: DEFAULT_INTENSITY,
            threshold: DEFAULT_THRESHOLD,
            ramp: ColorRamp::default(),
        }
    }
}

/// A pixel that survives the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LitPixel {
    pub x: usize,
    pub y: usize,
    pub density: f64,
    pub stop: usize,
}

/// Per-pixel raw sums accumulated from the kernel, plus which report
/// contributed most to each pixel.
#[derive(Debug, Clone)]
pub(crate) struct Accumulator {
    width: usize,
    height: usize,
    raw: Vec<f64>,
    strongest: Vec<f64>,
    owners: Vec<Option<usize>>,
}

impl Accumulator {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        let len = width * height;
        Self {
            width,
            height,
            raw: vec![0.0; len],
            strongest: vec![0.0; len],
            owners: vec![None; len],
        }
    }

    /// Splats one weighted point centred at `(px, py)`.
    ///
    /// Reports are added newest first, so a strict comparison leaves ties
    /// with the newer report.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    pub(crate) fn add(&mut self, index: usize, px: f64, py: f64, weight: f64, radius: f64) {
        if self.width == 0 || self.height == 0 || radius <= 0.0 {
            return;
        }
        let max_x = self.width as f64;
        let max_y = self.height as f64;
        if px < -radius || py < -radius || px > max_x + radius || py > max_y + radius {
            return;
        }

        let sigma = radius / 3.0;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let radius_sq = radius * radius;

        let x0 = (px - radius).floor().max(0.0) as usize;
        let y0 = (py - radius).floor().max(0.0) as usize;
        let x1 = ((px + radius).ceil().max(0.0) as usize).min(self.width - 1);
        let y1 = ((py + radius).ceil().max(0.0) as usize).min(self.height - 1);

        for y in y0..=y1 {
            let dy = y as f64 + 0.5 - py;
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - px;
                let distance_sq = dx.mul_add(dx, dy * dy);
                if distance_sq > radius_sq {
                    continue;
                }
                let contribution = weight * (-distance_sq / two_sigma_sq).exp();
                let i = y * self.width + x;
                self.raw[i] += contribution;
                if contribution > self.strongest[i] {
                    self.strongest[i] = contribution;
                    self.owners[i] = Some(index);
                }
            }
        }
    }

    pub(crate) fn finish(self, style: &HeatmapStyle) -> DensitySurface {
        let peak = self.raw.iter().copied().fold(0.0_f64, f64::max);
        let density = self
            .raw
            .iter()
            .map(|&raw| {
                if peak > 0.0 {
                    (style.intensity * raw / peak).min(1.0)
                } else {
                    0.0
                }
            })
            .collect();

        DensitySurface {
            width: self.width,
            height: self.height,
            density,
            owners: self.owners,
            threshold: style.threshold,
            ramp: style.ramp,
        }
    }
}

/// Result of one render: normalised density per pixel and the report that
/// owns each pixel.
#[derive(Debug, Clone)]
pub struct DensitySurface {
    width: usize,
    height: usize,
    density: Vec<f64>,
    owners: Vec<Option<usize>>,
    threshold: f64,
    ramp: ColorRamp,
}

impl DensitySurface {
    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn density_at(&self, x: usize, y: usize) -> f64 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.density[y * self.width + x]
    }

    fn is_lit(&self, density: f64) -> bool {
        density > 0.0 && density >= self.threshold
    }

    pub fn color_at(&self, x: usize, y: usize) -> Option<Rgb> {
        let density = self.density_at(x, y);
        self.is_lit(density).then(|| self.ramp.color_for(density))
    }

    pub fn lit_pixels(&self) -> impl Iterator<Item = LitPixel> + '_ {
        self.density
            .iter()
            .enumerate()
            .filter(|(_, &density)| self.is_lit(density))
            .map(|(i, &density)| LitPixel {
                x: i % self.width,
                y: i / self.width,
                density,
                stop: self.ramp.stop_index(density),
            })
    }

    /// Index into the rendered collection of the report dominating the pixel
    /// under `(x, y)`, if that pixel is visible.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pick(&self, x: f64, y: f64) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        let (col, row) = (x.floor() as usize, y.floor() as usize);
        if col >= self.width || row >= self.height {
            return None;
        }
        let i = row * self.width + col;
        if !self.is_lit(self.density[i]) {
            return None;
        }
        self.owners[i]
    }

    /// Number of distinct reports reachable by [`Self::pick`].
    pub fn pickable_count(&self) -> usize {
        self.density
            .iter()
            .zip(&self.owners)
            .filter(|(&density, _)| self.is_lit(density))
            .filter_map(|(_, owner)| *owner)
            .collect::<HashSet<_>>()
            .len()
    }

    pub const fn ramp(&self) -> &ColorRamp {
        &self.ramp
    }
}
