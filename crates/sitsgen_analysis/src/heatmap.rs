//! Heatmap rendering of normalized confusion matrices.

use std::path::Path;

use image::{ImageResult, Rgb, RgbImage};

use crate::confusion::NormalizedConfusion;

/// Heatmap layout and colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapConfig {
    /// Side of one matrix cell in pixels, grid line included.
    pub cell_size: u32,
    /// Color of a cell at 0.
    pub low: Rgb<u8>,
    /// Color of a cell at 1.
    pub high: Rgb<u8>,
    /// Color of the one pixel lines between cells.
    pub grid: Rgb<u8>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            cell_size: 32,
            low: Rgb([255, 255, 255]),
            high: Rgb([33, 150, 243]),
            grid: Rgb([200, 200, 200]),
        }
    }
}

/// Linear blend from `c1` at `t = 0` to `c2` at `t = 1`, `t` clamped to [0, 1].
pub fn interpolate_color(c1: Rgb<u8>, c2: Rgb<u8>, t: f64) -> Rgb<u8> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let blend = |a: u8, b: u8| ((1.0 - t) * f64::from(a) + t * f64::from(b)).round() as u8;
    Rgb([
        blend(c1.0[0], c2.0[0]),
        blend(c1.0[1], c2.0[1]),
        blend(c1.0[2], c2.0[2]),
    ])
}

impl NormalizedConfusion {
    /// Render as a square heatmap, true labels down the rows and predicted
    /// labels across the columns, both in `labels` order.
    pub fn to_heatmap(&self, config: &HeatmapConfig) -> RgbImage {
        let cell = config.cell_size.max(2);
        let side = self.labels.len() as u32 * cell + 1;

        RgbImage::from_fn(side, side, |x, y| {
            if x % cell == 0 || y % cell == 0 {
                return config.grid;
            }
            let value = self
                .matrix
                .get((y / cell) as usize)
                .and_then(|row| row.get((x / cell) as usize))
                .copied()
                .unwrap_or(0.0);
            interpolate_color(config.low, config.high, value)
        })
    }

    /// Render with [`to_heatmap`](Self::to_heatmap) and save to `path`,
    /// format taken from its extension.
    pub fn save_heatmap(&self, path: impl AsRef<Path>, config: &HeatmapConfig) -> ImageResult<()> {
        self.to_heatmap(config).save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confusion::confusion_matrix;

    fn config() -> HeatmapConfig {
        HeatmapConfig {
            cell_size: 4,
            ..HeatmapConfig::default()
        }
    }

    #[test]
    fn test_heatmap_layout() {
        // true 1 is always right, true 2 half of the time
        let norm = confusion_matrix(&[1, 1, 2, 1], &[1, 1, 2, 2], &[1, 2]).normalize();
        let img = norm.to_heatmap(&config());
        assert_eq!(img.dimensions(), (9, 9));

        let config = config();
        assert_eq!(*img.get_pixel(0, 0), config.grid);
        assert_eq!(*img.get_pixel(4, 2), config.grid);
        assert_eq!(*img.get_pixel(2, 2), config.high);
        assert_eq!(*img.get_pixel(6, 2), config.low);
        let half = interpolate_color(config.low, config.high, 0.5);
        assert_eq!(*img.get_pixel(2, 6), half);
        assert_eq!(*img.get_pixel(6, 6), half);
    }

    #[test]
    fn test_interpolate_color_clamps() {
        let (black, white) = (Rgb([0, 0, 0]), Rgb([255, 255, 255]));
        assert_eq!(interpolate_color(black, white, -1.0), black);
        assert_eq!(interpolate_color(black, white, 2.0), white);
        assert_eq!(interpolate_color(black, white, f64::NAN), black);
        assert_eq!(interpolate_color(black, white, 0.5), Rgb([128, 128, 128]));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confusion.png");
        let norm = confusion_matrix(&[3, 4, 4], &[3, 4, 3], &[4, 3]).normalize();
        norm.save_heatmap(&path, &config()).unwrap();

        let read = image::open(&path).unwrap().to_rgb8();
        assert_eq!(read, norm.to_heatmap(&config()));
    }
}
