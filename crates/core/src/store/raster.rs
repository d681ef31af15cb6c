use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::{
    color::{self, Rgba},
    Result, SceneError,
};

/// Decoded raster layer.
///
/// Cell `(col, row)` covers `[col, col + 1] x [rows - row - 1, rows - row]`
/// in map coordinates: row 0 is the northern edge.
#[derive(Debug, Clone)]
pub struct Raster {
    cols: usize,
    rows: usize,
    values: Vec<f32>,
    rgb: Option<Vec<[u8; 3]>>,
    min: f32,
    max: f32,
}

impl Raster {
    /// Builds a single-channel raster from row-major values.
    pub fn from_values(cols: usize, rows: usize, values: Vec<f32>) -> Result<Self> {
        if cols == 0 || rows == 0 || values.len() != cols * rows {
            return Err(SceneError::msg(format!(
                "raster of {cols}x{rows} cells cannot hold {} values",
                values.len()
            )));
        }
        let (min, max) = value_range(&values);
        Ok(Self {
            cols,
            rows,
            values,
            rgb: None,
            min,
            max,
        })
    }

    /// Decodes a raster file. Grayscale images are read as data values;
    /// color images additionally keep their pixels for direct coloring.
    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path)?;
        let raster = Self::from_image(&image)?;
        tracing::debug!(
            path = %path.display(),
            cols = raster.cols,
            rows = raster.rows,
            min = raster.min,
            max = raster.max,
            "loaded raster"
        );
        Ok(raster)
    }

    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let (cols, rows) = (width as usize, height as usize);

        let values = match image {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => image
                .to_luma8()
                .into_raw()
                .into_iter()
                .map(f32::from)
                .collect(),
            DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => image
                .to_luma16()
                .into_raw()
                .into_iter()
                .map(f32::from)
                .collect(),
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                image.to_luma32f().into_raw()
            }
            _ => image
                .to_luma8()
                .into_raw()
                .into_iter()
                .map(f32::from)
                .collect(),
        };

        let mut raster = Self::from_values(cols, rows, values)?;
        if image.color().has_color() {
            raster.rgb = Some(
                image
                    .to_rgb8()
                    .pixels()
                    .map(|p| p.0)
                    .collect(),
            );
        }
        Ok(raster)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn value(&self, col: usize, row: usize) -> f32 {
        self.values[self.index(col, row)]
    }

    /// Display color of a cell: stored pixel for color rasters, the value
    /// ramp otherwise.
    pub fn color(&self, col: usize, row: usize) -> Rgba {
        let idx = self.index(col, row);
        match &self.rgb {
            Some(rgb) => {
                let [r, g, b] = rgb[idx];
                Rgba::rgb(r, g, b)
            }
            None => color::ramp(self.values[idx], self.min, self.max),
        }
    }

    /// Bilinear elevation at map coordinates, clamped to the raster edge.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let fx = (x - 0.5).clamp(0.0, (self.cols - 1) as f32);
        let fy = (self.rows as f32 - y - 0.5).clamp(0.0, (self.rows - 1) as f32);
        let (c0, r0) = (fx.floor() as usize, fy.floor() as usize);
        let (c1, r1) = ((c0 + 1).min(self.cols - 1), (r0 + 1).min(self.rows - 1));
        let (tx, ty) = (fx - c0 as f32, fy - r0 as f32);

        let top = lerp(self.value(c0, r0), self.value(c1, r0), tx);
        let bottom = lerp(self.value(c0, r1), self.value(c1, r1), tx);
        lerp(top, bottom, ty)
    }

    fn index(&self, col: usize, row: usize) -> usize {
        row.min(self.rows - 1) * self.cols + col.min(self.cols - 1)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn value_range(values: &[f32]) -> (f32, f32) {
    let mut finite = values.iter().copied().filter(|v| v.is_finite());
    let Some(first) = finite.next() else {
        return (0.0, 0.0);
    };
    finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
