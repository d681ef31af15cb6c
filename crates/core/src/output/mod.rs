use std::{
    fmt,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    str::FromStr,
};

use image::{
    codecs::{
        pnm::{PnmEncoder, PnmSubtype, SampleEncoding},
        tiff::TiffEncoder,
    },
    ExtendedColorType, ImageEncoder as _,
};
use serde::{Deserialize, Serialize};

use crate::{render::Frame, Result, SceneError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Ppm,
    Tiff,
}

impl OutputFormat {
    /// File extension appended to the output path.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Ppm => "ppm",
            OutputFormat::Tiff => "tif",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SceneError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "ppm" => Ok(OutputFormat::Ppm),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            _ => Err(SceneError::UnsupportedFormat(tag.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Validated output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub width: u32,
    pub height: u32,
    /// Path without extension.
    pub path: PathBuf,
    pub format: OutputFormat,
}

impl OutputSpec {
    /// Validates the size and the format tag.
    pub fn new(width: u32, height: u32, path: impl Into<PathBuf>, format: &str) -> Result<Self> {
        let format = format.parse::<OutputFormat>()?;
        if width == 0 || height == 0 {
            return Err(SceneError::InvalidOutput(format!(
                "image size must be positive, got {width}x{height}"
            )));
        }
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(SceneError::InvalidOutput("output path is empty".into()));
        }
        Ok(Self {
            width,
            height,
            path,
            format,
        })
    }

    /// `<path>.<ext>`; the extension is appended, never substituted.
    pub fn file_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".");
        name.push(self.format.extension());
        PathBuf::from(name)
    }
}

/// Encoding collaborator: one method per supported format.
pub trait FrameEncoder {
    fn write_ppm(&mut self, frame: &Frame, path: &Path) -> Result<()>;
    fn write_tiff(&mut self, frame: &Frame, path: &Path) -> Result<()>;
}

/// Writes `frame` to [`OutputSpec::file_path`] with the encoder matching the
/// `spec.format`. A failed write removes whatever was left on disk.
pub fn encode(encoder: &mut dyn FrameEncoder, frame: &Frame, spec: &OutputSpec) -> Result<PathBuf> {
    let path = spec.file_path();
    tracing::info!(path = %path.display(), format = %spec.format, "writing image");

    let written = match spec.format {
        OutputFormat::Ppm => encoder.write_ppm(frame, &path),
        OutputFormat::Tiff => encoder.write_tiff(frame, &path),
    };

    if let Err(err) = written {
        if path.exists() {
            if let Err(cleanup) = fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), %cleanup, "could not remove partial output");
            }
        }
        return Err(err);
    }
    Ok(path)
}

/// [`FrameEncoder`] backed by the `image` codecs: binary PPM (P6) and
/// uncompressed RGB TIFF.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageEncoder;

impl FrameEncoder for ImageEncoder {
    fn write_ppm(&mut self, frame: &Frame, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        PnmEncoder::new(writer)
            .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
            .write_image(&frame.data, frame.width, frame.height, ExtendedColorType::Rgb8)?;
        Ok(())
    }

    fn write_tiff(&mut self, frame: &Frame, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        TiffEncoder::new(writer).write_image(
            &frame.data,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(())
    }
}
