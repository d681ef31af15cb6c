use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    color::Rgba,
    output::OutputSpec,
    scene::LayerRequest,
    view::ViewParams,
    Result,
};

/// Top-level configuration for one render run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub layers: LayerRequest,
    #[serde(default)]
    pub view: ViewConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

/// Where layers are looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub location: PathBuf,
    /// Mapset search path; empty means every mapset in lexical order.
    #[serde(default)]
    pub mapsets: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: PathBuf::from("."),
            mapsets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(flatten)]
    pub params: ViewParams,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            params: ViewParams::default(),
        }
    }
}

impl ViewConfig {
    pub fn background(&self) -> Result<Rgba> {
        Rgba::parse(&self.background)
    }
}

fn default_background() -> String {
    "white".to_string()
}

/// Output settings as given; validated by [`OutputConfig::to_spec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    pub path: PathBuf,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            path: PathBuf::from("terrascene"),
            format: default_format(),
        }
    }
}

impl OutputConfig {
    pub fn to_spec(&self) -> Result<OutputSpec> {
        OutputSpec::new(self.width, self.height, &self.path, &self.format)
    }
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

fn default_format() -> String {
    "ppm".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{output::OutputFormat, SceneError};

    #[test]
    fn minimal_json_fills_in_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "layers": { "vectors": ["roads"] },
                "output": { "path": "out/roads" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.layers.vectors, ["roads"]);
        assert!(config.layers.elevation.is_empty());
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.view, ViewConfig::default());
        assert_eq!(config.view.background().unwrap(), Rgba::WHITE);

        let spec = config.output.to_spec().unwrap();
        assert_eq!((spec.width, spec.height), (640, 480));
        assert_eq!(spec.format, OutputFormat::Ppm);
    }

    #[test]
    fn view_parameters_are_flattened() {
        let config: ViewConfig = serde_json::from_str(
            r#"{ "background": "black", "height": 900.0, "exaggeration": 2.5, "twist": 15 }"#,
        )
        .unwrap();
        assert_eq!(config.params.height, Some(900.0));
        assert_eq!(config.params.exaggeration, 2.5);
        assert_eq!(config.params.twist, 15);
        assert_eq!(config.params.perspective, 40);
        assert_eq!(config.background().unwrap(), Rgba::BLACK);
    }

    #[test]
    fn unsupported_format_surfaces_when_validating_output() {
        let output = OutputConfig {
            format: "gif".into(),
            ..OutputConfig::default()
        };
        assert!(matches!(output.to_spec(), Err(SceneError::UnsupportedFormat(_))));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(
            &path,
            r#"{ "store": { "location": "/data/loc", "mapsets": ["PERMANENT"] },
                 "output": { "path": "x", "format": "tif" } }"#,
        )
        .unwrap();

        let config = AppConfig::from_json_file(&path).unwrap();
        assert_eq!(config.store.location, PathBuf::from("/data/loc"));
        assert_eq!(config.store.mapsets, ["PERMANENT"]);
        assert_eq!(config.output.format, "tif");
    }

    #[test]
    fn missing_output_section_is_rejected() {
        assert!(serde_json::from_str::<AppConfig>("{}").is_err());
    }
}
