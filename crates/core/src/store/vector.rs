use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{color::Rgba, Result};

/// Vector layer stored as JSON:
///
/// ```json
/// { "features": [
///     { "type": "line", "coords": [[0.5, 0.5], [3.0, 2.5]], "color": "blue" },
///     { "type": "point", "coords": [[1.0, 1.0]] }
/// ] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorLayer {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Feature {
    Point {
        coords: Vec<[f32; 2]>,
        #[serde(default)]
        color: Option<String>,
    },
    Line {
        coords: Vec<[f32; 2]>,
        #[serde(default)]
        color: Option<String>,
    },
}

impl Feature {
    pub fn coords(&self) -> &[[f32; 2]] {
        match self {
            Feature::Point { coords, .. } | Feature::Line { coords, .. } => coords,
        }
    }

    /// Feature color, red when unset.
    pub fn color(&self) -> Result<Rgba> {
        match self {
            Feature::Point { color, .. } | Feature::Line { color, .. } => {
                color.as_deref().map_or(Ok(Rgba::RED), Rgba::parse)
            }
        }
    }
}

impl VectorLayer {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let layer: VectorLayer = serde_json::from_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            features = layer.features.len(),
            "loaded vector layer"
        );
        Ok(layer)
    }

    /// `[west, south, east, north]` over every coordinate, `None` when empty.
    pub fn bounds(&self) -> Option<[f32; 4]> {
        self.features
            .iter()
            .flat_map(|f| f.coords().iter())
            .fold(None, |acc, &[x, y]| {
                Some(match acc {
                    None => [x, y, x, y],
                    Some([w, s, e, n]) => [w.min(x), s.min(y), e.max(x), n.max(y)],
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_features() {
        let layer: VectorLayer = serde_json::from_str(
            r#"{ "features": [
                { "type": "line", "coords": [[0, 0], [4, 2]], "color": "blue" },
                { "type": "point", "coords": [[1, 3]] }
            ] }"#,
        )
        .unwrap();

        assert_eq!(layer.features.len(), 2);
        assert_eq!(layer.features[0].color().unwrap(), Rgba::rgb(0, 0, 255));
        assert_eq!(layer.features[1].color().unwrap(), Rgba::RED);
        assert_eq!(layer.bounds(), Some([0.0, 0.0, 4.0, 3.0]));
    }

    #[test]
    fn empty_layer_has_no_bounds() {
        let layer: VectorLayer = serde_json::from_str("{}").unwrap();
        assert!(layer.bounds().is_none());
    }

    #[test]
    fn bad_feature_color_is_a_parse_error() {
        let feature = Feature::Point {
            coords: vec![[0.0, 0.0]],
            color: Some("sparkly".into()),
        };
        assert!(feature.color().is_err());
    }

    #[test]
    fn load_reports_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roads.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            VectorLayer::load(&path),
            Err(crate::SceneError::Json(_))
        ));
    }
}
