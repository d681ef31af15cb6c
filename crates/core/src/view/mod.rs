use serde::{Deserialize, Serialize};

use crate::{scene::Scene, Result};

pub const DEFAULT_POSITION: (f32, f32) = (0.85, 0.85);
pub const DEFAULT_PERSPECTIVE: i32 = 40;

/// Camera state stored on the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    /// Eye height in elevation units.
    pub height: f32,
    /// Eye position over the scene region, `(0, 0)` south-west and `(1, 1)`
    /// north-east.
    pub position: (f32, f32),
    /// Rotation about the line of sight, degrees.
    pub twist: i32,
    /// Field of view, degrees.
    pub perspective: i32,
    /// Vertical scale applied to every elevation value.
    pub exaggeration: f32,
}

impl Default for Viewpoint {
    fn default() -> Self {
        Self {
            height: 0.0,
            position: DEFAULT_POSITION,
            twist: 0,
            perspective: DEFAULT_PERSPECTIVE,
            exaggeration: 1.0,
        }
    }
}

/// Requested viewpoint; `height: None` asks for the derived default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f32,
    #[serde(default = "default_position")]
    pub position: (f32, f32),
    #[serde(default)]
    pub twist: i32,
    #[serde(default = "default_perspective")]
    pub perspective: i32,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            height: None,
            exaggeration: default_exaggeration(),
            position: DEFAULT_POSITION,
            twist: 0,
            perspective: DEFAULT_PERSPECTIVE,
        }
    }
}

fn default_exaggeration() -> f32 {
    1.0
}

fn default_position() -> (f32, f32) {
    DEFAULT_POSITION
}

fn default_perspective() -> i32 {
    DEFAULT_PERSPECTIVE
}

/// Computes the default eye height for an assembled scene.
pub trait HeightDerivation {
    fn derive_height(&mut self, scene: &Scene) -> Result<f32>;
}

/// Writes `params` into the scene's viewpoint.
///
/// A missing height is derived before `params.exaggeration` is stored, so
/// the eye height does not follow the vertical scale. Must run after the
/// scene is populated.
pub fn configure_viewpoint(
    scene: &mut Scene,
    params: &ViewParams,
    derivation: &mut dyn HeightDerivation,
) -> Result<Viewpoint> {
    let height = match params.height {
        Some(height) => height,
        None => derivation.derive_height(scene)?,
    };

    scene.view.height = height;
    scene.view.exaggeration = params.exaggeration;
    scene.view.position = params.position;
    scene.view.twist = params.twist;
    scene.view.perspective = params.perspective;

    tracing::info!(
        height,
        derived = params.height.is_none(),
        exaggeration = params.exaggeration,
        x = params.position.0,
        y = params.position.1,
        twist = params.twist,
        perspective = params.perspective,
        "viewpoint configured"
    );
    Ok(scene.view)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        value: f32,
        calls: usize,
        seen_exaggeration: Option<f32>,
    }

    impl Fixed {
        fn new(value: f32) -> Self {
            Self {
                value,
                calls: 0,
                seen_exaggeration: None,
            }
        }
    }

    impl HeightDerivation for Fixed {
        fn derive_height(&mut self, scene: &Scene) -> Result<f32> {
            self.calls += 1;
            self.seen_exaggeration = Some(scene.view.exaggeration);
            Ok(self.value)
        }
    }

    #[test]
    fn explicit_height_wins_and_skips_derivation() {
        let mut scene = Scene::default();
        let mut derive = Fixed::new(1234.0);
        let params = ViewParams {
            height: Some(2500.5),
            ..ViewParams::default()
        };

        let view = configure_viewpoint(&mut scene, &params, &mut derive).unwrap();
        assert_eq!(view.height, 2500.5);
        assert_eq!(derive.calls, 0);
    }

    #[test]
    fn missing_height_uses_the_derived_value() {
        let mut scene = Scene::default();
        let mut derive = Fixed::new(1234.0);
        let params = ViewParams {
            exaggeration: 3.0,
            ..ViewParams::default()
        };

        let view = configure_viewpoint(&mut scene, &params, &mut derive).unwrap();
        assert_eq!(view.height, 1234.0);
        assert_eq!(view.exaggeration, 3.0);
        assert_eq!(derive.calls, 1);
    }

    #[test]
    fn height_is_derived_before_exaggeration_is_applied() {
        let mut scene = Scene::default();
        let mut derive = Fixed::new(1234.0);
        let params = ViewParams {
            exaggeration: 10.0,
            ..ViewParams::default()
        };

        configure_viewpoint(&mut scene, &params, &mut derive).unwrap();
        assert_eq!(derive.seen_exaggeration, Some(1.0));
        assert_eq!(scene.view.exaggeration, 10.0);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let mut scene = Scene::default();
        let params = ViewParams {
            height: Some(-10.0),
            exaggeration: 0.5,
            position: (7.0, -2.0),
            twist: 720,
            perspective: 500,
        };

        configure_viewpoint(&mut scene, &params, &mut Fixed::new(0.0)).unwrap();
        assert_eq!(
            scene.view,
            Viewpoint {
                height: -10.0,
                position: (7.0, -2.0),
                twist: 720,
                perspective: 500,
                exaggeration: 0.5,
            }
        );
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: ViewParams = serde_json::from_str(r#"{ "height": 100.0 }"#).unwrap();
        assert_eq!(
            params,
            ViewParams {
                height: Some(100.0),
                ..ViewParams::default()
            }
        );
    }
}
