use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::Scene;

/// Light source. A `w` of 0 in `position` makes the light directional,
/// shining from `(x, y, z)` towards the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: [f32; 4],
    pub brightness: f32,
    pub color: [f32; 3],
    pub ambient: [f32; 3],
}

impl Light {
    pub fn is_directional(&self) -> bool {
        self.position[3] == 0.0
    }

    /// Unit vector pointing from the surface towards the light.
    pub fn direction(&self) -> Vec3 {
        let [x, y, z, _] = self.position;
        Vec3::new(x, y, z).try_normalize().unwrap_or(Vec3::Z)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightRig {
    pub lights: Vec<Light>,
}

impl LightRig {
    /// Key light from the south-east plus a weaker overhead fill.
    pub fn standard() -> Self {
        Self {
            lights: vec![
                Light {
                    position: [0.68, -0.68, 0.80, 0.0],
                    brightness: 0.8,
                    color: [1.0, 1.0, 1.0],
                    ambient: [0.2, 0.2, 0.2],
                },
                Light {
                    position: [0.0, 0.0, 1.0, 0.0],
                    brightness: 0.5,
                    color: [1.0, 1.0, 1.0],
                    ambient: [0.3, 0.3, 0.3],
                },
            ],
        }
    }

    /// Lit color multiplier for a surface with unit normal `normal`.
    pub fn shade(&self, normal: Vec3) -> Vec3 {
        self.lights.iter().fold(Vec3::ZERO, |acc, light| {
            let diffuse = normal.dot(light.direction()).max(0.0);
            acc + Vec3::from(light.ambient) + light.brightness * diffuse * Vec3::from(light.color)
        })
    }
}

/// Installs the fixed two-light rig on the scene.
pub fn configure_lights(scene: &mut Scene) {
    scene.lights = LightRig::standard();
    tracing::debug!(lights = scene.lights.lights.len(), "light rig installed");
}
