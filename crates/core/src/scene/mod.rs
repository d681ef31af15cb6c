pub mod builder;

use serde::{Deserialize, Serialize};

use crate::{
    binding::ColorBinding, color::Rgba, light::LightRig, store::ResolvedLocation, view::Viewpoint,
};

pub use builder::{plan_layers, populate, LayerPlan, LayerRequest, PlannedSurface};

/// Transparency of the synthesized base surface: fully transparent.
pub const BASE_SURFACE_TRANSPARENCY: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VectorId(pub u32);

/// Terrain surface. The synthesized base surface has neither an elevation
/// nor a color source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface {
    pub id: SurfaceId,
    pub elevation: Option<ResolvedLocation>,
    pub color: Option<ColorBinding>,
    /// 0 is opaque, 255 fully transparent.
    pub transparency: u8,
}

impl Surface {
    pub fn is_base(&self) -> bool {
        self.elevation.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorObject {
    pub id: VectorId,
    pub source: ResolvedLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SceneObject {
    Surface(Surface),
    Vector(VectorObject),
}

/// Ordered scene objects plus global render state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    objects: Vec<SceneObject>,
    next_id: u32,
    pub background: Rgba,
    pub lights: LightRig,
    pub view: Viewpoint,
}

impl Scene {
    pub fn new(background: Rgba) -> Self {
        Self {
            background,
            ..Self::default()
        }
    }

    /// Appends a surface colored by `binding`.
    pub fn add_surface(&mut self, elevation: ResolvedLocation, binding: ColorBinding) -> SurfaceId {
        let id = SurfaceId(self.fresh_id());
        tracing::debug!(
            id = id.0,
            elevation = %elevation.fully_qualified(),
            color = ?binding.kind(),
            "added surface"
        );
        self.objects.push(SceneObject::Surface(Surface {
            id,
            elevation: Some(elevation),
            color: Some(binding),
            transparency: 0,
        }));
        id
    }

    pub fn add_vector(&mut self, source: ResolvedLocation) -> VectorId {
        let id = VectorId(self.fresh_id());
        tracing::debug!(id = id.0, source = %source.fully_qualified(), "added vector");
        self.objects
            .push(SceneObject::Vector(VectorObject { id, source }));
        id
    }

    /// Adds an invisible flat surface for vectors to drape on when no
    /// elevation layer was requested. Does nothing when rasters were
    /// requested, when there are no vectors, or when a surface already
    /// exists.
    pub fn ensure_base_surface(
        &mut self,
        raster_count: usize,
        vector_count: usize,
    ) -> Option<SurfaceId> {
        if raster_count > 0 || vector_count == 0 || self.surface_count() > 0 {
            return None;
        }

        let id = SurfaceId(self.fresh_id());
        tracing::debug!(id = id.0, "synthesized transparent base surface");
        self.objects.push(SceneObject::Surface(Surface {
            id,
            elevation: None,
            color: None,
            transparency: BASE_SURFACE_TRANSPARENCY,
        }));
        Some(id)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.objects.iter().filter_map(|o| match o {
            SceneObject::Surface(s) => Some(s),
            SceneObject::Vector(_) => None,
        })
    }

    pub fn vectors(&self) -> impl Iterator<Item = &VectorObject> {
        self.objects.iter().filter_map(|o| match o {
            SceneObject::Vector(v) => Some(v),
            SceneObject::Surface(_) => None,
        })
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces().count()
    }

    pub fn vector_count(&self) -> usize {
        self.vectors().count()
    }

    fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
