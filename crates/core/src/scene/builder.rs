//! Scene assembly.
//!
//! Assembly runs in two steps. [`plan_layers`] resolves every requested name
//! and binds every surface color without touching the scene, so a missing
//! layer or a bad color aborts with the scene still empty. [`populate`] then
//! appends the planned objects in request order.

use serde::{Deserialize, Serialize};

use crate::{
    binding::{self, ColorBinding, ColorSources},
    scene::Scene,
    store::{self, LayerKind, LayerStore, ResolvedLocation},
    Result,
};

/// Layer names as requested, in priority order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerRequest {
    #[serde(default)]
    pub elevation: Vec<String>,
    #[serde(default)]
    pub vectors: Vec<String>,
    #[serde(default)]
    pub color_maps: Vec<String>,
    #[serde(default)]
    pub color_constants: Vec<String>,
}

impl LayerRequest {
    pub fn color_sources(&self) -> ColorSources<'_> {
        ColorSources::new(&self.color_maps, &self.color_constants)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSurface {
    pub elevation: ResolvedLocation,
    pub color: ColorBinding,
}

/// Fully resolved request, ready to be added to a scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPlan {
    pub surfaces: Vec<PlannedSurface>,
    pub vectors: Vec<ResolvedLocation>,
}

/// Resolves and binds every layer of `request`.
pub fn plan_layers(request: &LayerRequest, store: &dyn LayerStore) -> Result<LayerPlan> {
    let sources = request.color_sources();

    let surfaces = request
        .elevation
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let elevation = store::resolve(store, LayerKind::Raster, name)?;
            let color = binding::bind_color(index, &sources, store)?;
            Ok(PlannedSurface { elevation, color })
        })
        .collect::<Result<Vec<_>>>()?;

    let vectors = request
        .vectors
        .iter()
        .map(|name| store::resolve(store, LayerKind::Vector, name))
        .collect::<Result<Vec<_>>>()?;

    Ok(LayerPlan { surfaces, vectors })
}

/// Appends the planned layers: surfaces, then the base surface when only
/// vectors were requested, then vectors.
pub fn populate(scene: &mut Scene, plan: LayerPlan) {
    let raster_count = plan.surfaces.len();
    let vector_count = plan.vectors.len();

    for surface in plan.surfaces {
        scene.add_surface(surface.elevation, surface.color);
    }

    scene.ensure_base_surface(raster_count, vector_count);

    for vector in plan.vectors {
        scene.add_vector(vector);
    }

    tracing::info!(
        surfaces = scene.surface_count(),
        vectors = scene.vector_count(),
        "scene assembled"
    );
}
