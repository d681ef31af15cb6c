//! Per-surface color source selection.
//!
//! Color maps and color constants are matched to elevation layers by
//! position, maps first: layer `i` takes `color_maps[i]` when it exists,
//! otherwise `color_constants[i]` when that exists, otherwise its own
//! elevation values. The constant list is indexed by the same absolute
//! position, so with two maps and four constants the first two constants
//! are never used.

use serde::{Deserialize, Serialize};

use crate::{
    color::Rgba,
    store::{self, LayerKind, LayerStore, ResolvedLocation},
    Result,
};

/// Color source of one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorBinding {
    /// Colors come from a second raster.
    Map(ResolvedLocation),
    /// Flat color.
    Constant(Rgba),
    /// The surface's elevation raster doubles as its color source.
    SelfMap,
}

impl ColorBinding {
    pub fn kind(&self) -> BindingKind {
        match self {
            ColorBinding::Map(_) => BindingKind::Map,
            ColorBinding::Constant(_) => BindingKind::Constant,
            ColorBinding::SelfMap => BindingKind::SelfMap,
        }
    }
}

/// Discriminant of [`ColorBinding`], handy for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Map,
    Constant,
    SelfMap,
}

/// The two positional attribute lists as given on input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorSources<'a> {
    pub color_maps: &'a [String],
    pub color_constants: &'a [String],
}

impl<'a> ColorSources<'a> {
    pub fn new(color_maps: &'a [String], color_constants: &'a [String]) -> Self {
        Self {
            color_maps,
            color_constants,
        }
    }

    /// Which source applies to elevation layer `index`, without resolving
    /// or parsing anything.
    pub fn kind_for(&self, index: usize) -> BindingKind {
        if index < self.color_maps.len() {
            BindingKind::Map
        } else if index < self.color_constants.len() {
            BindingKind::Constant
        } else {
            BindingKind::SelfMap
        }
    }
}

/// Binds elevation layer `index` to its color source. Color maps are
/// resolved through `store`; constants are parsed. Either failure is fatal.
pub fn bind_color(
    index: usize,
    sources: &ColorSources<'_>,
    store: &dyn LayerStore,
) -> Result<ColorBinding> {
    let binding = match sources.kind_for(index) {
        BindingKind::Map => ColorBinding::Map(store::resolve(
            store,
            LayerKind::Raster,
            &sources.color_maps[index],
        )?),
        BindingKind::Constant => {
            ColorBinding::Constant(Rgba::parse(&sources.color_constants[index])?)
        }
        BindingKind::SelfMap => ColorBinding::SelfMap,
    };
    tracing::debug!(index, kind = ?binding.kind(), "bound surface color");
    Ok(binding)
}
