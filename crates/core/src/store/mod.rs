//! Layer lookup.
//!
//! Layers are addressed by name, optionally pinned to a mapset with
//! `name@mapset`. A bare name is searched through the store's mapset search
//! path and the first hit wins.

pub mod raster;
pub mod vector;

use std::{
    collections::BTreeMap,
    fmt,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{config::StoreConfig, Result, SceneError};

pub use raster::Raster;
pub use vector::{Feature, VectorLayer};

const RASTER_EXTENSIONS: [&str; 3] = ["png", "tif", "tiff"];
const VECTOR_EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Raster,
    Vector,
}

impl LayerKind {
    fn dir_name(self) -> &'static str {
        match self {
            LayerKind::Raster => "raster",
            LayerKind::Vector => "vector",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Fully qualified storage location of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub kind: LayerKind,
    pub name: String,
    pub mapset: String,
    pub path: PathBuf,
}

impl ResolvedLocation {
    /// `name@mapset`.
    pub fn fully_qualified(&self) -> String {
        format!("{}@{}", self.name, self.mapset)
    }
}

/// Storage collaborator consulted by [`resolve`].
pub trait LayerStore {
    /// Looks a layer up without failing; `None` means absent.
    fn find(&self, kind: LayerKind, name: &str, mapset: Option<&str>) -> Option<ResolvedLocation>;
}

/// Resolves `name` (or `name@mapset`) to its storage location.
pub fn resolve(store: &dyn LayerStore, kind: LayerKind, name: &str) -> Result<ResolvedLocation> {
    let (bare, mapset) = split_qualified(name);
    let location = store
        .find(kind, bare, mapset)
        .ok_or_else(|| SceneError::not_found(kind, name))?;
    tracing::debug!(%kind, layer = %location.fully_qualified(), "resolved layer");
    Ok(location)
}

/// Splits `name@mapset` into its parts. An empty mapset counts as absent.
pub fn split_qualified(name: &str) -> (&str, Option<&str>) {
    match name.split_once('@') {
        Some((bare, mapset)) if !mapset.is_empty() => (bare, Some(mapset)),
        Some((bare, _)) => (bare, None),
        None => (name, None),
    }
}

/// In-memory registry of layers, keyed by kind and bare name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    layers: BTreeMap<(LayerKind, String), Vec<ResolvedLocation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a layer. Layers registered earlier shadow later ones with the
    /// same name when looked up without a mapset.
    pub fn register(&mut self, kind: LayerKind, name: &str, mapset: &str) -> &mut Self {
        let location = ResolvedLocation {
            kind,
            name: name.to_string(),
            mapset: mapset.to_string(),
            path: PathBuf::from(mapset).join(kind.dir_name()).join(name),
        };
        self.layers
            .entry((kind, name.to_string()))
            .or_default()
            .push(location);
        self
    }

    pub fn raster(&mut self, name: &str) -> &mut Self {
        self.register(LayerKind::Raster, name, "PERMANENT")
    }

    pub fn vector(&mut self, name: &str) -> &mut Self {
        self.register(LayerKind::Vector, name, "PERMANENT")
    }
}

impl LayerStore for MemoryStore {
    fn find(&self, kind: LayerKind, name: &str, mapset: Option<&str>) -> Option<ResolvedLocation> {
        let candidates = self.layers.get(&(kind, name.to_string()))?;
        match mapset {
            Some(mapset) => candidates.iter().find(|l| l.mapset == mapset).cloned(),
            None => candidates.first().cloned(),
        }
    }
}

/// Filesystem store laid out as `<root>/<mapset>/{raster,vector}/<name>.<ext>`.
#[derive(Debug, Clone)]
pub struct LocationStore {
    root: PathBuf,
    search_path: Vec<String>,
}

impl LocationStore {
    /// Opens a location. An empty search path means every mapset directory,
    /// in lexical order.
    pub fn open(root: impl Into<PathBuf>, search_path: Vec<String>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SceneError::msg(format!(
                "location <{}> is not a directory",
                root.display()
            )));
        }

        let search_path = if search_path.is_empty() {
            let mut mapsets = Vec::new();
            for entry in fs::read_dir(&root)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    mapsets.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
            mapsets.sort();
            mapsets
        } else {
            search_path
        };

        tracing::debug!(root = %root.display(), ?search_path, "opened location");
        Ok(Self { root, search_path })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::open(&config.location, config.mapsets.clone())
    }

    pub fn search_path(&self) -> &[String] {
        &self.search_path
    }

    /// Layers of `kind` visible through the search path, sorted by name.
    /// A name present in several mapsets is reported once, for the mapset
    /// that wins the lookup.
    pub fn list(&self, kind: LayerKind) -> Result<Vec<ResolvedLocation>> {
        let mut visible: BTreeMap<String, ResolvedLocation> = BTreeMap::new();
        for mapset in &self.search_path {
            let dir = self.root.join(mapset).join(kind.dir_name());
            if !dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                let Some(name) = layer_name(kind, &path) else {
                    continue;
                };
                visible.entry(name.clone()).or_insert(ResolvedLocation {
                    kind,
                    name,
                    mapset: mapset.clone(),
                    path,
                });
            }
        }
        Ok(visible.into_values().collect())
    }

    fn find_in(&self, kind: LayerKind, name: &str, mapset: &str) -> Option<ResolvedLocation> {
        let dir = self.root.join(mapset).join(kind.dir_name());
        let extensions: &[&str] = match kind {
            LayerKind::Raster => &RASTER_EXTENSIONS,
            LayerKind::Vector => &[VECTOR_EXTENSION],
        };
        extensions
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
            .map(|path| ResolvedLocation {
                kind,
                name: name.to_string(),
                mapset: mapset.to_string(),
                path,
            })
    }
}

impl LayerStore for LocationStore {
    fn find(&self, kind: LayerKind, name: &str, mapset: Option<&str>) -> Option<ResolvedLocation> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return None;
        }
        match mapset {
            Some(mapset) => self.find_in(kind, name, mapset),
            None => self
                .search_path
                .iter()
                .find_map(|mapset| self.find_in(kind, name, mapset)),
        }
    }
}

fn layer_name(kind: LayerKind, path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let accepted = match kind {
        LayerKind::Raster => RASTER_EXTENSIONS.contains(&ext.as_str()),
        LayerKind::Vector => ext == VECTOR_EXTENSION,
    };
    if !accepted {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}
