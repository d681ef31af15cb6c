//! CPU height-field renderer.
//!
//! Surfaces are triangulated per grid cell, shaded per vertex with the
//! scene's light rig and depth-tested into an RGB target. Vectors are draped
//! on the first elevation surface and drawn as depth-tested segments and
//! point markers.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use glam::{Mat4, Vec3};

use crate::{
    binding::ColorBinding,
    color::Rgba,
    light::LightRig,
    render::{Frame, RenderEngine},
    scene::{Scene, Surface},
    store::{Feature, Raster, VectorLayer},
    view::{HeightDerivation, Viewpoint},
    Result, SceneError,
};

/// Grids larger than this per side are subsampled.
const MAX_GRID_SIDE: usize = 512;
/// Cap on draped sub-segments per vector segment.
const MAX_DRAPE_STEPS: usize = 1024;
const POINT_RADIUS: i64 = 1;

#[derive(Debug, Default)]
pub struct SoftwareEngine {
    target: Option<Target>,
    rasters: HashMap<PathBuf, Raster>,
    vectors: HashMap<PathBuf, VectorLayer>,
}

impl SoftwareEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    fn preload(&mut self, scene: &Scene) -> Result<()> {
        for surface in scene.surfaces() {
            if let Some(elevation) = &surface.elevation {
                cache_raster(&mut self.rasters, &elevation.path)?;
            }
            if let Some(ColorBinding::Map(map)) = &surface.color {
                cache_raster(&mut self.rasters, &map.path)?;
            }
        }
        for vector in scene.vectors() {
            if !self.vectors.contains_key(&vector.source.path) {
                let layer = VectorLayer::load(&vector.source.path)?;
                self.vectors.insert(vector.source.path.clone(), layer);
            }
        }
        Ok(())
    }
}

fn cache_raster(cache: &mut HashMap<PathBuf, Raster>, path: &Path) -> Result<()> {
    if !cache.contains_key(path) {
        let raster = Raster::load(path)?;
        cache.insert(path.to_path_buf(), raster);
    }
    Ok(())
}

impl HeightDerivation for SoftwareEngine {
    /// Places the eye half the region's long side above the highest raw
    /// elevation. The vertical exaggeration does not enter the result.
    fn derive_height(&mut self, scene: &Scene) -> Result<f32> {
        self.preload(scene)?;
        let extent = Extent::of(scene, &self.rasters, &self.vectors);
        let height = extent.zmax + extent.longdim() / 2.0;
        tracing::debug!(
            height,
            zmin = extent.zmin,
            zmax = extent.zmax,
            longdim = extent.longdim(),
            "derived viewpoint height"
        );
        Ok(height)
    }
}

impl RenderEngine for SoftwareEngine {
    fn create_target(&mut self, width: u32, height: u32) -> Result<()> {
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                SceneError::RenderContext(format!("unusable target size {width}x{height}"))
            })?;
        self.target = Some(Target {
            width: width as usize,
            height: height as usize,
            color: vec![[0; 3]; pixels],
            depth: vec![f32::INFINITY; pixels],
        });
        Ok(())
    }

    fn release_target(&mut self) {
        self.target = None;
    }

    fn draw(&mut self, scene: &Scene) -> Result<Frame> {
        self.preload(scene)?;

        let Self {
            target,
            rasters,
            vectors,
        } = self;
        let target = target
            .as_mut()
            .ok_or_else(|| SceneError::RenderContext("no render target bound".into()))?;

        let extent = Extent::of(scene, rasters, vectors);
        let camera = Camera::new(&scene.view, &extent, target.width, target.height);
        target.clear(scene.background);

        let exag = scene.view.exaggeration;
        for surface in scene.surfaces() {
            draw_surface(target, &camera, surface, rasters, &scene.lights, exag)?;
        }

        let drape = scene
            .surfaces()
            .find_map(|s| s.elevation.as_ref())
            .and_then(|e| rasters.get(&e.path));
        let lift = ((extent.zmax - extent.zmin).abs() * exag).max(extent.longdim()) * 0.002;
        for vector in scene.vectors() {
            let Some(layer) = vectors.get(&vector.source.path) else {
                continue;
            };
            draw_vector(target, &camera, layer, drape, exag, lift)?;
        }

        target.read_back()
    }
}

#[derive(Debug)]
struct Target {
    width: usize,
    height: usize,
    color: Vec<[u8; 3]>,
    depth: Vec<f32>,
}

impl Target {
    fn clear(&mut self, background: Rgba) {
        self.color.fill([background.r, background.g, background.b]);
        self.depth.fill(f32::INFINITY);
    }

    /// Writes `color` at `(x, y)` if `depth` is nearer than what is stored.
    fn plot(&mut self, x: i64, y: i64, depth: f32, color: [u8; 3]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.color[idx] = color;
        }
    }

    fn read_back(&self) -> Result<Frame> {
        let data = self.color.iter().flatten().copied().collect();
        Frame::new(self.width as u32, self.height as u32, data)
    }
}

/// Scene region in map coordinates and the raw elevation range.
#[derive(Debug, Clone, Copy)]
struct Extent {
    west: f32,
    south: f32,
    east: f32,
    north: f32,
    zmin: f32,
    zmax: f32,
}

impl Extent {
    fn of(
        scene: &Scene,
        rasters: &HashMap<PathBuf, Raster>,
        vectors: &HashMap<PathBuf, VectorLayer>,
    ) -> Self {
        let mut region: Option<[f32; 4]> = None;
        let mut zrange: Option<(f32, f32)> = None;
        let mut widen = |z: f32| {
            zrange = Some(match zrange {
                None => (z, z),
                Some((lo, hi)) => (lo.min(z), hi.max(z)),
            });
        };

        for surface in scene.surfaces() {
            match surface.elevation.as_ref().and_then(|e| rasters.get(&e.path)) {
                Some(raster) => {
                    region = Some(union(
                        region,
                        [0.0, 0.0, raster.cols() as f32, raster.rows() as f32],
                    ));
                    widen(raster.min());
                    widen(raster.max());
                }
                None => widen(0.0),
            }
        }

        if region.is_none() {
            for vector in scene.vectors() {
                if let Some(bounds) = vectors.get(&vector.source.path).and_then(VectorLayer::bounds) {
                    region = Some(union(region, bounds));
                }
            }
        }

        let [mut west, mut south, mut east, mut north] = region.unwrap_or([0.0, 0.0, 1.0, 1.0]);
        if east - west < 1.0 {
            let mid = (west + east) / 2.0;
            (west, east) = (mid - 0.5, mid + 0.5);
        }
        if north - south < 1.0 {
            let mid = (south + north) / 2.0;
            (south, north) = (mid - 0.5, mid + 0.5);
        }
        let (zmin, zmax) = zrange.unwrap_or((0.0, 0.0));

        Self {
            west,
            south,
            east,
            north,
            zmin,
            zmax,
        }
    }

    fn longdim(&self) -> f32 {
        (self.east - self.west).max(self.north - self.south)
    }
}

fn union(acc: Option<[f32; 4]>, [w, s, e, n]: [f32; 4]) -> [f32; 4] {
    match acc {
        None => [w, s, e, n],
        Some([aw, as_, ae, an]) => [aw.min(w), as_.min(s), ae.max(e), an.max(n)],
    }
}

/// Pinhole camera looking from the viewpoint at the region centre.
#[derive(Debug, Clone, Copy)]
struct Camera {
    view_proj: Mat4,
    width: f32,
    height: f32,
    near: f32,
}

impl Camera {
    fn new(view: &Viewpoint, extent: &Extent, width: usize, height: usize) -> Self {
        let (px, py) = view.position;
        let eye = Vec3::new(
            extent.west + px * (extent.east - extent.west),
            extent.south + py * (extent.north - extent.south),
            view.height,
        );
        let focus = Vec3::new(
            (extent.west + extent.east) / 2.0,
            (extent.south + extent.north) / 2.0,
            (extent.zmin + extent.zmax) / 2.0 * view.exaggeration,
        );

        let forward = (focus - eye).try_normalize().unwrap_or(Vec3::NEG_Z);
        let up = if forward.z.abs() > 0.999 { Vec3::Y } else { Vec3::Z };
        let twist = Mat4::from_axis_angle(Vec3::Z, -(view.twist as f32).to_radians());
        let look = twist * Mat4::look_at_rh(eye, eye + forward, up);

        let near = (extent.longdim() * 1e-4).max(1e-3);
        let fov = (view.perspective as f32).clamp(1.0, 179.0).to_radians();
        let proj = Mat4::perspective_infinite_rh(fov, width as f32 / height as f32, near);

        Self {
            view_proj: proj * look,
            width: width as f32,
            height: height as f32,
            near,
        }
    }

    /// Screen position and view depth, `None` behind the near plane.
    fn project(&self, p: Vec3) -> Option<Vec3> {
        let clip = self.view_proj * p.extend(1.0);
        // w is the distance along the line of sight.
        if clip.w.is_nan() || clip.w <= self.near {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
            clip.w,
        ))
    }
}

#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    pos: Vec3,
    color: Vec3,
}

fn draw_surface(
    target: &mut Target,
    camera: &Camera,
    surface: &Surface,
    rasters: &HashMap<PathBuf, Raster>,
    lights: &LightRig,
    exag: f32,
) -> Result<()> {
    if surface.transparency == u8::MAX {
        tracing::debug!(id = surface.id.0, "skipping transparent surface");
        return Ok(());
    }
    let Some(elevation) = surface.elevation.as_ref() else {
        return Ok(());
    };
    let raster = rasters
        .get(&elevation.path)
        .ok_or_else(|| SceneError::msg(format!("raster {} not loaded", elevation.path.display())))?;
    let color_map = match &surface.color {
        Some(ColorBinding::Map(map)) => rasters.get(&map.path),
        _ => None,
    };

    let cols = sample_axis(raster.cols());
    let rows = sample_axis(raster.rows());
    let rows_f = raster.rows() as f32;
    let world = |c: usize, r: usize| {
        Vec3::new(
            c as f32 + 0.5,
            rows_f - r as f32 - 0.5,
            raster.value(c, r) * exag,
        )
    };

    let mut grid: Vec<Option<ScreenVertex>> = Vec::with_capacity(cols.len() * rows.len());
    for (ri, &r) in rows.iter().enumerate() {
        for (ci, &c) in cols.iter().enumerate() {
            let p = world(c, r);
            let (c0, c1) = (cols[ci.saturating_sub(1)], cols[(ci + 1).min(cols.len() - 1)]);
            let (r0, r1) = (rows[ri.saturating_sub(1)], rows[(ri + 1).min(rows.len() - 1)]);
            let normal = surface_normal(world(c0, r), world(c1, r), world(c, r0), world(c, r1));

            let base = match (&surface.color, color_map) {
                (Some(ColorBinding::Constant(color)), _) => *color,
                (Some(ColorBinding::Map(_)), Some(map)) => {
                    let mc = c * map.cols() / raster.cols();
                    let mr = r * map.rows() / raster.rows();
                    map.color(mc, mr)
                }
                _ => raster.color(c, r),
            };
            let shade = if lights.lights.is_empty() {
                Vec3::ONE
            } else {
                lights.shade(normal)
            };
            let color = Vec3::from(base.to_unit_rgb()) * shade;

            grid.push(camera.project(p).map(|pos| ScreenVertex { pos, color }));
        }
    }

    let stride = cols.len();
    for ri in 0..rows.len().saturating_sub(1) {
        for ci in 0..stride.saturating_sub(1) {
            let v00 = grid[ri * stride + ci];
            let v10 = grid[ri * stride + ci + 1];
            let v01 = grid[(ri + 1) * stride + ci];
            let v11 = grid[(ri + 1) * stride + ci + 1];
            if let (Some(a), Some(b), Some(c)) = (v00, v10, v11) {
                fill_triangle(target, a, b, c);
            }
            if let (Some(a), Some(b), Some(c)) = (v00, v11, v01) {
                fill_triangle(target, a, b, c);
            }
        }
    }
    Ok(())
}

/// Cell indices to use along one axis: every `step`-th cell plus the last.
fn sample_axis(len: usize) -> Vec<usize> {
    let step = len.div_ceil(MAX_GRID_SIDE).max(1);
    let mut indices: Vec<usize> = (0..len).step_by(step).collect();
    if indices.last() != Some(&(len - 1)) {
        indices.push(len - 1);
    }
    indices
}

fn surface_normal(west: Vec3, east: Vec3, north: Vec3, south: Vec3) -> Vec3 {
    let dx = east.x - west.x;
    let dy = north.y - south.y;
    let dzdx = if dx.abs() > f32::EPSILON {
        (east.z - west.z) / dx
    } else {
        0.0
    };
    let dzdy = if dy.abs() > f32::EPSILON {
        (north.z - south.z) / dy
    } else {
        0.0
    };
    Vec3::new(-dzdx, -dzdy, 1.0).try_normalize().unwrap_or(Vec3::Z)
}

fn fill_triangle(target: &mut Target, a: ScreenVertex, b: ScreenVertex, c: ScreenVertex) {
    let (ax, ay) = (a.pos.x, a.pos.y);
    let (bx, by) = (b.pos.x, b.pos.y);
    let (cx, cy) = (c.pos.x, c.pos.y);
    let area = edge(ax, ay, bx, by, cx, cy);
    if area.abs() < 1e-6 || !area.is_finite() {
        return;
    }

    let min_x = ax.min(bx).min(cx).floor().max(0.0) as i64;
    let min_y = ay.min(by).min(cy).floor().max(0.0) as i64;
    let max_x = (ax.max(bx).max(cx).ceil() as i64).min(target.width as i64 - 1);
    let max_y = (ay.max(by).max(cy).ceil() as i64).min(target.height as i64 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(bx, by, cx, cy, px, py) / area;
            let w1 = edge(cx, cy, ax, ay, px, py) / area;
            let w2 = edge(ax, ay, bx, by, px, py) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let depth = w0 * a.pos.z + w1 * b.pos.z + w2 * c.pos.z;
            let color = w0 * a.color + w1 * b.color + w2 * c.color;
            target.plot(x, y, depth, to_rgb8(color));
        }
    }
}

fn edge(ax: f32, ay: f32, bx: f32, by: f32, px: f32, py: f32) -> f32 {
    (bx - ax) * (py - ay) - (by - ay) * (px - ax)
}

fn draw_vector(
    target: &mut Target,
    camera: &Camera,
    layer: &VectorLayer,
    drape: Option<&Raster>,
    exag: f32,
    lift: f32,
) -> Result<()> {
    let ground = |x: f32, y: f32| {
        let z = drape.map_or(0.0, |r| r.sample(x, y)) * exag;
        Vec3::new(x, y, z + lift)
    };

    for feature in &layer.features {
        let color = feature.color()?;
        let rgb = [color.r, color.g, color.b];
        match feature {
            Feature::Point { coords, .. } => {
                for &[x, y] in coords {
                    if let Some(screen) = camera.project(ground(x, y)) {
                        let (sx, sy) = (screen.x.floor() as i64, screen.y.floor() as i64);
                        let depth = screen.z;
                        for dy in -POINT_RADIUS..=POINT_RADIUS {
                            for dx in -POINT_RADIUS..=POINT_RADIUS {
                                target.plot(sx + dx, sy + dy, depth * 0.999, rgb);
                            }
                        }
                    }
                }
            }
            Feature::Line { coords, .. } => {
                for pair in coords.windows(2) {
                    let ([x0, y0], [x1, y1]) = (pair[0], pair[1]);
                    let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
                    let steps = (length.ceil() as usize).clamp(1, MAX_DRAPE_STEPS);
                    let mut prev = camera.project(ground(x0, y0));
                    for i in 1..=steps {
                        let t = i as f32 / steps as f32;
                        let next = camera.project(ground(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t));
                        if let (Some(a), Some(b)) = (prev, next) {
                            draw_segment(target, a, b, rgb);
                        }
                        prev = next;
                    }
                }
            }
        }
    }
    Ok(())
}

fn draw_segment(target: &mut Target, a: Vec3, b: Vec3, rgb: [u8; 3]) {
    let Some((t0, t1)) = clip_to_target(a, b, target.width as f32, target.height as f32) else {
        return;
    };
    let (a, b) = (a.lerp(b, t0), a.lerp(b, t1));

    let delta = b - a;
    let steps = delta.x.abs().max(delta.y.abs()).ceil();
    if !steps.is_finite() {
        return;
    }
    let steps = (steps as usize).max(1);
    for i in 0..=steps {
        let p = a + delta * (i as f32 / steps as f32);
        target.plot(p.x.floor() as i64, p.y.floor() as i64, p.z * 0.999, rgb);
    }
}

/// Parameter range of `a..b` inside `[0, width] x [0, height]`
/// (Liang-Barsky), `None` when the segment misses the target.
fn clip_to_target(a: Vec3, b: Vec3, width: f32, height: f32) -> Option<(f32, f32)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let mut range = (0.0f32, 1.0f32);
    for (p, q) in [(-dx, a.x), (dx, width - a.x), (-dy, a.y), (dy, height - a.y)] {
        if !q.is_finite() || !p.is_finite() {
            return None;
        }
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            range.0 = range.0.max(r);
        } else {
            range.1 = range.1.min(r);
        }
        if range.0 > range.1 {
            return None;
        }
    }
    Some(range)
}

fn to_rgb8(c: Vec3) -> [u8; 3] {
    c.to_array().map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        light::configure_lights,
        store::{LayerKind, ResolvedLocation},
    };
    use image::{GrayImage, Luma};
    use std::fs;

    fn write_dem(dir: &Path, name: &str, size: u32, value: impl Fn(u32, u32) -> u8) -> ResolvedLocation {
        let path = dir.join(format!("{name}.png"));
        GrayImage::from_fn(size, size, |x, y| Luma([value(x, y)]))
            .save(&path)
            .unwrap();
        ResolvedLocation {
            kind: LayerKind::Raster,
            name: name.to_string(),
            mapset: "PERMANENT".to_string(),
            path,
        }
    }

    fn write_vector(dir: &Path, name: &str, json: &str) -> ResolvedLocation {
        let path = dir.join(format!("{name}.json"));
        fs::write(&path, json).unwrap();
        ResolvedLocation {
            kind: LayerKind::Vector,
            name: name.to_string(),
            mapset: "PERMANENT".to_string(),
            path,
        }
    }

    fn render(engine: &mut SoftwareEngine, scene: &Scene, w: u32, h: u32) -> Frame {
        engine.create_target(w, h).unwrap();
        let frame = engine.draw(scene).unwrap();
        engine.release_target();
        frame
    }

    #[test]
    fn derived_height_ignores_exaggeration() {
        let dir = tempfile::tempdir().unwrap();
        let dem = write_dem(dir.path(), "dem", 20, |x, _| (x * 10) as u8);
        let mut scene = Scene::default();
        scene.add_surface(dem, ColorBinding::SelfMap);
        let mut engine = SoftwareEngine::new();

        // zmax 190 + longdim 20 / 2
        assert_eq!(engine.derive_height(&scene).unwrap(), 200.0);
        scene.view.exaggeration = 10.0;
        assert_eq!(engine.derive_height(&scene).unwrap(), 200.0);
    }

    #[test]
    fn camera_centres_the_region() {
        let extent = Extent {
            west: 0.0,
            south: 0.0,
            east: 20.0,
            north: 20.0,
            zmin: 0.0,
            zmax: 10.0,
        };
        for twist in [0, 35, -90] {
            let view = Viewpoint {
                height: 100.0,
                twist,
                ..Viewpoint::default()
            };
            let camera = Camera::new(&view, &extent, 64, 32);
            let centre = camera.project(Vec3::new(10.0, 10.0, 5.0)).unwrap();
            assert!((centre.x - 32.0).abs() < 1e-2, "twist {twist}: x {}", centre.x);
            assert!((centre.y - 16.0).abs() < 1e-2, "twist {twist}: y {}", centre.y);
            assert!(centre.z > 0.0);
        }
    }

    #[test]
    fn points_behind_the_eye_are_not_projected() {
        let extent = Extent {
            west: 0.0,
            south: 0.0,
            east: 10.0,
            north: 10.0,
            zmin: 0.0,
            zmax: 0.0,
        };
        let view = Viewpoint {
            height: 20.0,
            position: (0.5, 0.5),
            ..Viewpoint::default()
        };
        let camera = Camera::new(&view, &extent, 16, 16);
        assert!(camera.project(Vec3::new(5.0, 5.0, 0.0)).is_some());
        assert!(camera.project(Vec3::new(5.0, 5.0, 40.0)).is_none());
    }

    fn blank_target(width: usize, height: usize) -> Target {
        Target {
            width,
            height,
            color: vec![[0; 3]; width * height],
            depth: vec![f32::INFINITY; width * height],
        }
    }

    #[test]
    fn long_segments_are_clipped_to_the_target() {
        let mut target = blank_target(10, 10);
        draw_segment(
            &mut target,
            Vec3::new(-1.0e6, 5.5, 1.0),
            Vec3::new(1.0e6, 5.5, 1.0),
            [255, 0, 0],
        );
        let row = &target.color[50..60];
        assert!(row.iter().all(|p| *p == [255, 0, 0]));
        assert_eq!(target.color.iter().filter(|p| **p == [255, 0, 0]).count(), 10);
    }

    #[test]
    fn segments_outside_the_target_draw_nothing() {
        let mut target = blank_target(10, 10);
        draw_segment(&mut target, Vec3::new(-50.0, -5.0, 1.0), Vec3::new(50.0, -5.0, 1.0), [255; 3]);
        draw_segment(&mut target, Vec3::new(20.0, 0.0, 1.0), Vec3::new(30.0, 9.0, 1.0), [255; 3]);
        assert!(target.color.iter().all(|p| *p == [0; 3]));
    }

    #[test]
    fn clipping_keeps_the_visible_parameter_range() {
        let (t0, t1) = clip_to_target(
            Vec3::new(-10.0, 5.0, 0.0),
            Vec3::new(30.0, 5.0, 0.0),
            20.0,
            10.0,
        )
        .unwrap();
        assert!((t0 - 0.25).abs() < 1e-6);
        assert!((t1 - 0.75).abs() < 1e-6);
        assert_eq!(
            clip_to_target(Vec3::new(2.0, 2.0, 0.0), Vec3::new(4.0, 4.0, 0.0), 10.0, 10.0),
            Some((0.0, 1.0))
        );
    }

    #[test]
    fn constant_surface_fills_the_view_from_above() {
        let dir = tempfile::tempdir().unwrap();
        let dem = write_dem(dir.path(), "flat", 16, |_, _| 0);
        let mut scene = Scene::new(Rgba::BLACK);
        scene.add_surface(dem, ColorBinding::Constant(Rgba::rgb(0, 200, 0)));
        scene.view.position = (0.5, 0.5);
        scene.view.height = 50.0;

        let mut engine = SoftwareEngine::new();
        let frame = render(&mut engine, &scene, 32, 32);
        let [r, g, b] = frame.pixel(16, 16);
        assert_eq!((r, b), (0, 0));
        assert!(g > 150, "centre should show the unlit green surface, got {g}");
        assert!(!engine.has_target());
    }

    #[test]
    fn lights_brighten_flat_ground() {
        let dir = tempfile::tempdir().unwrap();
        let dem = write_dem(dir.path(), "flat", 16, |_, _| 0);
        let mut scene = Scene::new(Rgba::BLACK);
        scene.add_surface(dem, ColorBinding::Constant(Rgba::rgb(100, 100, 100)));
        scene.view.position = (0.5, 0.5);
        scene.view.height = 50.0;
        configure_lights(&mut scene);

        let frame = render(&mut SoftwareEngine::new(), &scene, 16, 16);
        let [r, _, _] = frame.pixel(8, 8);
        assert!(r > 100, "lit ground should be brighter than its base color, got {r}");
    }

    #[test]
    fn transparent_base_surface_shows_background_and_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let roads = write_vector(
            dir.path(),
            "roads",
            r#"{ "features": [ { "type": "line", "coords": [[0, 5], [10, 5]] } ] }"#,
        );
        let mut scene = Scene::new(Rgba::WHITE);
        scene.ensure_base_surface(0, 1);
        scene.add_vector(roads);
        scene.view.position = (0.5, 0.5);
        scene.view.height = 20.0;

        let frame = render(&mut SoftwareEngine::new(), &scene, 40, 40);
        let red = frame.data.chunks(3).filter(|p| **p == [255u8, 0, 0]).count();
        let white = frame.data.chunks(3).filter(|p| **p == [255u8, 255, 255]).count();
        assert!(red > 0, "road should be drawn");
        assert_eq!(red + white, 40 * 40, "nothing but background and road");
    }

    #[test]
    fn draw_without_target_is_a_context_error() {
        let err = SoftwareEngine::new().draw(&Scene::default()).unwrap_err();
        assert!(matches!(err, SceneError::RenderContext(_)));
    }

    #[test]
    fn missing_raster_file_surfaces_as_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::default();
        scene.add_surface(
            ResolvedLocation {
                kind: LayerKind::Raster,
                name: "gone".into(),
                mapset: "PERMANENT".into(),
                path: dir.path().join("gone.png"),
            },
            ColorBinding::SelfMap,
        );
        assert!(SoftwareEngine::new().derive_height(&scene).is_err());
    }

    #[test]
    fn sample_axis_keeps_both_edges() {
        assert_eq!(sample_axis(1), [0]);
        assert_eq!(sample_axis(4), [0, 1, 2, 3]);
        let big = sample_axis(1200);
        assert_eq!(big.first(), Some(&0));
        assert_eq!(big.last(), Some(&1199));
        assert!(big.len() <= MAX_GRID_SIDE + 1);
    }
}
