//! One-shot render pipeline.
//!
//! resolve and bind → build scene → lights and viewpoint → render → encode.
//! Every stage returns a [`Result`]; the render context is scoped so it is
//! released whichever stage fails.

use std::path::PathBuf;

use crate::{
    config::AppConfig,
    light,
    output::{self, FrameEncoder},
    render::{RenderContext, RenderEngine},
    scene::{self, Scene},
    store::LayerStore,
    view, Result,
};

/// Collaborators the pipeline drives.
pub struct Collaborators<'a> {
    pub store: &'a dyn LayerStore,
    pub engine: &'a mut dyn RenderEngine,
    pub encoder: &'a mut dyn FrameEncoder,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct RunReport {
    pub output: PathBuf,
    pub scene: Scene,
}

/// Runs the whole pipeline for `config`, returning the written file.
pub fn run(config: &AppConfig, collaborators: Collaborators<'_>) -> Result<RunReport> {
    let Collaborators {
        store,
        engine,
        encoder,
    } = collaborators;

    let spec = config.output.to_spec()?;
    let background = config.view.background()?;

    let plan = scene::plan_layers(&config.layers, store)?;
    tracing::info!(
        surfaces = plan.surfaces.len(),
        vectors = plan.vectors.len(),
        "layers resolved"
    );

    let mut ctx = RenderContext::acquire(engine, spec.width, spec.height)?;

    let mut scene = Scene::new(background);
    scene::populate(&mut scene, plan);
    light::configure_lights(&mut scene);
    view::configure_viewpoint(&mut scene, &config.view.params, &mut ctx)?;

    let frame = ctx.render(&scene)?;
    let output = output::encode(encoder, &frame, &spec)?;
    drop(ctx);

    tracing::info!(output = %output.display(), "done");
    Ok(RunReport { output, scene })
}
