use std::{path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use terrascene_core::{
    AppConfig, Collaborators, ImageEncoder, LayerKind, LayerRequest, LocationStore, OutputConfig,
    SoftwareEngine, StoreConfig, ViewConfig, ViewParams,
};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render(args) => run_render(&args.into_config()),
        Commands::Batch { config } => AppConfig::from_json_file(&config).and_then(|c| run_render(&c)),
        Commands::Layers(store) => run_layers(&store.into_config()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "aborting");
            eprintln!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_render(config: &AppConfig) -> terrascene_core::Result<()> {
    tracing::info!(
        location = %config.store.location.display(),
        elevation = ?config.layers.elevation,
        vectors = ?config.layers.vectors,
        "starting render"
    );

    let store = LocationStore::from_config(&config.store)?;
    let mut engine = SoftwareEngine::new();
    let mut encoder = ImageEncoder;

    let report = terrascene_core::run(
        config,
        Collaborators {
            store: &store,
            engine: &mut engine,
            encoder: &mut encoder,
        },
    )?;
    println!("{}", report.output.display());
    Ok(())
}

fn run_layers(config: &StoreConfig) -> terrascene_core::Result<()> {
    let store = LocationStore::from_config(config)?;
    for kind in [LayerKind::Raster, LayerKind::Vector] {
        for layer in store.list(kind)? {
            println!("{kind}\t{}", layer.fully_qualified());
        }
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Off-screen 3-D terrain renderer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render raster and vector layers to an image file.
    Render(RenderArgs),
    /// Render from a JSON run configuration.
    Batch {
        /// Path to the configuration file.
        config: PathBuf,
    },
    /// List the layers visible in a location.
    Layers(StoreArgs),
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// Location directory holding the mapsets.
    #[arg(long, env = "TERRASCENE_LOCATION", default_value = ".")]
    location: PathBuf,

    /// Mapset search path, in lookup order. Defaults to every mapset.
    #[arg(long = "mapset", value_delimiter = ',')]
    mapsets: Vec<String>,
}

impl StoreArgs {
    fn into_config(self) -> StoreConfig {
        StoreConfig {
            location: self.location,
            mapsets: self.mapsets,
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Raster layers used as surface elevation.
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    elevation: Vec<String>,

    /// Vector layers draped over the surfaces.
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    vector: Vec<String>,

    /// Raster layers used for surface color, matched to elevation layers by position.
    #[arg(long = "color-map", num_args = 1.., value_delimiter = ',')]
    color_map: Vec<String>,

    /// Surface colors, matched by position once the color maps run out.
    #[arg(long = "color-const", num_args = 1.., value_delimiter = ',')]
    color_const: Vec<String>,

    /// Background color.
    #[arg(long, default_value = "white")]
    background: String,

    /// Viewpoint height; derived from the scene when omitted.
    #[arg(long)]
    height: Option<f32>,

    /// Vertical exaggeration.
    #[arg(long, default_value_t = 1.0)]
    exag: f32,

    /// Viewpoint position (x y) in [0, 1] scene space.
    #[arg(long, num_args = 2, value_names = ["X", "Y"], default_values_t = [0.85, 0.85], allow_negative_numbers = true)]
    position: Vec<f32>,

    /// Twist angle in degrees.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    twist: i32,

    /// Field of view in degrees.
    #[arg(long, default_value_t = 40)]
    perspective: i32,

    /// Output image size in pixels.
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"], default_values_t = [640, 480])]
    size: Vec<u32>,

    /// Output path; the format extension is appended.
    #[arg(long)]
    output: PathBuf,

    /// Output format (ppm or tif).
    #[arg(long, default_value = "ppm")]
    format: String,
}

impl RenderArgs {
    fn into_config(self) -> AppConfig {
        AppConfig {
            store: self.store.into_config(),
            layers: LayerRequest {
                elevation: self.elevation,
                vectors: self.vector,
                color_maps: self.color_map,
                color_constants: self.color_const,
            },
            view: ViewConfig {
                background: self.background,
                params: ViewParams {
                    height: self.height,
                    exaggeration: self.exag,
                    position: (self.position[0], self.position[1]),
                    twist: self.twist,
                    perspective: self.perspective,
                },
            },
            output: OutputConfig {
                width: self.size[0],
                height: self.size[1],
                path: self.output,
                format: self.format,
            },
        }
    }
}
