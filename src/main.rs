// src/main.rs v4
//! Tile Stitcher - render the map tiles under a route into one PNG

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tile_stitcher::{
    config::StitchConfig,
    display::{NoProgress, ProgressSink, TerminalProgress},
    logging,
    render::RendererKind,
    route::Route,
    stitcher::{plan_route, StitchOptions, Stitcher},
};

#[derive(Parser)]
#[command(name = "tile-stitcher", version)]
#[command(about = "Stitch the map tiles covering a route into one PNG", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Also write the log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Config file (default: ~/.config/tile-stitcher/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct RouteArgs {
    /// Route file (.geojson, .csv or .json); the built-in demo route if omitted
    #[arg(long)]
    route: Option<PathBuf>,

    /// Zoom level (0-20)
    #[arg(long)]
    zoom: Option<u8>,

    /// Tile edge in pixels
    #[arg(long)]
    tile_size: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Render the route image
    Render {
        #[command(flatten)]
        route: RouteArgs,

        /// Tile source
        #[arg(long, value_enum)]
        renderer: Option<RendererKind>,

        /// Pre-rendered {zoom}/{x}/{y}.png tile directory
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Theme JSON for the pattern renderer
        #[arg(long)]
        theme: Option<PathBuf>,

        /// Output PNG path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a JSON render report here
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the tile plan without rendering
    Plan {
        #[command(flatten)]
        route: RouteArgs,
    },
    /// Show or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(
        logging::level_for(cli.verbose, cli.quiet),
        cli.log_file.as_deref(),
    )
    .context("Failed to initialise logging")?;

    match cli.command {
        Command::Render {
            route,
            renderer,
            dataset,
            theme,
            output,
            report,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            apply_route_args(&mut config, &route);
            config.override_renderer(renderer, dataset, theme)?;
            if let Some(output) = output {
                config.output = output;
            }
            config.validate()?;

            let route = load_route(route.route.as_deref())?;
            let renderer = config
                .renderer_config()
                .create()
                .context("Failed to create tile renderer")?;
            let progress: Arc<dyn ProgressSink> = if cli.quiet {
                Arc::new(NoProgress)
            } else {
                Arc::new(TerminalProgress::stdout())
            };

            let summary = Stitcher::new(renderer, StitchOptions::from(&config))
                .with_progress(progress)
                .run(&route, &config.output)
                .await
                .with_context(|| format!("Failed to render {}", config.output.display()))?;

            if let Some(path) = report {
                summary
                    .write_json(&path)
                    .with_context(|| format!("Failed to write report {}", path.display()))?;
            }
        }
        Command::Plan { route } => {
            let mut config = load_config(cli.config.as_deref())?;
            apply_route_args(&mut config, &route);
            let route = load_route(route.route.as_deref())?;
            let plan = plan_route(&route, config.zoom, config.tile_size)?;

            println!("Route:   {} ({} points)", route.name, route.len());
            println!("First:   {}", plan.first);
            println!("Last:    {}", plan.last);
            println!("Grid:    {}x{} tiles", plan.columns, plan.rows);
            if let Some((width, height)) = plan.pixel_dimensions(config.tile_size) {
                println!("Image:   {}x{} px", width, height);
            }
            for cell in plan.cells() {
                println!("  [{:>3},{:>3}] {}", cell.col, cell.row, cell.tile);
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                let config = load_config(cli.config.as_deref())?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Init { force } => {
                let path = match cli.config {
                    Some(path) => path,
                    None => StitchConfig::config_path()?,
                };
                if path.exists() && !force {
                    bail!("{} already exists, use --force to overwrite", path.display());
                }
                StitchConfig::default().save_to(&path)?;
                println!("Wrote {}", path.display());
            }
        },
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<StitchConfig> {
    match path {
        Some(path) => StitchConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => StitchConfig::load().context("Failed to load config"),
    }
}

fn apply_route_args(config: &mut StitchConfig, args: &RouteArgs) {
    if let Some(zoom) = args.zoom {
        config.zoom = zoom;
    }
    if let Some(tile_size) = args.tile_size {
        config.tile_size = tile_size;
    }
}

fn load_route(path: Option<&Path>) -> anyhow::Result<Route> {
    match path {
        Some(path) => {
            Route::load(path).with_context(|| format!("Failed to load route {}", path.display()))
        }
        None => Ok(Route::demo()),
    }
}
