use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sandfall_common::Material;
use sandfall_kernel::{MovePolicy, Scene, Simulation};
use sandfall_tools::{GridInspector, MaterialCensus};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sandfall-cli", about = "Headless falling-sand simulation driver")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the material table
    Info,
    /// Run a scene loaded from a YAML file
    Run {
        /// Scene file
        scene: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run the built-in demo scene
    Demo {
        #[arg(long, default_value = "64")]
        width: usize,
        #[arg(long, default_value = "48")]
        height: usize,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Number of ticks to simulate
    #[arg(short, long, default_value = "100")]
    ticks: u64,
    /// Override the scene's RNG seed
    #[arg(short, long)]
    seed: Option<u64>,
    /// Override the scene's move policy
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    /// Log a summary every N ticks (0 disables)
    #[arg(long, default_value = "0")]
    every: u64,
    /// Print the final grid as glyphs
    #[arg(long)]
    dump: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Conserve,
    LastWriteWins,
}

impl From<PolicyArg> for MovePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Conserve => MovePolicy::Conserve,
            PolicyArg::LastWriteWins => MovePolicy::LastWriteWins,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("sandfall-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "{:<6} {:<6} {:>7} {:<8} {:<9} {:<7} {:<10} {:<9}",
                "glyph", "name", "density", "color", "flammable", "spreads", "evaporates", "corrosive"
            );
            for m in Material::ALL {
                let d = m.descriptor();
                println!(
                    "{:<6} {:<6} {:>7} {:<8} {:<9} {:<7} {:<10} {:<9}",
                    m.glyph(),
                    d.name,
                    d.density,
                    d.display_color,
                    d.flammable,
                    d.spreads,
                    d.evaporates,
                    d.corrosive
                );
            }
        }
        Commands::Run { scene, run } => {
            let scene = load_scene(&scene)?;
            simulate(scene, &run)?;
        }
        Commands::Demo { width, height, run } => {
            simulate(Scene::demo(width, height), &run)?;
        }
    }

    Ok(())
}

fn load_scene(path: &Path) -> anyhow::Result<Scene> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scene {}", path.display()))?;
    let scene: Scene = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing scene {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        width = scene.width,
        height = scene.height,
        fills = scene.fills.len(),
        "loaded scene"
    );
    Ok(scene)
}

fn simulate(mut scene: Scene, run: &RunArgs) -> anyhow::Result<()> {
    if let Some(seed) = run.seed {
        scene.seed = seed;
    }
    if let Some(policy) = run.policy {
        scene.policy = policy.into();
    }
    let mut sim: Simulation = scene.simulation().context("building scene")?;
    let initial = MaterialCensus::of(sim.grid());
    tracing::info!("{}", GridInspector::summary(&sim));

    for _ in 0..run.ticks {
        sim.step();
        if run.every > 0 && sim.tick() % run.every == 0 {
            tracing::info!("{}", GridInspector::summary(&sim));
        }
    }

    let summary = GridInspector::summary(&sim);
    println!("{summary}");
    let delta = summary.census.delta(&initial);
    if !delta.is_empty() {
        let changes: Vec<String> = delta.iter().map(|(m, d)| format!("{m}{d:+}")).collect();
        println!("Change since tick 0: {}", changes.join(" "));
    }
    if run.dump {
        print!("{}", GridInspector::glyphs(sim.grid()));
    }
    Ok(())
}
