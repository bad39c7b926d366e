use anyhow::Result;
use clap::{Parser, Subcommand};
use mapkit::{BufferedTrace, TraceLevel};
use mapkit_bootstrap::{AppConfig, CliArgs, ConfigSection, FileSystemService, HostPathResolver, LocalFileSystem};
use mimalloc::MiMalloc;

use std::path::{Path, PathBuf};
use std::sync::Arc;

mod composition;
mod frame_loop;
mod registered_plugins;

use frame_loop::{run_frames, FrameLoopOptions};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// MapKit Host - headless host for the map engine bootstrap
#[derive(Parser)]
#[command(name = "mapkit-host")]
#[command(about = "MapKit Host - headless host for the map engine bootstrap")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Engine settings file, relative to the data directory (overrides config)
    #[arg(short, long)]
    settings: Option<String>,

    /// Frame rate of the host loop (overrides config)
    #[arg(short, long)]
    frame_rate: Option<u32>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Stop after this many frames (default: run until Ctrl+C)
    #[arg(long)]
    frames: Option<u64>,

    /// Distance the simulated avatar moves per step
    #[arg(long, default_value_t = 5.0)]
    speed: f32,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the engine and run the frame loop
    Run,
    /// Validate configuration and settings, then exit
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        settings: cli.settings.clone(),
        frame_rate: cli.frame_rate,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (MAPKIT__*) -> 4) CLI overrides
    // Also normalizes + creates host.home_dir.
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    mapkit_bootstrap::init_logging_unified(&logging_config, Path::new(&config.host.home_dir));

    tracing::info!("MapKit host starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_host(config, cli.frames, cli.speed),
        Commands::Check => check_config(config),
    }
}

fn run_host(config: AppConfig, max_frames: Option<u64>, speed: f32) -> Result<()> {
    let trace = Arc::new(BufferedTrace::new(config.host.trace_capacity));

    let result = composition::compose(&config, Arc::clone(&trace)).and_then(|mut runner| {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let stats = rt.block_on(run_frames(
            &runner,
            FrameLoopOptions {
                frame_rate: config.host.frame_rate,
                max_frames,
                speed,
            },
        ));
        runner.shutdown()?;
        println!(
            "Ran {} frames, {} position updates",
            stats.frames, stats.updates
        );
        Ok(())
    });

    for record in trace.records_at_least(TraceLevel::Error) {
        eprintln!("{record}");
    }
    result
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration…");
    let fs = LocalFileSystem::new(Arc::new(HostPathResolver::new(config.data_dir())));
    if !fs.exists(&config.host.settings_file) {
        anyhow::bail!(
            "settings file '{}' not found under '{}'",
            config.host.settings_file,
            config.data_dir().display()
        );
    }
    let settings = ConfigSection::load(&config.host.settings_file, &fs)?;
    println!("Configuration is valid");
    println!("Settings sections: {}", settings.keys().join(", "));
    println!("{}", config.to_yaml()?);
    Ok(())
}
