//! Perimeter monitor - main entry point
//!
//! The `run` command stands in for the excluded renderer and random
//! walker: it creates one monitor agent, assigns a boundary on behalf of a
//! scripted mobile entity, reports a few positions, and logs the movement
//! directives the pipeline sends back.

use clap::{Parser, Subcommand};
use perimeter::agent::{AgentIdAllocator, MonitorAgent};
use perimeter::config::MonitorConfig;
use perimeter::observability::init_default_logging;
use perimeter::protocol::{Boundary, Message, Order, Payload, Position};
use perimeter::testing::mocks::RecordingAgent;
use std::path::PathBuf;
use std::process;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Rendezvous-pipelined monitor for autonomous spatial agents
#[derive(Parser)]
#[command(name = "perimeter")]
#[command(about = "Rendezvous-pipelined monitor for autonomous spatial agents")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted monitoring demo
    Run {
        /// Boundary radius assigned to the demo walker
        #[arg(long, default_value_t = 5)]
        radius: i32,
    },
    /// Validate configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting perimeter monitor v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run { radius } => run_demo(config, radius).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(MonitorConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations before falling back to defaults
            let default_paths = vec!["perimeter.toml", "config/perimeter.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(MonitorConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using defaults");
            Ok(MonitorConfig::default())
        }
    }
}

async fn run_demo(config: MonitorConfig, radius: i32) -> Result<(), Box<dyn std::error::Error>> {
    let allocator = AgentIdAllocator::new();

    let mut monitor = MonitorAgent::new(
        allocator.allocate(),
        Position::new(0, 0),
        config.clone(),
    );
    info!(
        agent_id = %monitor.id(),
        position = %monitor.position(),
        "created monitor agent"
    );

    // Scripted stand-in for the mobile entity: receives directives, never
    // moves on its own.
    let walker = RecordingAgent::new(allocator.allocate());

    // Boundary assignment plus a walk toward the east limit, delivered in
    // one batching window so they land in a single batch.
    let situations = vec![
        Order::Boundary(Boundary::centered_at_origin(radius)),
        Order::Position(Position::new(radius - 1, 0)),
        Order::Position(Position::new(radius, 0)),
    ];
    for order in situations {
        let message = Message::new(
            Some(walker.handle()),
            monitor.handle(),
            Payload::new(order, 0),
        );
        let status = monitor.handle().deliver(message);
        info!(status = ?status, "delivered situation to monitor");
    }

    monitor.enable()?;

    // Let the batch travel the pipeline and the directives come back.
    sleep(Duration::from_millis(10 * config.batch_interval_ms)).await;

    for directive in walker.directives() {
        info!(
            allow_north = directive.allow_north,
            allow_south = directive.allow_south,
            allow_east = directive.allow_east,
            allow_west = directive.allow_west,
            "walker received directive"
        );
    }

    monitor.disable().await?;
    Ok(())
}

fn handle_config_command(
    config: MonitorConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    info!("Configuration is valid");

    if show {
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}
