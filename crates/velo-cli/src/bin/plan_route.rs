use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use velo_brouter::{BRouterClient, DEFAULT_BASE_URL};
use velo_cli::{outcome_tally, route_summary};
use velo_core::{EditCommand, EngineConfig, Point, Profile, RouteEditor};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// BRouter base URL
    #[arg(long, env = "BROUTER_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Routing profile id (e.g. mtb, gravel, trekking)
    #[arg(long, default_value = "mtb")]
    profile: Profile,

    /// Start point as lat,lng
    #[arg(long)]
    start: Point,

    /// End point as lat,lng
    #[arg(long)]
    end: Point,

    /// Intermediate waypoint as lat,lng (repeatable, in order)
    #[arg(long = "via")]
    via: Vec<Point>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Print the full route as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let client = BRouterClient::new(&args.url, Duration::from_secs(args.timeout))?;
    let editor: RouteEditor<BRouterClient> = RouteEditor::new(
        Arc::new(client),
        EngineConfig {
            default_profile: args.profile,
            ..EngineConfig::default()
        },
    );

    editor.submit(EditCommand::SetStart { point: args.start });
    let mut batch = editor.submit(EditCommand::SetEnd { point: args.end });
    for point in args.via {
        batch = editor
            .try_submit(EditCommand::InsertWaypoint { point, index: None })
            .with_context(|| format!("Failed to add waypoint {}", point))?;
    }
    let outcomes = editor.run(batch).await;
    tracing::debug!("Legs settled: {}", outcome_tally(&outcomes));
    let snapshot = editor.snapshot();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", route_summary(&snapshot));
    }
    Ok(())
}
