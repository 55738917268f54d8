use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use biome::scenario::{Scenario, ScenarioLoader};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless ecosystem round runner")]
struct Cli {
    /// Path to a scenario YAML file (built-in meadow when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override round count (uses scenario default when omitted)
    #[arg(long)]
    rounds: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Species to boost every round
    #[arg(long)]
    boost: Option<String>,

    /// Response index to pick whenever a disaster awaits resolution
    #[arg(long)]
    respond: Option<usize>,

    /// Print the final world snapshot as JSON
    #[arg(long)]
    snapshot: bool,
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::default_meadow(),
    };
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    init_tracing(&scenario.logging.level);

    let rounds = scenario.rounds(cli.rounds);
    let mut engine = scenario.build_engine()?;
    for _ in 0..rounds {
        if let Some(species) = &cli.boost {
            engine.choose_species(species.as_str());
        }
        let pending = engine.current_disaster().map(|disaster| disaster.title.clone());
        if let (Some(index), Some(title)) = (cli.respond, pending) {
            match engine.respond_to_disaster(index) {
                Ok(()) => info!(disaster = %title, index, "response chosen"),
                Err(err) => warn!(disaster = %title, %err, "response ignored"),
            }
        }
        let summary = engine.run_round()?;
        if summary.extinction {
            warn!(round = summary.round, "a trophic level has collapsed");
        }
    }

    println!(
        "Scenario '{}' completed {} rounds. Health: {:.2}, total population: {}",
        scenario.name,
        rounds,
        engine.health(),
        engine.world().total_population()
    );
    if cli.snapshot {
        println!("{}", serde_json::to_string_pretty(&engine.world().snapshot())?);
    }
    Ok(())
}
