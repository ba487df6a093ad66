//! morphognosis: train, query and inspect metamorph stores from step files.
//!
//! Usage:
//!   morphognosis init-config -o morphognosis.toml
//!   morphognosis train --steps steps.csv --store store.bin
//!   morphognosis query --steps steps.csv --store store.bin --driver goal-seeking
//!   morphognosis export --store store.bin --output dataset.csv
//!   morphognosis inspect --store store.bin --node 0

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use morphognosis::config::Config;
use morphognosis::{dataset, steps, Agent, Driver, MetamorphStore};

#[derive(Parser)]
#[command(
    name = "morphognosis",
    about = "Morphognostic descriptors and metamorph causal memory",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (defaults are used when absent)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record every step of a step file into a store
    Train {
        /// Step file: response,goal_value,x,y,v0,v1,...
        #[arg(long)]
        steps: PathBuf,
        /// Store file to write
        #[arg(long)]
        store: PathBuf,
        /// Extend the existing store instead of starting empty
        #[arg(long, default_value_t = false)]
        append: bool,
    },
    /// Print the response the store chooses for every step
    Query {
        #[arg(long)]
        steps: PathBuf,
        #[arg(long)]
        store: PathBuf,
        #[arg(long, value_enum, default_value_t = QueryDriver::Db)]
        driver: QueryDriver,
    },
    /// Write the flattened dataset as CSV
    Export {
        #[arg(long)]
        store: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Summarize a store, or dump one node in full
    Inspect {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        node: Option<usize>,
    },
    /// Print or write the default configuration
    InitConfig {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum QueryDriver {
    /// Nearest stored descriptor
    Db,
    /// Nearest-neighbor predictor fitted on the store
    Nn,
    /// Nearest stored descriptor, highest goal value on ties
    GoalSeeking,
}

impl From<QueryDriver> for Driver {
    fn from(driver: QueryDriver) -> Self {
        match driver {
            QueryDriver::Db => Self::MetamorphDb,
            QueryDriver::Nn => Self::MetamorphNn,
            QueryDriver::GoalSeeking => Self::GoalSeekingDb,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "morphognosis=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Train {
            steps,
            store,
            append,
        } => train(&config, &steps, &store, append),
        Commands::Query {
            steps,
            store,
            driver,
        } => query(&config, &steps, &store, driver.into()),
        Commands::Export { store, output } => {
            let store = load_store(&config, &store)?;
            dataset::export(&store, &output)?;
            Ok(())
        }
        Commands::Inspect { store, node } => inspect(&config, &store, node),
        Commands::InitConfig { output } => {
            let text = config.to_toml();
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("Wrote config to {}", path.display());
                }
                None => print!("{text}"),
            }
            Ok(())
        }
    }
}

fn load_store(config: &Config, path: &Path) -> anyhow::Result<MetamorphStore> {
    let mut reader = BufReader::new(
        File::open(path).with_context(|| format!("opening store {}", path.display()))?,
    );
    Ok(MetamorphStore::load(&mut reader, config.store.clone())?)
}

fn read_steps(path: &Path) -> anyhow::Result<Vec<Vec<steps::Step>>> {
    let file = File::open(path).with_context(|| format!("opening steps {}", path.display()))?;
    Ok(steps::read_episodes(BufReader::new(file))?)
}

fn train(config: &Config, steps: &Path, store: &Path, append: bool) -> anyhow::Result<()> {
    let episodes = read_steps(steps)?;
    let mut agent = Agent::from_config(config)?;
    if append && store.exists() {
        agent.metamorphs = load_store(config, store)?;
    }
    agent.driver = Driver::TrainingOverride;

    for episode in &episodes {
        agent.reset();
        for step in episode {
            agent.cycle(&step.values, step.x, step.y, Some(step.response), step.goal_value)?;
        }
    }
    info!(
        episodes = episodes.len(),
        nodes = agent.metamorphs.len(),
        "training finished"
    );

    let mut writer = BufWriter::new(
        File::create(store).with_context(|| format!("creating store {}", store.display()))?,
    );
    agent.metamorphs.save(&mut writer)?;
    Ok(())
}

fn query(config: &Config, steps: &Path, store: &Path, driver: Driver) -> anyhow::Result<()> {
    let episodes = read_steps(steps)?;
    let mut agent = Agent::from_config(config)?;
    agent.metamorphs = load_store(config, store)?;
    agent.driver = driver;
    if driver == Driver::MetamorphNn {
        agent.train_predictor();
    }

    for (e, episode) in episodes.iter().enumerate() {
        agent.reset();
        for (s, step) in episode.iter().enumerate() {
            let response = agent.cycle(&step.values, step.x, step.y, None, 0.0)?;
            println!("{e},{s},{response},{}", agent.response_name(response));
        }
    }
    Ok(())
}

fn inspect(config: &Config, path: &Path, node: Option<usize>) -> anyhow::Result<()> {
    let store = load_store(config, path)?;
    if let Some(index) = node {
        let m = store
            .get(index)
            .with_context(|| format!("store has {} nodes, no node {index}", store.len()))?;
        println!(
            "response={} ({}) goal_value={}",
            m.response, m.response_name, m.goal_value
        );
        println!("causes={:?} effects={:?}", m.cause_indexes, m.effect_indexes);
        print!("{}", m.morphognostic.describe());
        return Ok(());
    }

    println!("nodes={}", store.len());
    for (i, m) in store.iter().enumerate() {
        println!(
            "{i}: response={} ({}) goal_value={} causes={:?} effects={:?}",
            m.response, m.response_name, m.goal_value, m.cause_indexes, m.effect_indexes
        );
    }
    Ok(())
}
