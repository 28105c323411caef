//! `chemora` - query the expert knowledge layer from the command line.
//! Every subcommand prints JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use chemora_expert::{Config, ExpertLayer};
use chemora_ranker::MethodFilter;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chemora")]
#[command(about = "Chemora - quantum chemistry expert knowledge layer", long_about = None)]
struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long, env = "CHEMORA_CONFIG")]
    config: Option<PathBuf>,

    /// Graph file, overriding graph.path from the config
    #[arg(short, long)]
    graph: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit the graph against the recommended schema
    Gaps,

    /// Methods by composite score
    Rank {
        #[arg(default_value = "10")]
        limit: usize,
    },

    /// Methods by cost/accuracy efficiency
    Efficiency {
        #[arg(default_value = "10")]
        limit: usize,
    },

    /// Methods at or above a normalised accuracy
    Filter {
        min_accuracy: f64,

        /// Maximum polynomial scaling exponent
        #[arg(long)]
        max_scaling: Option<f64>,

        #[arg(long)]
        use_case: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Candidate method ids by keyword overlap
    Suggest {
        text: String,

        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Assemble ranked methods and concepts for a question
    Context { query: String },

    /// Semantic method search
    Search {
        query: String,

        #[arg(default_value = "5")]
        k: usize,
    },

    /// Build (or reuse) the embedding index
    Embed {
        /// Keep the index in memory only
        #[arg(long)]
        no_persist: bool,
    },

    /// Write an immutable snapshot of the graph
    Snapshot { label: String },

    /// List snapshots, oldest first
    Snapshots,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chemora=debug,info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load()?,
    };
    if let Some(graph) = cli.graph {
        config.graph.path = graph;
    }
    info!("Chemora {} using graph {}", env!("CARGO_PKG_VERSION"), config.graph.path.display());

    let layer = ExpertLayer::new(config).context("initialising expert layer")?;

    match cli.command {
        Commands::Gaps => print_json(&layer.analyze()?),
        Commands::Rank { limit } => print_json(&layer.rank_methods(limit, None)?),
        Commands::Efficiency { limit } => print_json(&layer.ranked_methods(limit)?),
        Commands::Filter { min_accuracy, max_scaling, use_case, category, limit } => {
            let filter = MethodFilter {
                min_accuracy: Some(min_accuracy),
                max_scaling_exponent: max_scaling,
                use_case,
                category,
                limit,
            };
            print_json(&layer.filter_methods(&filter)?)
        }
        Commands::Suggest { text, limit } => print_json(&layer.suggest(&text, limit)?),
        Commands::Context { query } => print_json(&layer.build_context(&query)?),
        Commands::Search { query, k } => print_json(&layer.search_methods(&query, k)?),
        Commands::Embed { no_persist } => {
            let index = layer.build_embeddings(!no_persist)?;
            print_json(&serde_json::json!({
                "graph_hash": index.graph_hash,
                "embedder_id": index.embedder_id,
                "dim": index.dim,
                "entries": index.len(),
                "persisted": !no_persist,
            }))
        }
        Commands::Snapshot { label } => print_json(&layer.create_snapshot(&label)?),
        Commands::Snapshots => print_json(&layer.list_snapshots()?),
    }
}
