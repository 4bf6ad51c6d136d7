//! CLI interface for the resume search engine

use anyhow::Result;
use clap::{Parser, Subcommand};
use resumatch::extract::{self, PlainTextExtractor, TextExtractor};
use resumatch::{EngineConfig, SearchEngine, DEFAULT_K};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resumatch")]
#[command(about = "Resume indexing and similarity search", long_about = None)]
struct Cli {
    /// Data directory for the model blob and corpus log.
    #[arg(long, default_value = "data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a document file
    Upload {
        /// Path to a plain-text document (.txt, .md, .text)
        path: PathBuf,
    },
    /// Search for the most relevant documents
    Search {
        /// Free-text query
        query: String,
        /// Number of results to return
        #[arg(short, long, default_value_t = DEFAULT_K)]
        k: usize,
    },
    /// List all indexed documents
    List,
    /// Start the HTTP API server
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "0.0.0.0:3000")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Handle serve command specially — it owns the engine for its lifetime
    if let Commands::Serve { ref addr } = cli.command {
        resumatch::server::start(addr, &cli.data_dir, EngineConfig::default()).await?;
        return Ok(());
    }

    let mut engine = SearchEngine::open(&cli.data_dir, EngineConfig::default())?;

    match cli.command {
        Commands::Upload { path } => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("invalid file name: {}", path.display()))?
                .to_string();
            let bytes = std::fs::read(&path)?;
            let text = PlainTextExtractor.extract(&file_name, &bytes)?;
            let name = extract::document_name(&file_name);

            let receipt = engine.upload(&name, &text)?;
            println!(
                "Indexed {} (id: {}, model version: {})",
                receipt.name, receipt.id, receipt.model_version
            );
        }
        Commands::Search { query, k } => {
            let outcome = engine.search(&query, k)?;

            if outcome.hits.is_empty() {
                println!("No compatible documents found");
            } else {
                println!("Top {} results:", outcome.hits.len());
                for (i, hit) in outcome.hits.iter().enumerate() {
                    println!("{}. {} (score: {:.4})", i + 1, hit.name, hit.score);
                }
            }
            if outcome.skipped_incompatible > 0 {
                println!(
                    "({} records skipped: incompatible vector dimensions)",
                    outcome.skipped_incompatible
                );
            }
        }
        Commands::List => {
            if engine.document_count() == 0 {
                println!("No documents indexed");
            } else {
                println!("Documents ({} total):", engine.document_count());
                for record in engine.documents() {
                    println!(
                        "  {} — {} (model version: {})",
                        record.id, record.name, record.model_version
                    );
                }
            }
        }
        Commands::Serve { .. } => {
            unreachable!("Serve handled separately");
        }
    }

    Ok(())
}
