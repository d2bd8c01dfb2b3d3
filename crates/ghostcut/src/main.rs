//! # GhostCut CLI (`ghostcut`)
//!
//! Command-line interface for the GhostCut verification pipeline.
//!
//! ## Usage
//!
//! ```bash
//! ghostcut --config ./config/ghostcut.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ghostcut compress <file>` | Chunk, summarize, and verify a document |
//! | `ghostcut audit <file> "<query>"` | Audit retrieval quality for a query |
//! | `ghostcut serve` | Start the HTTP API server |
//! | `ghostcut completions <shell>` | Generate shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Compress and verify, exporting the full JSON result
//! ghostcut compress report.txt --out report-compressed.json
//!
//! # Audit how well the chunks answer a question
//! ghostcut audit report.txt "what were the quarterly figures?"
//!
//! # Serve the dashboard API
//! ghostcut serve --config ./config/ghostcut.toml
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::sync::Arc;

use ghostcut::config::Config;
use ghostcut::export::export_json;
use ghostcut::pipeline::{run_audit, run_compress};
use ghostcut::producer::create_producer;
use ghostcut::server::run_server;
use ghostcut::session::DocumentSession;

/// GhostCut: verifiable document compression. Chatbots guess; GhostCut
/// proves every claim against the source text.
#[derive(Parser)]
#[command(
    name = "ghostcut",
    about = "Verifiable document compression and retrieval auditing",
    version,
    long_about = "GhostCut compresses documents into hierarchical summaries via an external \
claims producer, then verifies every claim algorithmically against the source text, \
producing trust metrics (confidence score, hallucination risk) and compression quality \
metrics (ratio, redundancy, abstraction)."
)]
struct Cli {
    /// Path to configuration file (TOML). Falls back to built-in defaults
    /// when the file does not exist.
    #[arg(long, global = true, default_value = "./config/ghostcut.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a document and verify every claim against its text.
    Compress {
        /// Path to a plain-text document.
        file: PathBuf,

        /// Write the full JSON result to this path.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Audit retrieval quality of the document's chunks for a query.
    Audit {
        /// Path to a plain-text document.
        file: PathBuf,

        /// The question to audit retrieval against.
        query: String,
    },

    /// Start the HTTP API server.
    Serve,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Compress { file, out } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read document: {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file.display().to_string());

            let producer = create_producer(&config.producer)?;
            let mut session = DocumentSession::new(file_name, text);
            let response = run_compress(&config, producer.as_ref(), &mut session).await?;

            let stats = &response.verification_stats.stats;
            let quality = &response.verification_stats.quality;
            println!(
                "{}: {} chunks, {} claims",
                session.file_name,
                response.chunks.len(),
                stats.total_facts
            );
            println!(
                "  verified {} / unverified {} / conflict {}",
                stats.verified_facts, stats.unverified_facts, stats.conflict_facts
            );
            println!(
                "  confidence {} ({:?} hallucination risk)",
                stats.confidence_score, stats.hallucination_risk
            );
            println!(
                "  compression {}% | redundancy {} | abstraction {:?} | {} -> {} words",
                quality.compression_ratio,
                quality.redundancy_score,
                quality.abstraction_level,
                quality.source_word_count,
                quality.summary_word_count
            );

            if let Some(out_path) = out {
                export_json(&session, &out_path)?;
                println!("Exported JSON to {}", out_path.display());
            }
        }

        Commands::Audit { file, query } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read document: {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file.display().to_string());

            let producer = create_producer(&config.producer)?;
            let mut session = DocumentSession::new(file_name, text);
            let report = run_audit(&config, producer.as_ref(), &mut session, &query).await?;

            println!("Integrity score: {:.0}", report.integrity_score);
            for chunk in &report.retrieved_chunks {
                let flag = if chunk.chunk.is_noise {
                    "noise"
                } else if chunk.chunk.is_relevant {
                    "relevant"
                } else {
                    "ignored"
                };
                println!(
                    "  {} similarity {:.2} [{}] grounding {:?}",
                    chunk.chunk.id, chunk.chunk.similarity, flag, chunk.grounding
                );
            }
            for alert in &report.alerts {
                println!("  alert [{:?}] {}: {}", alert.kind, alert.title, alert.description);
            }
            if !report.suggestions.is_empty() {
                println!("Suggestions:");
                for s in &report.suggestions {
                    println!("  - {}", s);
                }
            }
        }

        Commands::Serve => {
            let producer = create_producer(&config.producer)?;
            run_server(&config, Arc::from(producer)).await?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}
