//! RELEX CLI - Command-line interface
//!
//! Usage:
//!   relex file <path> [--format plaintext|medline|medlinexml] [--output <path>]
//!   relex dir <path> [--format ...] [--output <path>]
//!   relex interactive

mod medline;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use relex_clients::{
    build_recognizers, client_for, ChunkerClient, HierarchyClient, LexiconClient, TaggerClient,
};
use relex_core::{AppConfig, OntologyIndex};
use relex_extractor::{IndicatorLexicon, Pipeline};

use medline::MedlineDocument;

#[derive(Parser)]
#[command(name = "relex")]
#[command(about = "Biomedical semantic relation extraction")]
#[command(version)]
struct Cli {
    /// TOML configuration file; defaults come from the environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single input file
    File {
        /// Path to the input file
        path: PathBuf,
        /// Input file format
        #[arg(long, value_enum, default_value_t = InputFormat::Plaintext)]
        format: InputFormat,
        /// Write predications to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Process every file in a directory
    Dir {
        /// Path to the input directory
        path: PathBuf,
        /// Input file format
        #[arg(long, value_enum, default_value_t = InputFormat::Plaintext)]
        format: InputFormat,
        /// Write predications to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Process one document per line of input until "quit"
    Interactive,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    Plaintext,
    Medline,
    Medlinexml,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    let pipeline = build_pipeline(&config)?;

    match cli.command {
        Commands::File {
            path,
            format,
            output,
        } => {
            let documents = read_documents(&path, format)?;
            let mut writer = output_writer(output.as_deref())?;
            process_documents(&pipeline, &documents, &mut writer).await?;
        }
        Commands::Dir {
            path,
            format,
            output,
        } => {
            let mut writer = output_writer(output.as_deref())?;
            let mut entries: Vec<_> = std::fs::read_dir(&path)
                .with_context(|| format!("reading directory {}", path.display()))?
                .collect::<std::io::Result<_>>()?;
            entries.sort_by_key(|e| e.path());

            for entry in entries {
                if !entry.path().is_file() {
                    continue;
                }
                let documents = read_documents(&entry.path(), format)?;
                process_documents(&pipeline, &documents, &mut writer).await?;
            }
        }
        Commands::Interactive => {
            println!(
                "Each input line is processed as a single document. Type quit to exit."
            );
            let mut writer = output_writer(None)?;
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                if stdin.read_line(&mut line)? == 0 || line.trim() == "quit" {
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }
                let document = MedlineDocument {
                    pmid: None,
                    title: None,
                    abstract_text: Some(line.trim().to_string()),
                };
                process_documents(&pipeline, &[document], &mut writer).await?;
            }
        }
    }

    Ok(())
}

/// Wire the pipeline from configuration: load the local resources once and
/// resolve every collaborator endpoint to a client.
fn build_pipeline(config: &AppConfig) -> anyhow::Result<Pipeline> {
    let ontology = OntologyIndex::from_file(&config.resources.ontology_file)?;
    let indicators = IndicatorLexicon::from_file(&config.resources.indicator_file)?;
    info!(indicators = indicators.len(), "indicator lexicon loaded");

    let servers = &config.servers;
    let pipeline = Pipeline::new(
        Arc::new(TaggerClient::new(client_for(servers, servers.tagger_port))),
        Arc::new(ChunkerClient::new(client_for(
            servers,
            servers.chunker_port,
        ))),
        build_recognizers(&config.sources, servers),
        Arc::new(HierarchyClient::new(client_for(
            servers,
            servers.hierarchy_port,
        ))),
        Arc::new(ontology),
        Arc::new(indicators),
    )
    .with_lexicon(Arc::new(LexiconClient::new(client_for(
        servers,
        servers.lexicon_port,
    ))))
    .with_skip_failed_sources(servers.skip_failed_sources);

    Ok(pipeline)
}

fn read_documents(path: &std::path::Path, format: InputFormat) -> anyhow::Result<Vec<MedlineDocument>> {
    match format {
        InputFormat::Plaintext => medline::read_plaintext_file(path),
        InputFormat::Medline => medline::parse_medline_file(path),
        InputFormat::Medlinexml => medline::parse_medlinexml_file(path),
    }
}

fn output_writer(path: Option<&std::path::Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    })
}

/// Title and abstract are processed as separate texts, in that order.
async fn process_documents(
    pipeline: &Pipeline,
    documents: &[MedlineDocument],
    writer: &mut Box<dyn Write>,
) -> anyhow::Result<()> {
    for document in documents {
        for text in [document.title.as_deref(), document.abstract_text.as_deref()]
            .into_iter()
            .flatten()
        {
            let analyzed = pipeline.process(text).await?;
            for predication in analyzed.predications() {
                serde_json::to_writer(&mut *writer, &predication)?;
                writeln!(writer)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
