use anyhow::Result;
use clap::{Parser, Subcommand};
use engine::builder;
use engine::loader::LoadedIndex;
use engine::search::Searcher;
use engine::stopwords::Stopwords;
use engine::{EngineError, STOPWORDS_FILE};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "vsearch")]
#[command(about = "Index and search a document collection with vector-space ranking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index over a flat directory of documents
    Index {
        /// Document collection directory
        collection: PathBuf,
        /// Output index directory
        index_dir: PathBuf,
        /// Newline-separated stopwords file
        stopwords: PathBuf,
    },
    /// Rank indexed documents against a keyword query
    Search {
        /// Index directory produced by `index`
        index_dir: PathBuf,
        /// Number of top documents to report
        top_n: usize,
        /// Query keywords, joined into one query
        #[arg(required = true)]
        keywords: Vec<String>,
        /// Refine the query with pseudo relevance feedback (Rocchio)
        #[arg(short = 'r', long = "rf")]
        feedback: bool,
    },
}

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Index {
            collection,
            index_dir,
            stopwords,
        } => {
            let stats = builder::build(&collection, &index_dir, &stopwords)?;
            println!("indexed {} documents, {} terms", stats.documents, stats.terms);
        }
        Commands::Search {
            index_dir,
            top_n,
            keywords,
            feedback,
        } => {
            let stopwords = Stopwords::load(&index_dir.join(STOPWORDS_FILE))?;
            let index = LoadedIndex::load(&index_dir)?;
            tracing::info!(
                documents = index.doc_count(),
                terms = index.term_count(),
                "index loaded"
            );
            let searcher = Searcher::new(&index, &stopwords);
            let results = searcher.search(&keywords.join(" "), top_n, feedback);
            if results.is_empty() {
                println!("nothing found");
            } else {
                for (rank, result) in results.iter().enumerate() {
                    println!("{}. {},{:.3}", rank + 1, result.doc_id, result.score);
                }
            }
        }
    }
    Ok(())
}

/// Each error class maps to a distinct exit status.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::Config(_)) => 2,
        Some(EngineError::IndexFormat { .. }) => 3,
        Some(EngineError::IndexPersist { .. }) => 4,
        _ => 1,
    }
}
