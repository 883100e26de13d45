//! docrag CLI - Command-line interface for the document QA engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use ulid::Ulid;

use docrag_core::{Document, DocumentStore, EmbeddingProvider, GenerationProvider, RagConfig};
use docrag_engine::RagEngine;
use docrag_provider::{OpenAiEmbeddings, OpenAiGenerator};
use docrag_store::SqliteStore;

/// docrag - Question answering over uploaded documents
#[derive(Parser)]
#[command(name = "docrag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database path (default: ~/.docrag/db.sqlite)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Ingest a text file as a document (pages separated by form feed)
    Ingest {
        /// Path to the text file to ingest
        path: PathBuf,
    },

    /// Ask a question over the ingested documents
    Ask {
        /// The question
        query: String,

        /// Maximum number of sources
        #[arg(short = 'k', long, default_value = "5")]
        limit: usize,

        /// Restrict to specific document IDs (all documents if omitted)
        #[arg(long = "doc")]
        docs: Vec<String>,
    },

    /// List ingested documents
    List,

    /// Delete a document and its chunks
    Delete {
        /// Document ID
        id: String,
    },
}

fn get_db_path(db: Option<PathBuf>, config: &RagConfig) -> PathBuf {
    if let Some(path) = db {
        return path;
    }
    config.database.path.clone()
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn open_engine(
    db_path: &Path,
    config: &RagConfig,
) -> Result<(RagEngine, Arc<SqliteStore>), Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteStore::open(db_path)?);

    // Providers are optional: without an API key the engine runs the
    // lexical path with template answers.
    let has_key = std::env::var(&config.provider.api_key_env).is_ok();
    let embedder: Option<Arc<dyn EmbeddingProvider>> = if has_key {
        Some(Arc::new(OpenAiEmbeddings::from_config(&config.provider)?))
    } else {
        None
    };
    let generator: Option<Arc<dyn GenerationProvider>> = if has_key {
        Some(Arc::new(OpenAiGenerator::from_config(&config.provider)?))
    } else {
        eprintln!(
            "Note: {} is not set; running offline with keyword search and template answers.",
            config.provider.api_key_env
        );
        None
    };

    let engine = RagEngine::new(
        store.clone(),
        store.clone(),
        embedder,
        generator,
        config.clone(),
    );
    Ok((engine, store))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = RagConfig::load_default()?;
    let db_path = get_db_path(cli.database, &config);

    match cli.command {
        Commands::Init => {
            let _store = SqliteStore::open(&db_path)?;
            println!("Initialized database at: {}", db_path.display());
        }
        Commands::Ingest { path } => {
            let (engine, store) = open_engine(&db_path, &config)?;
            ingest(&engine, store.as_ref(), &path).await?;
        }
        Commands::Ask { query, limit, docs } => {
            let (engine, store) = open_engine(&db_path, &config)?;
            ask(&engine, store.as_ref(), &query, limit, &docs).await?;
        }
        Commands::List => {
            let store = SqliteStore::open(&db_path)?;
            list(&store).await?;
        }
        Commands::Delete { id } => {
            let store = SqliteStore::open(&db_path)?;
            let id = Ulid::from_str(&id).map_err(|e| format!("Invalid document ID: {}", e))?;
            store.delete_document(id).await?;
            println!("Deleted document {}", id);
        }
    }

    Ok(())
}

async fn ingest(
    engine: &RagEngine,
    store: &SqliteStore,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let size = content.len() as u64;

    // Form feed separates pages; a file without one is a single page.
    let pages: Vec<String> = content.split('\u{c}').map(|p| p.to_string()).collect();

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.txt")
        .to_string();
    let url = format!("file://{}", path.canonicalize()?.display());

    let id = Ulid::new();
    store
        .insert_document(Document::new(id, &filename, &url, size))
        .await?;

    let chunks = engine.ingest(&pages, &filename, id, &url).await?;
    println!(
        "Ingested {} as {} ({} pages, {} chunks)",
        filename,
        id,
        pages.len(),
        chunks.len()
    );

    Ok(())
}

async fn ask(
    engine: &RagEngine,
    store: &SqliteStore,
    query: &str,
    limit: usize,
    docs: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let doc_ids: Vec<Ulid> = if docs.is_empty() {
        store
            .get_documents(&[], None)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect()
    } else {
        docs.iter()
            .map(|s| Ulid::from_str(s).map_err(|e| format!("Invalid document ID {}: {}", s, e)))
            .collect::<Result<_, _>>()?
    };

    let result = engine.answer_with_limit(query, &doc_ids, limit).await?;

    println!("{}\n", result.answer);

    if !result.sources.is_empty() {
        println!("Sources:");
        for source in &result.sources {
            println!("  {} (page {})", source.filename, source.page);
        }
    }

    Ok(())
}

async fn list(store: &SqliteStore) -> Result<(), Box<dyn std::error::Error>> {
    let docs = store.get_documents(&[], None).await?;

    if docs.is_empty() {
        println!("No documents. Use 'docrag ingest <file>' to add one.");
        return Ok(());
    }

    for doc in docs {
        let detail = match doc.error_message {
            Some(ref msg) => format!(" ({})", msg),
            None => format!(" ({} chunks)", doc.total_chunks),
        };
        println!("{}  {}  {}{}", doc.id, doc.status, doc.filename, detail);
    }

    Ok(())
}
