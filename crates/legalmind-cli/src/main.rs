//! LegalMind CLI - Command-line interface for the LegalMind assistant.

use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use legalmind_core::RagConfig;
use legalmind_server::{AskRequest, AskResponse, LegalMindServer};

/// LegalMind - Question answering over legal documents with verified citations
#[derive(Parser)]
#[command(name = "legalmind")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/legalmind/config.toml or ./legalmind.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database path (overrides the config file)
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
    /// Write a default config file and create the database
    Init,

    /// Ingest a file or directory
    Ingest {
        /// Path to file or directory to ingest
        path: PathBuf,

        /// Recursively process directories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Ask a question
    Ask {
        /// The question
        query: String,

        /// Restrict retrieval to one document
        #[arg(long)]
        doc_id: Option<String>,

        /// Include retrieval diagnostics
        #[arg(long)]
        debug: bool,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// List ingested documents
    Documents,

    /// Show one document
    Show {
        /// Document ID
        doc_id: String,
    },

    /// Delete a document with its chunks and embeddings
    Delete {
        /// Document ID
        doc_id: String,
    },

    /// Show statistics
    Stats,

    /// Answer every question in a golden JSONL file and export the results
    Batch {
        /// JSONL file of {question, doc_id, reference} lines
        golden: PathBuf,

        /// Output JSONL file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// One line of a golden question set.
#[derive(Debug, Deserialize)]
struct GoldenRow {
    question: String,
    #[serde(default)]
    doc_id: Option<String>,
    #[serde(default)]
    reference: Option<String>,
}

/// One line of the evaluation export.
#[derive(Debug, Serialize)]
struct EvalRow {
    question: String,
    answer: String,
    contexts: Vec<String>,
    reference: Option<String>,
}

impl EvalRow {
    fn new(golden: GoldenRow, response: AskResponse) -> Self {
        Self {
            question: golden.question,
            answer: response.answer,
            contexts: response.debug.map(|d| d.contexts).unwrap_or_default(),
            reference: golden.reference,
        }
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(
    config_path: Option<&Path>,
    database: Option<&Path>,
) -> Result<RagConfig, Box<dyn std::error::Error>> {
    let mut config = RagConfig::resolve(config_path)?;
    if let Some(db) = database {
        config.database.path = db.to_path_buf();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        config: config_path,
        database,
        verbose,
        command,
    } = Cli::parse();

    setup_logging(verbose);

    if let Commands::Init = command {
        return init(config_path.as_deref(), database.as_deref());
    }

    let config = load_config(config_path.as_deref(), database.as_deref())?;
    let server = LegalMindServer::new(&config)?;

    match command {
        Commands::Init => {}
        Commands::Ingest { path, recursive } => {
            ingest(&server, &path, recursive).await?;
        }
        Commands::Ask {
            query,
            doc_id,
            debug,
            json,
        } => {
            let request = AskRequest {
                query,
                doc_id,
                debug,
            };
            ask(&server, request, json).await?;
        }
        Commands::Documents => {
            documents(&server).await?;
        }
        Commands::Show { doc_id } => {
            show(&server, &doc_id).await?;
        }
        Commands::Delete { doc_id } => {
            server.delete_document(&doc_id).await?;
            println!("Deleted: {}", doc_id);
        }
        Commands::Stats => {
            stats(&server).await?;
        }
        Commands::Batch { golden, output } => {
            batch(&server, &golden, output.as_deref()).await?;
        }
    }

    Ok(())
}

fn init(
    config_path: Option<&Path>,
    database: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => dirs::config_dir()
            .ok_or("Could not determine config directory")?
            .join("legalmind")
            .join("config.toml"),
    };

    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
    } else {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut config = RagConfig::default();
        if let Some(db) = database {
            config.database.path = db.to_path_buf();
        }
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;
        println!("Wrote default config to: {}", config_path.display());
    }

    let config = load_config(Some(&config_path), database)?;
    let _server = LegalMindServer::new(&config)?;
    println!("Initialized database at: {}", config.database.path.display());
    Ok(())
}

async fn ingest(
    server: &LegalMindServer,
    path: &Path,
    recursive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = server.ingest_path(path, recursive).await?;

    if report.documents.is_empty() && report.skipped.is_empty() {
        println!("No supported files found at: {}", path.display());
        return Ok(());
    }

    for doc in &report.documents {
        println!("  {} - {} ({} chunks)", doc.source, doc.doc_id, doc.chunks);
    }
    for skipped in &report.skipped {
        eprintln!("  {} - Skipped: {}", skipped.path, skipped.reason);
    }

    println!(
        "\nComplete: {} documents, {} chunks, {} skipped",
        report.documents.len(),
        report.chunks(),
        report.skipped.len()
    );

    Ok(())
}

async fn ask(
    server: &LegalMindServer,
    request: AskRequest,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = server.ask(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", response.answer);
    if !response.citations.is_empty() {
        println!("\nCitations:");
        for citation in &response.citations {
            match citation.page {
                Some(page) => println!("  {} (page {})", citation.token(), page),
                None => println!("  {}", citation.token()),
            }
        }
    }

    if let Some(debug) = &response.debug {
        println!("\nFused candidates:");
        for item in &debug.fused_top {
            println!(
                "  {:.5}  sem={:<4} bm25={:<4} [{}:{}] {}",
                item.fused_score,
                rank_label(item.semantic_rank),
                rank_label(item.bm25_rank),
                item.doc_id,
                item.chunk_id,
                item.preview.replace('\n', " ")
            );
        }
    }

    Ok(())
}

fn rank_label(rank: Option<u32>) -> String {
    rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
}

async fn documents(server: &LegalMindServer) -> Result<(), Box<dyn std::error::Error>> {
    let docs = server.list_documents().await?;

    if docs.is_empty() {
        println!("No documents found");
        return Ok(());
    }

    println!("Documents:\n");
    for doc in docs {
        println!(
            "  {} - {} ({} chunks)",
            doc.doc_id,
            doc.title.as_deref().unwrap_or("(untitled)"),
            doc.chunks
        );
        if let Some(source) = doc.source {
            println!("    {}", source);
        }
    }

    Ok(())
}

async fn show(server: &LegalMindServer, doc_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let doc = server.document(doc_id).await?;

    println!("ID:      {}", doc.doc_id);
    println!("Title:   {}", doc.title.as_deref().unwrap_or("(untitled)"));
    println!("Source:  {}", doc.source.as_deref().unwrap_or("-"));
    println!("Chunks:  {}", doc.chunks);
    println!("Created: {}", doc.created_at);

    Ok(())
}

async fn stats(server: &LegalMindServer) -> Result<(), Box<dyn std::error::Error>> {
    let stats = server.stats().await?;

    println!("Statistics:\n");
    println!("  Documents:  {}", stats.documents);
    println!("  Chunks:     {}", stats.chunks);
    println!("  Embeddings: {}", stats.embeddings);
    println!("  Storage:    {} bytes", stats.storage_bytes);

    Ok(())
}

async fn batch(
    server: &LegalMindServer,
    golden: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = read_golden(golden)?;

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(fs::File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    let total = rows.len();
    for (i, row) in rows.into_iter().enumerate() {
        eprintln!("[{}/{}] {}", i + 1, total, row.question);
        let request = AskRequest {
            query: row.question.clone(),
            doc_id: row.doc_id.clone(),
            debug: true,
        };
        let response = server.ask(request).await?;
        writeln!(out, "{}", serde_json::to_string(&EvalRow::new(row, response))?)?;
    }
    out.flush()?;

    Ok(())
}

fn read_golden(path: &Path) -> Result<Vec<GoldenRow>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut rows = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: GoldenRow = serde_json::from_str(&line)
            .map_err(|e| format!("{}:{}: {}", path.display(), i + 1, e))?;
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use legalmind_server::DebugPayload;

    #[test]
    fn test_read_golden_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("golden.jsonl");
        fs::write(
            &path,
            concat!(
                r#"{"question": "What law governs?", "doc_id": "doc_abc", "reference": "English law"}"#,
                "\n\n",
                r#"{"question": "Notice period?"}"#,
                "\n"
            ),
        )
        .unwrap();

        let rows = read_golden(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].doc_id.as_deref(), Some("doc_abc"));
        assert_eq!(rows[1].reference, None);
    }

    #[test]
    fn test_read_golden_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("golden.jsonl");
        fs::write(&path, "{\"question\": \"ok\"}\nnot json\n").unwrap();

        let err = read_golden(&path).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn test_eval_row_takes_debug_contexts() {
        let golden = GoldenRow {
            question: "q".to_string(),
            doc_id: None,
            reference: Some("r".to_string()),
        };
        let response = AskResponse {
            answer: "a".to_string(),
            citations: Vec::new(),
            debug: Some(DebugPayload {
                doc_id_filter: None,
                fused_top: Vec::new(),
                contexts: vec!["ctx".to_string()],
                context_pages: Vec::new(),
            }),
        };

        let value = serde_json::to_value(EvalRow::new(golden, response)).unwrap();
        assert_eq!(value["contexts"][0], "ctx");
        assert_eq!(value["reference"], "r");
    }
}
