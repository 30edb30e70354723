use anyhow::Result;
use boolsearch_core::persist::{load_index, IndexPaths};
use boolsearch_core::{run_query, DocumentStore, FsDocumentStore, SearchIndex, SearchRequest};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "boolsearch")]
#[command(about = "Run boolean queries against a prebuilt index", long_about = None)]
struct Cli {
    /// Index directory
    #[arg(long, global = true, default_value = "./index")]
    index: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one or more queries and print one JSON line per query
    Query {
        /// Boolean expressions, e.g. "a AND NOT (b OR c)"
        queries: Vec<String>,
        /// Read additional queries from a file, one per line
        #[arg(long)]
        file: Option<String>,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        sort_order: String,
        /// Inclusive lower date bound (YYYY-MM-DD)
        #[arg(long)]
        min_date: Option<String>,
        /// Inclusive upper date bound (YYYY-MM-DD)
        #[arg(long)]
        max_date: Option<String>,
        /// Number of ids to print per query
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Also fetch and print the matched documents
        #[arg(long, default_value_t = false)]
        docs: bool,
    },
    /// Print universe size, term count and date coverage
    Stats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let paths = IndexPaths::new(&cli.index);
    let index = load_index(&paths)?;

    match cli.command {
        Commands::Query { mut queries, file, sort_order, min_date, max_date, limit, docs } => {
            if let Some(file) = file {
                queries.extend(read_queries(&file)?);
            }
            let store = docs.then(|| FsDocumentStore::new(&paths.root));
            for query in queries {
                let request = SearchRequest {
                    sort_order: Some(sort_order.clone()),
                    min_date: min_date.clone(),
                    max_date: max_date.clone(),
                    max_index: Some(limit),
                    ..SearchRequest::new(query)
                };
                print_result(&index, &request, store.as_ref());
            }
            Ok(())
        }
        Commands::Stats => {
            let summary = json!({
                "num_docs": index.num_docs(),
                "num_terms": index.postings.num_terms(),
                "dated_docs": index.dates.len(),
            });
            println!("{summary}");
            Ok(())
        }
    }
}

fn read_queries(file: &str) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(file)?);
    let mut queries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        queries.push(line);
    }
    Ok(queries)
}

/// Query failures are reported per line so one bad expression does not stop a batch.
fn print_result(index: &SearchIndex, request: &SearchRequest, store: Option<&FsDocumentStore>) {
    let line = match run_query(index, request) {
        Ok(page) => {
            let mut out = json!({ "query": request.query, "status": "success", "total": page.total, "ids": page.ids });
            if let Some(store) = store {
                out["docs"] = match store.fetch(&page.ids) {
                    Ok(docs) => json!(docs),
                    Err(e) => {
                        tracing::warn!(error = %e, "document fetch failed");
                        json!({ "error": e.public_message() })
                    }
                };
            }
            out
        }
        Err(e) => {
            tracing::warn!(query = %request.query, error = %e, "query failed");
            json!({ "query": request.query, "status": "error", "message": e.public_message() })
        }
    };
    println!("{line}");
}
