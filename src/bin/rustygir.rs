//! rustygir CLI
//!
//! Parse, compile and search GObject-Introspection repositories.

use clap::{Parser as ClapParser, Subcommand};
use rustygir::index::indexer::NAMESPACE_KEY;
use rustygir::index::store::{self, source_mtime, IndexBlob};
use rustygir::index::{build_index, IndexCache, IndexDocument};
use rustygir::{CancellationToken, Config, GirError, GirProvider, Parser};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Metadata key holding the library version given to `compile`
const LIBRARY_VERSION_KEY: &str = "library-version";

#[derive(ClapParser, Debug)]
#[command(name = "rustygir")]
#[command(version)]
#[command(about = "Parse and search GObject-Introspection repositories")]
#[command(after_help = "ENVIRONMENT:
  RUSTYGIR_GIR_DIRS   directories scanned for .gir files
  RUSTYGIR_CACHE_DIR  where index blobs are kept
  RUST_LOG            log filter (default: warn)
")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a GIR file and print it back as GIR XML
    Dump {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Build the search index of a GIR file
    Compile {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Recorded in the index metadata
        #[arg(long, value_name = "VERSION")]
        library_version: Option<String>,

        /// Output path (default: <stem>.index beside the input)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Fuzzy search one file or every discovered file
    Search {
        query: String,

        /// Maximum results (0 = unlimited)
        #[arg(long, value_name = "N")]
        max: Option<usize>,

        /// Search only this GIR file
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// List discovered GIR files and their index paths
    List,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> rustygir::Result<()> {
    let config = Config::from_env();
    match command {
        Command::Dump { file } => dump(&file),
        Command::Compile {
            file,
            library_version,
            output,
        } => compile(&file, library_version.as_deref(), output, &config),
        Command::Search { query, max, file } => {
            let config = match max {
                Some(max) => config.with_max_matches(max),
                None => config,
            };
            search(&query, file.as_deref(), config)
        }
        Command::List => list(config),
    }
}

fn dump(file: &Path) -> rustygir::Result<()> {
    let repository = Parser::new().parse_file(file)?;
    print_out(&repository.serialize())
}

fn compile(
    file: &Path,
    library_version: Option<&str>,
    output: Option<PathBuf>,
    config: &Config,
) -> rustygir::Result<()> {
    if file.extension().is_none_or(|ext| ext != "gir") {
        return Err(GirError::invalid_input(format!(
            "{} is not a .gir file",
            file.display()
        )));
    }
    let output = output.unwrap_or_else(|| file.with_extension("index"));

    let mtime = source_mtime(file)?;
    let repository = Parser::new().parse_file(file)?;
    let mut builder = build_index(&repository, config.case_sensitive);
    if let Some(version) = library_version {
        builder.set_metadata_string(LIBRARY_VERSION_KEY, version);
    }
    let namespace = builder.metadata_string(NAMESPACE_KEY).map(str::to_string);
    let entries = builder.len();

    store::write_blob(&output, &IndexBlob::new(mtime, namespace, builder.build()))?;
    info!(output = %output.display(), entries, "wrote index");
    Ok(())
}

fn search(query: &str, file: Option<&Path>, config: Config) -> rustygir::Result<()> {
    let mut out = String::new();
    match file {
        Some(file) => {
            let index = IndexCache::new(&config).get(file).map_err(|e| {
                Arc::try_unwrap(e).unwrap_or_else(|e| GirError::invalid_input(e.to_string()))
            })?;
            for m in index.search(query, config.max_matches) {
                push_line(&mut out, m.score, index.namespace.as_deref(), &m.document);
            }
        }
        None => {
            let provider = GirProvider::new(config);
            provider.reload();
            for hit in provider.search(query, &CancellationToken::new()) {
                push_line(&mut out, hit.score, hit.namespace.as_deref(), &hit.document);
            }
        }
    }
    print_out(&out)
}

/// `score  namespace  word  id`, tab separated
fn push_line(out: &mut String, score: f32, namespace: Option<&str>, document: &IndexDocument) {
    out.push_str(&format!(
        "{:.4}\t{}\t{}\t{}\n",
        score,
        namespace.unwrap_or("-"),
        document.word,
        document.id
    ));
}

fn list(config: Config) -> rustygir::Result<()> {
    let provider = GirProvider::new(config);
    provider.reload();
    let mut out = String::new();
    for file in provider.files() {
        out.push_str(&format!(
            "{}\t{}\n",
            file.display(),
            provider.index_path(&file).display()
        ));
    }
    print_out(&out)
}

fn print_out(text: &str) -> rustygir::Result<()> {
    io::stdout()
        .lock()
        .write_all(text.as_bytes())
        .map_err(|e| GirError::io("<stdout>", e))
}
