#![forbid(unsafe_code)]

mod cmd;
mod notify;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sift: deduplicating log and test event aggregator",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Initialize a sift store",
        long_about = "Initialize a sift store in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a store in the current directory\n    sift init\n\n    # Emit machine-readable output\n    sift init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        about = "Ingest events",
        long_about = "Ingest one or more events from stdin, a file, or an inline JSON object. \
                      Each event is deduplicated into a group by its identity checksum.",
        after_help = "EXAMPLES:\n    # Ingest a single event from stdin\n    echo '{\"name\":\"Timeout\",\"message\":\"boom\",\"project\":1}' | sift ingest\n\n    # Ingest a batch file (one JSON object per line)\n    sift ingest --file events.ndjson\n\n    # Ingest one inline event\n    sift ingest --event '{\"name\":\"Timeout\",\"message\":\"boom\",\"project\":1}'"
    )]
    Ingest(cmd::ingest::IngestArgs),

    #[command(
        about = "List groups",
        long_about = "List groups with optional filters, free-text search, and sort order.",
        after_help = "EXAMPLES:\n    # List everything, most recent first\n    sift list\n\n    # Unresolved log groups from one logger\n    sift list --status unresolved --type log --logger app\n\n    # Free-text search, loudest first\n    sift list -q timeout --sort times-seen\n\n    # Emit machine-readable output\n    sift list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Show one group",
        long_about = "Show a group's snapshot, counters, and recent occurrences.",
        after_help = "EXAMPLES:\n    # Show a group with its ten most recent occurrences\n    sift show 42\n\n    # Emit machine-readable output\n    sift show 42 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        about = "Mark groups resolved",
        long_about = "Mark one or more groups resolved. A recurrence of the same identity \
                      reopens the group automatically.",
        after_help = "EXAMPLES:\n    # Resolve one group\n    sift resolve 42\n\n    # Resolve several at once\n    sift resolve 42 43 44"
    )]
    Resolve(cmd::resolve::ResolveArgs),

    #[command(
        about = "List registered facet values",
        long_about = "List the registered facet values that back filter choices.",
        after_help = "EXAMPLES:\n    # All tracked facets\n    sift facets\n\n    # Logger values containing 'app'\n    sift facets logger --search app"
    )]
    Facets(cmd::facets::FacetsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SIFT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "sift=debug,info"
        } else {
            "sift=info,warn"
        })
    });

    let format = env::var("SIFT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let root = std::env::current_dir()?;
    let mode = cli.output_mode();

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, &root, mode),
        Commands::Ingest(args) => cmd::ingest::run_ingest(&args, &root, mode),
        Commands::List(args) => cmd::list::run_list(&args, &root, mode),
        Commands::Show(args) => cmd::show::run_show(&args, &root, mode),
        Commands::Resolve(args) => cmd::resolve::run_resolve(&args, &root, mode),
        Commands::Facets(args) => cmd::facets::run_facets(&args, &root, mode),
    }
}
