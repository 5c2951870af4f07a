//! pagefilter - keep only the records of a PDF whose header matches a term
//!
//! A record is a header page plus the continuation pages after it. The
//! header is recognised by text inside a fixed rectangle of the page.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use pagefilter_core::HeaderRegion;
use tracing::{debug, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod run;

use run::Status;

#[derive(Parser, Debug)]
#[command(name = "pagefilter")]
#[command(
    version,
    about = "Keep only the PDF records whose header region matches a search term"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter a PDF and write the matching records to a new file
    Filter(FilterArgs),
    /// Print the header-region text and verdict of every page
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CriteriaArgs {
    /// Text the header region of a record must contain (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Text that marks a page as a record header; without it every page is a header
    #[arg(short = 'k', long, conflicts_with = "work_address")]
    pub header_keyword: Option<String>,

    /// Use the fixed "INDIRIZZO SEDE DI LAVORO" header of the payslip layout
    #[arg(long)]
    pub work_address: bool,

    /// Header region as x,y,width,height in points from the top-left corner
    #[arg(long)]
    pub region: Option<HeaderRegion>,

    /// JSON file with search_term, header_keyword and region; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Source PDF
    pub input: PathBuf,

    #[command(flatten)]
    pub criteria: CriteriaArgs,

    /// Output PDF [default: filtered_output.pdf next to the input]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Replace an existing output file without asking
    #[arg(short, long)]
    pub force: bool,

    /// Report the pages that would be kept without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Source PDF
    pub input: PathBuf,

    #[command(flatten)]
    pub criteria: CriteriaArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let mut filter = EnvFilter::from_default_env().add_directive(log_level.into());
    // lopdf logs every font encoding lookup at info
    if let Ok(directive) = "lopdf=warn".parse() {
        filter = filter.add_directive(directive);
    }

    // stdout carries results, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("pagefilter v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Command::Filter(args) => run::filter(&args),
        Command::Inspect(args) => run::inspect(&args),
    };

    match result {
        Ok(Status::Done) => ExitCode::SUCCESS,
        Ok(Status::NoMatch) => ExitCode::from(2),
        Ok(Status::Cancelled) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
