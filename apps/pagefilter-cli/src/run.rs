//! Command handlers
//!
//! Turns parsed arguments into a [`FilterConfig`], runs the core filter and
//! reports the outcome. Results are printed to stdout; no-match is a status,
//! not an error.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use pagefilter_core::{
    default_output_path, filter_file, inspect_pages, select_pages, FilterConfig, FilterReport,
    PdfDocument, WORK_ADDRESS_HEADER,
};
use tracing::info;

use crate::{CriteriaArgs, FilterArgs, InspectArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    NoMatch,
    /// The user declined to replace an existing output file
    Cancelled,
}

/// Merge the optional config file with the command-line flags.
pub fn resolve_config(args: &CriteriaArgs) -> Result<FilterConfig> {
    let mut config = match &args.config {
        Some(path) => FilterConfig::from_json_file(path)?,
        None => FilterConfig::new(String::new(), None),
    };

    if let Some(search) = &args.search {
        config.search_term = search.clone();
    }
    if args.work_address {
        config.header_keyword = Some(WORK_ADDRESS_HEADER.to_string());
    } else if let Some(keyword) = &args.header_keyword {
        config.header_keyword = Some(keyword.clone());
    }
    if let Some(region) = args.region {
        config.region = region;
    }

    if config.search_term.trim().is_empty() {
        bail!("Please enter a search term (--search or search_term in --config)");
    }
    config.validate()?;

    Ok(config)
}

fn check_input(input: &Path) -> Result<()> {
    if !input.is_file() {
        bail!("Input file not found: {}", input.display());
    }
    Ok(())
}

fn resolve_output(args: &FilterArgs) -> Result<PathBuf> {
    match &args.output {
        Some(path) if path.as_os_str().is_empty() => bail!("Output path must not be empty"),
        Some(path) => Ok(path.clone()),
        None => Ok(default_output_path(&args.input)),
    }
}

/// Ask before replacing `path`. Anything but "y"/"yes" declines.
pub fn confirm_overwrite(
    path: &Path,
    reader: &mut impl BufRead,
    prompt: &mut impl Write,
) -> Result<bool> {
    writeln!(prompt, "{}", path.display())?;
    write!(prompt, "File already exists. Do you want to replace it? [y/N] ")?;
    prompt.flush()?;

    let mut answer = String::new();
    reader.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Compact 1-based page list, e.g. `1-3, 5, 8-10`
pub fn format_ranges(pages: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut iter = pages.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    parts.join(", ")
}

fn no_match_message(search_term: &str) -> String {
    format!("No matches found for the search term: {}", search_term)
}

pub fn filter(args: &FilterArgs) -> Result<Status> {
    let config = resolve_config(&args.criteria)?;
    check_input(&args.input)?;
    let output = resolve_output(args)?;

    if args.dry_run {
        let document = PdfDocument::load(&args.input)?;
        let kept = select_pages(&document, &config)?;
        if kept.is_empty() {
            println!("{}", no_match_message(&config.criteria()?.search_term()));
            return Ok(Status::NoMatch);
        }
        println!(
            "Would keep {} of {} pages: {}",
            kept.len(),
            document.page_count(),
            format_ranges(&kept.page_numbers())
        );
        return Ok(Status::Done);
    }

    if output.exists() && !args.force {
        let stdin = io::stdin();
        let confirmed = confirm_overwrite(&output, &mut stdin.lock(), &mut io::stderr())?;
        if !confirmed {
            info!(output = %output.display(), "keeping existing output file");
            return Ok(Status::Cancelled);
        }
    }

    run_filter(&args.input, &output, &config)
}

/// Filter `input` into `output` and print the outcome.
pub fn run_filter(input: &Path, output: &Path, config: &FilterConfig) -> Result<Status> {
    let report = filter_file(input, output, config)
        .with_context(|| format!("Error processing PDF {}", input.display()))?;

    match report {
        FilterReport::NoMatch { search_term } => {
            println!("{}", no_match_message(&search_term));
            Ok(Status::NoMatch)
        }
        FilterReport::Written {
            output,
            page_count,
            kept,
        } => {
            println!(
                "Filtered pages saved to: {} ({} of {} pages: {})",
                output.display(),
                kept.len(),
                page_count,
                format_ranges(&kept.page_numbers())
            );
            Ok(Status::Done)
        }
    }
}

pub fn inspect(args: &InspectArgs) -> Result<Status> {
    let config = resolve_config(&args.criteria)?;
    check_input(&args.input)?;

    let document = PdfDocument::load(&args.input)?;
    println!("Header region: {}", config.region);

    let decisions = inspect_pages(&document, &config)?;
    for decision in &decisions {
        println!(
            "{:>5}  {:<14} {:<5} {}",
            decision.page + 1,
            format!("{:?}", decision.verdict),
            if decision.kept { "keep" } else { "drop" },
            decision.text.replace('\n', " | ")
        );
    }

    let records = decisions.iter().filter(|d| d.verdict.is_header()).count();
    let kept = decisions.iter().filter(|d| d.kept).count();
    println!(
        "{} records, {} of {} pages kept",
        records,
        kept,
        decisions.len()
    );

    if kept > 0 {
        Ok(Status::Done)
    } else {
        Ok(Status::NoMatch)
    }
}
