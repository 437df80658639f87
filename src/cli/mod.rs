//! Command-line parsing for the poll dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the data pipeline.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DerivedColumn, Methodology, Party};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "polls", version, about = "Generic-ballot poll dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI.
    ///
    /// The flags seed the initial sidebar selections; everything can be
    /// toggled interactively afterwards.
    Tui(FilterArgs),
    /// Print headline stats, group tables and support distributions.
    Summary(FilterArgs),
    /// Write the filtered polls as CSV and/or the aggregates as JSON.
    Export(ExportArgs),
}

/// Data source and filter selections shared by every command.
#[derive(Debug, Args, Clone)]
pub struct FilterArgs {
    /// Poll CSV. Defaults to `POLLS_DATA` (from the environment or `.env`),
    /// then `data/clean/generic_ballot_polls_clean.csv`.
    #[arg(long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Keep only these pollsters (repeatable; exact match).
    #[arg(long = "pollster", value_name = "NAME")]
    pub pollsters: Vec<String>,

    /// Keep only these methodology buckets (repeatable).
    #[arg(long = "methodology", value_enum)]
    pub methodologies: Vec<Methodology>,

    /// Earliest start date (inclusive), YYYY-MM-DD.
    #[arg(long, value_parser = parse_cli_date)]
    pub from: Option<NaiveDate>,

    /// Latest start date (inclusive), YYYY-MM-DD.
    #[arg(long, value_parser = parse_cli_date)]
    pub to: Option<NaiveDate>,

    /// Party columns to show in distributions (repeatable; default both).
    #[arg(long = "party", value_enum)]
    pub parties: Vec<Party>,

    /// Show no party series at all.
    #[arg(long, conflicts_with = "parties")]
    pub no_party: bool,

    /// Derived column groups the CSV already contains (repeatable).
    #[arg(long = "precleaned", value_enum)]
    pub precleaned: Vec<DerivedColumn>,

    /// Turn on debug logging (stderr).
    #[arg(long)]
    pub verbose: bool,
}

/// Options for `polls export`.
#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Write the filtered rows (with derived columns) to this CSV.
    #[arg(long = "csv-out", value_name = "PATH", required_unless_present = "json_out")]
    pub csv_out: Option<PathBuf>,

    /// Write the aggregates to this JSON file.
    #[arg(long = "json-out", value_name = "PATH")]
    pub json_out: Option<PathBuf>,
}

impl Command {
    pub fn filter_args(&self) -> &FilterArgs {
        match self {
            Command::Tui(args) | Command::Summary(args) => args,
            Command::Export(args) => &args.filter,
        }
    }
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    crate::io::ingest::parse_date(s).ok_or_else(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}
