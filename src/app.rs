//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - loads and derives the poll dataset
//! - turns flags into a `FilterRequest`
//! - prints reports / writes exports / launches the TUI

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Command, ExportArgs, FilterArgs};
use crate::domain::{DEFAULT_DATA_PATH, DashboardConfig, DeriveConfig, PollDataset};
use crate::error::AppError;
use crate::filter::{DateRange, FilterRequest, PartySelection};

pub mod pipeline;

/// Environment variable naming the default CSV (also read from `.env`).
pub const DATA_ENV_VAR: &str = "POLLS_DATA";

/// Entry point for the `polls` binary.
pub fn run() -> Result<(), AppError> {
    // `polls` and `polls --pollster X` behave like `polls tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_logging(cli.command.filter_args().verbose);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Summary(args) => handle_summary(args),
        Command::Export(args) => handle_export(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    // `RUST_LOG` still wins when set.
    let _ = env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .try_init();
}

fn handle_summary(args: FilterArgs) -> Result<(), AppError> {
    let config = dashboard_config_from_args(&args);
    let dataset = pipeline::prepare_dataset(&config)?;
    let request = filter_request_from_args(&args, &dataset);

    let out = pipeline::run_view(&dataset, &request);
    println!("{}", crate::report::format_summary(&out));
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let config = dashboard_config_from_args(&args.filter);
    let dataset = pipeline::prepare_dataset(&config)?;
    let request = filter_request_from_args(&args.filter, &dataset);
    let out = pipeline::run_view(&dataset, &request);

    if let Some(path) = &args.csv_out {
        crate::io::export::write_view_csv(path, &out.view)?;
        info!("wrote {} rows to {}", out.view.len(), path.display());
    }
    if let Some(path) = &args.json_out {
        crate::io::export::write_report_json(path, &out.report())?;
        info!("wrote report to {}", path.display());
    }
    Ok(())
}

fn handle_tui(args: FilterArgs) -> Result<(), AppError> {
    let config = dashboard_config_from_args(&args);
    let dataset = pipeline::prepare_dataset(&config)?;
    let request = filter_request_from_args(&args, &dataset);
    crate::tui::run(&dataset, request)
}

pub fn dashboard_config_from_args(args: &FilterArgs) -> DashboardConfig {
    DashboardConfig {
        data_path: resolve_data_path(args.data.clone()),
        derive: DeriveConfig::precleaned(&args.precleaned),
    }
}

/// `--data`, else `POLLS_DATA` (environment or `.env`), else the default path.
fn resolve_data_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    dotenvy::dotenv().ok();
    std::env::var_os(DATA_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
}

/// Build the initial selections. Unset filters mean "everything selected".
pub fn filter_request_from_args(args: &FilterArgs, dataset: &PollDataset) -> FilterRequest {
    let mut request = FilterRequest::all_of(dataset);

    if !args.pollsters.is_empty() {
        request = request.with_pollsters(args.pollsters.iter().cloned());
    }
    if !args.methodologies.is_empty() {
        request = request.with_methodologies(args.methodologies.iter().copied());
    }
    if args.from.is_some() || args.to.is_some() {
        let bounds = request.date_range;
        let lo = args.from.or(bounds.map(|b| b.lo)).unwrap_or(NaiveDate::MIN);
        let hi = args.to.or(bounds.map(|b| b.hi)).unwrap_or(NaiveDate::MAX);
        request.date_range = Some(DateRange::new(lo, hi));
    }

    request.with_parties(if args.no_party {
        PartySelection::none()
    } else if args.parties.is_empty() {
        PartySelection::all()
    } else {
        PartySelection::of(args.parties.iter().copied())
    })
}

/// Rewrite argv so `polls` defaults to `polls tui`.
///
/// Rules:
/// - `polls`                       -> `polls tui`
/// - `polls --pollster X ...`      -> `polls tui --pollster X ...`
/// - `polls --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "summary" | "export");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::{Methodology, Party};
    use std::path::Path;

    fn args(extra: &[&str]) -> FilterArgs {
        let mut argv = vec!["polls", "summary"];
        argv.extend_from_slice(extra);
        Cli::parse_from(argv).command.filter_args().clone()
    }

    fn dataset() -> PollDataset {
        let csv = "pollster,methodology,start_date,dem,rep,sample_size\n\
                   A,Live Phone,2024-01-01,45,43,1000\n\
                   B,Online,2024-01-05,44,44,900\n";
        pipeline::prepare_dataset_from_reader(csv.as_bytes(), &DeriveConfig::default(), Path::new("t.csv"))
            .unwrap()
    }

    #[test]
    fn rewrite_defaults_to_tui() {
        let v = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(rewrite_args(v(&["polls"])), v(&["polls", "tui"]));
        assert_eq!(
            rewrite_args(v(&["polls", "--pollster", "A"])),
            v(&["polls", "tui", "--pollster", "A"])
        );
        assert_eq!(rewrite_args(v(&["polls", "summary"])), v(&["polls", "summary"]));
        assert_eq!(rewrite_args(v(&["polls", "--help"])), v(&["polls", "--help"]));
    }

    #[test]
    fn no_flags_select_everything() {
        let ds = dataset();
        let request = filter_request_from_args(&args(&[]), &ds);
        assert_eq!(request, FilterRequest::all_of(&ds));
    }

    #[test]
    fn half_open_date_flags_use_dataset_bounds() {
        let ds = dataset();
        let request = filter_request_from_args(&args(&["--from", "2024-01-03"]), &ds);
        let range = request.date_range.unwrap();
        assert_eq!(range.lo, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(range.hi, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn flags_narrow_the_request() {
        let ds = dataset();
        let request = filter_request_from_args(
            &args(&["--pollster", "B", "--methodology", "online", "--party", "dem"]),
            &ds,
        );
        assert_eq!(request.pollsters.unwrap().into_iter().collect::<Vec<_>>(), ["B"]);
        assert!(request.methodologies.unwrap().contains(&Methodology::Online));
        assert_eq!(request.parties, PartySelection::of([Party::Dem]));

        let none = filter_request_from_args(&args(&["--no-party"]), &ds);
        assert_eq!(none.parties, PartySelection::none());
    }

    #[test]
    fn explicit_data_flag_wins() {
        let path = resolve_data_path(Some(PathBuf::from("x.csv")));
        assert_eq!(path, PathBuf::from("x.csv"));
    }
}
