use std::{
    io::{self, IsTerminal},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use owo_colors::{OwoColorize, Stream::Stdout};
use tracing_subscriber::EnvFilter;

use crate::check::{CheckError, Checker, ValidationReport, parse_error_to_report};
use config::CheckerConfig;

pub mod config;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CheckerArgs {
    /// The annotated test source holding the directives.
    pub test_file: PathBuf,

    /// Work directory; the dumps are read from its `ir_dump` subdirectory.
    #[arg(long, default_value = "/tmp/ets_checker")]
    pub work_dir: PathBuf,

    /// TOML file overriding the dump format conventions.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Debug logging and source diagnostics for malformed directives.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

pub fn main() -> anyhow::Result<ExitCode> {
    let args = CheckerArgs::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stdout)
        .with_ansi(io::stdout().is_terminal())
        .init();

    let config = match &args.config {
        Some(path) => CheckerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CheckerConfig::default(),
    };
    tracing::debug!("Checking with config: {:#?}", config);

    Ok(run(&args, config))
}

/// Runs the checker and prints the outcome. Exit code 1 on any failure.
pub fn run(args: &CheckerArgs, config: CheckerConfig) -> ExitCode {
    let checker = Checker::new(&args.work_dir, config);

    let report = match checker.run_file(&args.test_file) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("{e}");
            let message = format!("Validation aborted: {e}");
            println!("{}", message.if_supports_color(Stdout, |x| x.red()));
            return ExitCode::FAILURE;
        }
    };

    if args.verbose {
        print_diagnostics(args, &report);
    }
    print_report(&report);

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_report(report: &ValidationReport) {
    if report.is_success() {
        println!("{}", report.verdict().if_supports_color(Stdout, |x| x.green()));
    } else {
        println!("{}", report.verdict().if_supports_color(Stdout, |x| x.red()));
        for failure in &report.failures {
            println!("  - {failure}");
        }
    }

    for warning in &report.warnings {
        println!("{} {warning}", "warning:".if_supports_color(Stdout, |x| x.yellow()));
    }
}

fn print_diagnostics(args: &CheckerArgs, report: &ValidationReport) {
    let Ok(source) = std::fs::read_to_string(&args.test_file) else {
        return;
    };
    let path = args.test_file.display().to_string();

    for failure in &report.failures {
        if let CheckError::Parse(error) = &failure.error {
            let diagnostic = parse_error_to_report(error, &path, &source);
            if let Err(e) = diagnostic.eprint(ariadne::sources([(path.clone(), source.clone())])) {
                tracing::warn!("failed to render diagnostic: {e}");
            }
        }
    }
}
