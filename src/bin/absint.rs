use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::WrapErr;

use absint_rs::{Analyzer, AnalyzerConfig, AssertionStatus};

#[derive(Debug, Parser)]
#[command(author, version, about = "Interval analysis for a small imperative language")]
struct Cli {
    /// Path to the source file to analyze.
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Plain loop iterations before widening kicks in.
    #[clap(long, value_name = "INT", default_value = "5")]
    widening_threshold: usize,

    /// Standard (non-widened) iterations after a loop stabilizes.
    #[clap(long, value_name = "INT", default_value = "2")]
    narrowing: usize,

    /// Safety cap on loop iterations.
    #[clap(long, value_name = "INT", default_value = "1000")]
    max_iterations: usize,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;

    let args = Cli::parse();

    let level = match args.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let source = std::fs::read_to_string(&args.path)
        .wrap_err_with(|| format!("cannot read the source file `{}`", args.path.display()))?;

    let program = absint_rs::parse(&source)
        .wrap_err_with(|| format!("cannot parse `{}`", args.path.display()))?;

    let config = AnalyzerConfig {
        widening_threshold: args.widening_threshold,
        narrowing_iterations: args.narrowing,
        max_iterations: args.max_iterations,
    };
    let report = Analyzer::new(config).run(&program);
    print!("{}", report);

    let total = report.assertions().count();
    let verified = report
        .assertions()
        .filter(|(_, status)| {
            matches!(status, AssertionStatus::Verified | AssertionStatus::Unreachable)
        })
        .count();
    log::info!("{}/{} assertions verified", verified, total);

    Ok(if report.all_verified() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}
