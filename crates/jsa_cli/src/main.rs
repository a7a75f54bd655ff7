//! jsa: Static analysis for a JavaScript subset.
//!
//! Usage:
//!   jsa [options] [file...]
//!
//! Reads standard input when no file is given. Prints the stage reports,
//! renders diagnostics with source snippets, and optionally lists tokens,
//! prints the quadruple tables, emits JSON, or re-runs on every change.

mod render;

use clap::{ArgAction, Parser as ClapParser};
use jsa_compiler::{AnalysisReport, Pipeline};
use jsa_options::{AnalyzerOptions, ConfigError};
use notify::{RecursiveMode, Watcher};
use render::Renderer;
use serde::Serialize;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "jsa", version, about = "jsa - static analysis for a JavaScript subset")]
struct Cli {
    /// Source files to analyze. Reads standard input when omitted.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Print the full reports as JSON.
    #[arg(long)]
    json: bool,

    /// List every token with its position and class.
    #[arg(long)]
    tokens: bool,

    /// Print the intermediate and optimized quadruple tables.
    #[arg(long)]
    ir: bool,

    /// Skip the optimizer.
    #[arg(long = "no-optimize")]
    no_optimize: bool,

    /// Path to a jsa.json configuration file.
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Re-analyze the files whenever they change.
    #[arg(short = 'w', long)]
    watch: bool,

    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

/// Failures of the host, as opposed to diagnostics in the analyzed source.
#[derive(Debug, Error)]
enum CliError {
    #[error("Cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot read standard input: {0}")]
    Stdin(#[source] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("File watching failed: {0}")]
    Watch(#[from] notify::Error),
    #[error("--watch needs at least one file")]
    WatchWithoutFiles,
    #[error("Cannot encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One buffer to analyze.
#[derive(Debug)]
struct Input {
    name: String,
    text: String,
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a str,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

const EXIT_DIAGNOSTIC_ERRORS: i32 = 1;
const EXIT_FATAL: i32 = 2;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_options(&cli).and_then(|options| {
        if cli.watch {
            run_watch(&cli, options)
        } else {
            run_once(&cli, &Pipeline::new(options))
        }
    });

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            print_error(&err.to_string());
            process::exit(EXIT_FATAL);
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Options from `--config`, else `jsa.json` in the working directory, else
/// defaults. Command-line flags override the file.
fn load_options(cli: &Cli) -> Result<AnalyzerOptions, CliError> {
    let found = cli.config.clone().or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|dir| jsa_options::find_config(&dir))
    });
    let mut options = match found {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            jsa_options::load_config(&path)?
        }
        None => AnalyzerOptions::default(),
    };
    if cli.no_optimize {
        options.optimize = false;
    }
    Ok(options)
}

fn read_inputs(files: &[PathBuf]) -> Result<Vec<Input>, CliError> {
    if files.is_empty() {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(CliError::Stdin)?;
        return Ok(vec![Input {
            name: "<stdin>".to_string(),
            text,
        }]);
    }
    files
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            Ok(Input {
                name: path.display().to_string(),
                text,
            })
        })
        .collect()
}

/// Analyze every input once and print the results. Returns the exit code.
fn run_once(cli: &Cli, pipeline: &Pipeline) -> Result<i32, CliError> {
    let start = Instant::now();
    let inputs = read_inputs(&cli.files)?;
    let texts: Vec<&str> = inputs.iter().map(|input| input.text.as_str()).collect();
    let reports = pipeline.analyze_many(&texts);

    if cli.json {
        let files: Vec<FileReport<'_>> = inputs
            .iter()
            .zip(&reports)
            .map(|(input, report)| FileReport {
                file: &input.name,
                report,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else {
        let renderer = Renderer::new(std::io::stderr().is_terminal());
        for (input, report) in inputs.iter().zip(&reports) {
            print_report(cli, &renderer, input, report);
        }
    }

    info!(
        files = inputs.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analysis finished"
    );
    Ok(exit_code(&reports))
}

fn print_report(cli: &Cli, renderer: &Renderer, input: &Input, report: &AnalysisReport) {
    println!("# {}", input.name);
    if cli.tokens {
        println!("== Tokens ==");
        print!("{}", render::token_listing(&input.text));
        println!();
    }
    print!("{}", render::text_report(report, cli.ir));
    for diagnostic in &report.diagnostics {
        eprint!("{}", renderer.diagnostic(&input.name, &input.text, diagnostic));
    }
    if let Some(failure) = &report.failure {
        print_error(&format!(
            "Analysis of '{}' failed; intermediate code is unavailable ({})",
            input.name, failure
        ));
    }
}

fn exit_code(reports: &[AnalysisReport]) -> i32 {
    if reports.iter().any(|r| r.failure.is_some()) {
        EXIT_FATAL
    } else if reports.iter().any(AnalysisReport::has_errors) {
        EXIT_DIAGNOSTIC_ERRORS
    } else {
        0
    }
}

/// Analyze, then re-analyze after each burst of changes settles for the
/// configured debounce delay. Every run reads the files afresh, so only the
/// latest contents are ever reported.
fn run_watch(cli: &Cli, options: AnalyzerOptions) -> Result<i32, CliError> {
    if cli.files.is_empty() {
        return Err(CliError::WatchWithoutFiles);
    }
    let debounce = Duration::from_millis(options.debounce_ms);
    let pipeline = Pipeline::new(options);

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)?;
    for path in &cli.files {
        watcher.watch(path, RecursiveMode::NonRecursive)?;
    }

    println!("Starting analysis in watch mode...");
    report_watch_run(cli, &pipeline);

    loop {
        match rx.recv() {
            Ok(Ok(event)) if is_content_change(&event) => {}
            Ok(Ok(_)) => continue,
            Ok(Err(err)) => {
                warn!(%err, "watch error");
                continue;
            }
            Err(_) => return Ok(0),
        }

        loop {
            match rx.recv_timeout(debounce) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }

        println!();
        println!("File change detected. Starting analysis...");
        println!();
        report_watch_run(cli, &pipeline);
    }
}

fn report_watch_run(cli: &Cli, pipeline: &Pipeline) {
    match run_once(cli, pipeline) {
        Ok(_) => {}
        Err(err) => print_error(&err.to_string()),
    }
    println!();
    println!("Watching for file changes...");
}

fn is_content_change(event: &notify::Event) -> bool {
    event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()
}

fn print_error(msg: &str) {
    eprintln!("error: {}", msg);
}
