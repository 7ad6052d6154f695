use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ctxfirst::config::Config;
use ctxfirst::diagnostics::Error;
use ctxfirst::rewrite::{self, Report, RunOptions};

#[derive(Parser)]
#[command(name = "ctxfirst", version, about = "Move context-like parameters and arguments to the front")]
struct Cli {
    /// Configuration file (defaults to ctxfirst.toml in the project directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fully-qualified handle type, e.g. context.Context (repeatable; replaces configured types)
    #[arg(long = "handle-type", global = true)]
    handle_types: Vec<String>,

    /// Root of stub packages that supply types but are never rewritten
    /// (repeatable; relative paths resolve against the working directory)
    #[arg(long = "stubs", global = true)]
    stubs: Vec<PathBuf>,

    /// Skip _test.go files
    #[arg(long, global = true)]
    no_tests: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite Go sources in place
    Rewrite {
        /// Project directory
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
        /// Do not write anything if a call site disagrees with its callee
        #[arg(long)]
        strict: bool,
    },
    /// Report files that would change; exits with status 1 if any would
    Check {
        /// Project directory
        #[arg(default_value = ".")]
        dir: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli, dir: &Path) -> Result<Config, Error> {
    let mut config = match &cli.config {
        Some(path) => Config::load_file(path)?,
        None => Config::load_from_dir(dir)?,
    };
    if !cli.handle_types.is_empty() {
        config.handle_types = cli.handle_types.clone();
        config.validate(Path::new("--handle-type"))?;
    }
    if !cli.stubs.is_empty() {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::io(format!("failed to read working directory: {e}"), "."))?;
        config.stub_paths = cli.stubs.iter().map(|p| cwd.join(p)).collect();
    }
    if cli.no_tests {
        config.include_tests = false;
    }
    Ok(config)
}

fn print_text(report: &Report, verb: &str) {
    for path in &report.changed_files {
        println!("{verb} {}", path.display());
    }
    for m in &report.mismatches {
        println!(
            "{}:{}: call to {} has arguments in order {:?}, declaration implies {:?}",
            m.path.display(),
            m.line,
            m.callee,
            m.actual,
            m.expected
        );
    }
}

fn execute(cli: &Cli) -> Result<i32, Error> {
    match &cli.command {
        Commands::Rewrite { dir, dry_run, strict } => {
            let config = load_config(cli, dir)?;
            let opts = RunOptions { dry_run: *dry_run, strict: *strict, check: false };
            let report = rewrite::run(&config, dir, &opts)?;
            if *dry_run {
                print_text(&report, "would rewrite");
            } else {
                eprintln!("rewrote {} file(s)", report.changed_files.len());
            }
            Ok(0)
        }
        Commands::Check { dir, format } => {
            let config = load_config(cli, dir)?;
            let opts = RunOptions { check: true, ..RunOptions::default() };
            let report = rewrite::run(&config, dir, &opts)?;
            match format {
                Format::Text => print_text(&report, "would rewrite"),
                Format::Json => match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("error: failed to serialize report: {e}"),
                },
            }
            Ok(if report.is_clean() { 0 } else { 1 })
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    }
}
