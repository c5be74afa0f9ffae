//! Corpus compile harness
//!
//! Compiles every `.js` sample in a corpus directory with the FuzzIL
//! compiler and prints a histogram of failure categories.

use clap::error::ErrorKind;
use clap::Parser;
use fuzzil_corpus_tools::harness::{self, DotProgress};
use fuzzil_corpus_tools::{explain, CompileReport, ConfigFile, ExitCode, HarnessConfig};
use std::fs;
use std::path::{Path, PathBuf};

const USAGE: &str = "Usage: compile path/to/FuzzILTool path/to/javascript_corpus_directory";

#[derive(Parser)]
#[command(name = "compile")]
#[command(about = "Compile a JavaScript corpus with FuzzIL and summarise failures", version)]
struct Cli {
    /// Path to the FuzzIL compiler executable
    tool: Option<PathBuf>,

    /// Directory of JavaScript samples
    corpus: Option<PathBuf>,

    /// Number of concurrent compiler processes (default: half the CPUs)
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Per-sample time budget in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Path to a TOML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Also write the report as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Classify a saved compiler output file instead of running the corpus
    #[arg(long, conflicts_with_all = ["tool", "corpus"])]
    explain: Option<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => usage(),
    };

    fuzzil_corpus_tools::init_logging();

    if let Some(path) = cli.explain {
        run_explain(&path);
    }

    let (tool, corpus) = match (cli.tool, cli.corpus) {
        (Some(tool), Some(corpus)) => (tool, corpus),
        _ => usage(),
    };

    let mut config = HarnessConfig::new(tool, corpus);
    if let Some(ref path) = cli.config {
        match ConfigFile::from_file(path) {
            Ok(file) => config = config.with_file(&file),
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                ExitCode::Failure.exit();
            }
        }
    }
    let config = config.with_overrides(cli.jobs, cli.timeout_secs);

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        ExitCode::Failure.exit();
    }

    let run = match harness::run(&config, &DotProgress) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::Failure.exit();
        }
    };

    let report = CompileReport::from_results(&run.results, run.duration);

    println!();
    print!("{}", report.to_human());

    if let Some(ref path) = cli.json {
        if let Err(e) = report.write_to_file(path) {
            eprintln!("Error writing report to {}: {}", path.display(), e);
            ExitCode::Failure.exit();
        }
    }

    ExitCode::Success.exit();
}

fn usage() -> ! {
    println!("{}", USAGE);
    ExitCode::Usage.exit()
}

fn run_explain(path: &Path) -> ! {
    let output = match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            eprintln!("Error reading {}: {}", path.display(), e);
            ExitCode::Failure.exit();
        }
    };

    println!("{}", explain(&output).to_human());
    ExitCode::Success.exit()
}
