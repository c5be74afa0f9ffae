//! Fixture rewriter
//!
//! Retargets `d8.file.execute('test/mjsunit/...')` imports under a fixture
//! tree to another directory, then compiles every fixture once to confirm
//! the tree is still usable.

use clap::error::ErrorKind;
use clap::Parser;
use fuzzil_corpus_tools::rewrite;
use fuzzil_corpus_tools::{ConfigFile, ExitCode, RewriteConfig, RewriteError};
use std::path::PathBuf;

const USAGE: &str = "Usage: auto_gen <target_directory> <desired_directory>";

#[derive(Parser)]
#[command(name = "auto_gen")]
#[command(about = "Rewrite fixture imports and verify each fixture compiles", version)]
struct Cli {
    /// Fixture tree to rewrite in place
    target: PathBuf,

    /// Directory name substituted for the import prefix
    desired: String,

    /// Verification command, split on whitespace (`--compile <file>` is appended)
    #[arg(long)]
    verifier: Option<String>,

    /// Path to a TOML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            println!("{}", USAGE);
            ExitCode::Failure.exit();
        }
    };

    fuzzil_corpus_tools::init_logging();

    let mut config = RewriteConfig::new(cli.target, cli.desired);
    if let Some(ref path) = cli.config {
        match ConfigFile::from_file(path) {
            Ok(file) => config = config.with_file(&file),
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                ExitCode::Failure.exit();
            }
        }
    }
    let config = config.with_verifier_command(cli.verifier.as_deref());

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        ExitCode::Failure.exit();
    }

    let result = rewrite::run(&config, |path| {
        println!("Successfully compiled {}", path.display());
    });

    match result {
        Ok(_) => ExitCode::Success.exit(),
        Err(RewriteError::UnexpectedOutput { path, stdout }) => {
            println!("Failed to compile {}", path.display());
            println!("{}", stdout);
            ExitCode::Failure.exit();
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::Failure.exit();
        }
    }
}
