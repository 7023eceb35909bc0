//! ExtGen CLI - Bridge interface for build scripts
//!
//! Commands: prepare, expand, toolchain
//! Outputs JSON to stdout, logs to stderr
//! Returns non-zero on preparation failure

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use extgen_core::{PrepareConfig, SourcePreparer, ENGINE_VERSION};

#[derive(Parser)]
#[command(name = "extgen-cli")]
#[command(version = ENGINE_VERSION)]
#[command(about = "ExtGen CLI - Extension Source Preparer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Translator program to run
    #[arg(long, global = true)]
    translator: Option<String>,

    /// Minimum translator version
    #[arg(long, global = true)]
    min_version: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand templates and translate sources
    Prepare {
        /// Directory the files are resolved against
        #[arg(short = 'C', long, default_value = ".")]
        working_dir: PathBuf,

        /// Do nothing (the build is being cleaned)
        #[arg(long)]
        clean: bool,

        /// Translate even when outputs are up to date
        #[arg(long)]
        force: bool,

        /// Template and source files; a leading `clean` acts like --clean
        files: Vec<String>,
    },

    /// Expand a single template
    Expand {
        file: PathBuf,
    },

    /// Report the detected translator
    Toolchain,
}

fn load_config(path: Option<&Path>) -> Result<PrepareConfig, String> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
            serde_json::from_str(&content)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))
        }
        None => Ok(PrepareConfig::default()),
    }
}

fn print_failure(error: impl std::fmt::Display) {
    let output = serde_json::json!({
        "success": false,
        "error": error.to_string(),
    });
    println!("{}", output);
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env().init();

    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            print_failure(e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(translator) = cli.translator {
        config.translator = translator;
    }
    if let Some(min_version) = cli.min_version {
        config.min_translator_version = min_version;
    }

    match cli.command {
        Commands::Prepare { working_dir, clean, force, mut files } => {
            // Build scripts may forward their own arguments verbatim
            let clean = clean || files.first().map_or(false, |f| f == "clean");
            if clean {
                files.clear();
            }
            config.force |= force;

            let preparer = SourcePreparer::new(config);
            match preparer.prepare(&files, &working_dir, clean) {
                Ok(outcome) => {
                    let output = serde_json::json!({
                        "success": true,
                        "outcome": outcome,
                    });
                    println!("{}", output);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_failure(e);
                    ExitCode::from(2)
                }
            }
        }

        Commands::Expand { file } => {
            let preparer = SourcePreparer::new(config);
            match preparer.expand(&file) {
                Ok(output) => {
                    println!("{}", serde_json::json!({ "success": true, "output": output }));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_failure(e);
                    ExitCode::from(2)
                }
            }
        }

        Commands::Toolchain => {
            let preparer = SourcePreparer::new(config);
            match preparer.toolchain_status() {
                Ok(status) => {
                    println!("{}", serde_json::json!(status));
                    if status.usable {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2)
                    }
                }
                Err(e) => {
                    print_failure(e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
