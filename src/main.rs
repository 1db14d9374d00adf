//! `directive-engine` command line.
//!
//! ```text
//! directive-engine [--settings engine.toml] check <file>
//! directive-engine [--settings engine.toml] dump <file>
//! ```
//!
//! Both commands parse `<file>` with the reference modules and run their
//! per-context init hooks. `dump` prints the merged tree as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};

use directive_engine::config::loader::load_config;
use directive_engine::observability::init_logging;
use directive_engine::{modules, EngineConfig, FsReader, Parser};

#[derive(ClapParser)]
#[command(name = "directive-engine")]
#[command(about = "Parse and inspect directive configuration files", long_about = None)]
struct Cli {
    /// Engine settings (TOML)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a configuration file and report the first error
    Check { file: PathBuf },
    /// Parse a configuration file and print the merged tree as JSON
    Dump { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.settings {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                return ExitCode::from(2);
            }
        },
        None => EngineConfig::default(),
    };
    init_logging(&config.logging);

    match run(&cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Commands, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = modules::registry()?;
    let reader = FsReader;
    let parser = Parser::new(&registry, &reader).with_settings(config.parser.clone());

    match command {
        Commands::Check { file } => {
            let tree = parser.parse_file(file)?;
            registry.init_context(&tree)?;
            tracing::info!(file = %file.display(), contexts = tree.walk().len(), "Configuration is valid");
            println!("{}: syntax is ok", file.display());
        }
        Commands::Dump { file } => {
            let tree = parser.parse_file(file)?;
            registry.init_context(&tree)?;
            println!("{}", serde_json::to_string_pretty(&tree.to_json()?)?);
        }
    }
    Ok(())
}
