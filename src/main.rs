//! dependency-fixup command line tool
//!
//! Usage: dependency-fixup <PRIMARY_MODULE> <CONFIG_PATTERN>

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use dependency_fixup::app::{self, RunOptions};
use dependency_fixup::binding::ConfigPattern;
use dependency_fixup::config::FixupConfig;
use dependency_fixup::utils::{env_opt, init_logging_from_config, CONFIG_ENV};

/// Write binding redirects for transitive dependency version conflicts
#[derive(Debug, Parser)]
#[command(name = "dependency-fixup", version, about)]
struct Cli {
    /// Path to the primary module
    primary_module: PathBuf,

    /// Config file to patch (wildcards ok, must end with .config)
    config_pattern: String,

    /// Tool configuration file (TOML); also read from DEPENDENCY_FIXUP_CONFIG
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, value_name = "FILTER")]
    log_filter: Option<String>,

    /// Print every chain of modules that requested each redirected module
    #[arg(long)]
    show_hierarchy: bool,

    /// Report redirects without modifying config files
    #[arg(long)]
    dry_run: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<FixupConfig> {
    let path = cli
        .config
        .clone()
        .or_else(|| env_opt(CONFIG_ENV).map(PathBuf::from));

    let mut config = match path {
        Some(path) => FixupConfig::from_toml_file(&path)
            .map_err(|e| e.context(format!("Failed to load config {}", path.display())))?,
        None => FixupConfig::default(),
    };

    if let Some(filter) = &cli.log_filter {
        config.logging.filter = Some(filter.clone());
    }
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging_from_config(&config.logging);

    let pattern = match ConfigPattern::new(&cli.config_pattern, &config.binding.config_suffix) {
        Ok(pattern) => pattern,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: dependency-fixup <PRIMARY_MODULE> <CONFIG_PATTERN (wildcards ok)>");
            return ExitCode::from(2);
        }
    };

    let options = RunOptions {
        show_hierarchy: cli.show_hierarchy,
        dry_run: cli.dry_run,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match app::run(&cli.primary_module, &pattern, &options, &config, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
