//! Indium CLI
//!
//! Host for the theme engine:
//! - `build`: replace `@indium-theme;` in a stylesheet
//! - `watch`: rebuild when the stylesheet or the token configuration changes
//! - `emit`: print the generated theme CSS
//! - `check`: load and validate the token configuration
//! - `init`: scaffold an `indium.config.*` file

mod build;
mod scaffold;
mod watch;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indium_theme::{
    generate_theme_css, load_config, load_config_from, ConfigFormat, Diagnostics, LoadedConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Design-token stylesheet tooling for Indium UI
#[derive(Parser, Debug)]
#[command(name = "indium")]
#[command(about = "Build, watch, and check Indium UI design-token stylesheets")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Where the token configuration comes from
#[derive(clap::Args, Debug, Clone)]
struct ConfigArgs {
    /// Project directory searched for indium.config.*
    #[arg(long, default_value = ".")]
    cwd: PathBuf,

    /// Explicit configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> LoadedConfig {
        match &self.config {
            Some(path) => load_config_from(Some(path)),
            None => load_config(&self.cwd),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the theme directive in a stylesheet
    Build {
        /// Input stylesheet
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Rebuild on stylesheet or configuration changes
    Watch {
        /// Input stylesheet
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the generated theme CSS
    Emit {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Validate the token configuration
    Check {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Create an example configuration file
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Configuration format
        #[arg(short, long, value_enum, default_value_t = Format::Toml)]
        format: Format,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format {
    Toml,
    Json,
    Yaml,
}

impl From<Format> for ConfigFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Toml => ConfigFormat::Toml,
            Format::Json => ConfigFormat::Json,
            Format::Yaml => ConfigFormat::Yaml,
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build {
            input,
            output,
            config,
        } => build::run(&input, output.as_deref(), &config.cwd, config.config).await,
        Command::Watch {
            input,
            output,
            config,
        } => watch::run(&input, &output, &config.cwd, config.config).await,
        Command::Emit { config } => emit(&config),
        Command::Check { config } => check(&config),
        Command::Init {
            path,
            format,
            force,
        } => {
            let written = scaffold::create_config(&path, format.into(), force)?;
            info!("Created {}", written.display());
            Ok(())
        }
    }
}

fn emit(args: &ConfigArgs) -> Result<()> {
    let loaded = args.load();
    let mut diagnostics = Diagnostics::new();
    let css = generate_theme_css(&loaded.config, &mut diagnostics);
    println!("{css}");
    Ok(())
}

fn check(args: &ConfigArgs) -> Result<()> {
    let loaded = args.load();

    match &loaded.path {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend(loaded.warnings.iter().cloned());
    generate_theme_css(&loaded.config, &mut diagnostics);

    if let Some(reason) = &loaded.fallback_reason {
        bail!("config could not be loaded: {reason}");
    }
    if diagnostics.is_empty() {
        info!("No problems found");
    } else {
        warn!("{} problem(s) found", diagnostics.len());
    }
    Ok(())
}
