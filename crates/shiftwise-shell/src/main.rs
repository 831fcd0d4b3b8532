//! Shiftwise shell - runs the session/role resolution engine against Supabase.

mod app;
mod dispatcher;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shiftwise_config_and_utils::{init_logging, Config, Paths};

/// Shiftwise shell command-line interface.
#[derive(Parser)]
#[command(name = "shiftwise-shell")]
#[command(about = "Session/role resolution shell for the Shiftwise workforce app")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Base directory for runtime files (config). Defaults to ~/.shiftwise
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the resolution engine in the foreground
    Run {
        /// Sign in with this email after starting
        #[arg(long)]
        email: Option<String>,

        /// Password for --email
        #[arg(long, env = "SHIFTWISE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Validate and print the effective configuration
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level);

    // Load configuration
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    match cli.command {
        Some(Commands::Run { email, password }) => {
            app::run_shell(config, email, password).await?;
        }
        None => {
            // Default to run if no command given
            app::run_shell(config, None, None).await?;
        }
        Some(Commands::CheckConfig) => {
            app::check_config(&config)?;
        }
    }

    Ok(())
}
