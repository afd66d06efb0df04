//! cardea command-line entry point.
//!
//! ```text
//! cardea run [-c DIR] [-v NAME] [-w] [--verbose]
//!     → init logging
//!     → Loader::new(DIR).with_vars_dir(NAME).load()
//!     → validate (warnings only)
//!     → print the materialized config
//!     → (--watch) reprint on every successful reload until SIGINT/SIGTERM
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use cardea::config::{validate_config, Config, ConfigWatcher, Loader, DEFAULT_VARS_DIR};
use cardea::lifecycle::signals::shutdown_signal;
use cardea::observability::logging;

#[derive(Parser)]
#[command(name = "cardea", version, about = "Hierarchical, templated configuration loader")]
struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the configuration directory and print the result
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Root configuration directory
    #[arg(short, long, env = "CARDEA_CONFIG", default_value = "config")]
    config: PathBuf,

    /// Vars directory name, relative to the config root
    #[arg(short, long, env = "CARDEA_VARS", default_value = DEFAULT_VARS_DIR)]
    vars: String,

    /// Keep running and reload when files under the root change
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> ExitCode {
    let loader = Loader::new(&args.config).with_vars_dir(&args.vars);

    tracing::info!(
        root = %loader.root().display(),
        vars = %loader.vars_dir().display(),
        "cardea starting"
    );

    let config = match loader.clone().load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, kind = ?err.kind(), "Failed to load config");
            return ExitCode::FAILURE;
        }
    };
    report(&config);

    if !args.watch {
        return ExitCode::SUCCESS;
    }

    let (watcher, mut updates) = ConfigWatcher::new(loader);
    // Dropping the handle stops the watch, so hold it for the loop's lifetime.
    let _handle = match watcher.run() {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "Failed to start config watcher");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => report(&config),
                None => break,
            },
            signal = &mut shutdown => {
                tracing::info!(signal, "Shutting down");
                break;
            }
        }
    }

    ExitCode::SUCCESS
}

fn report(config: &Config) {
    if let Err(issues) = validate_config(config) {
        for issue in issues {
            tracing::warn!(field = %issue.field, "{}", issue.message);
        }
    }
    println!("{config:#?}");
}
