//! yad2-watch CLI
//!
//! Local entry point: one-off scans, topic administration and a periodic
//! watch loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use yad2_watch::{
    error::Result,
    models::Config,
    pipeline::{self, Scanner},
};

/// yad2-watch - new listing notifier for Yad2 searches
#[derive(Parser, Debug)]
#[command(
    name = "yad2-watch",
    version,
    about = "Watches Yad2 result pages and reports new listings"
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan all enabled topics, or a single one by name
    Scan {
        /// Topic name (default: every enabled topic)
        topic: Option<String>,
    },

    /// Add a topic, or update the URL of an existing one
    Add {
        /// Topic name
        topic: String,
        /// Yad2 results page URL
        url: String,
    },

    /// List configured topics
    List,

    /// Validate the configuration file
    Validate,

    /// Scan every `check_interval_minutes` until interrupted
    Watch {
        /// Run a single scan and exit
        #[arg(long)]
        once: bool,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Scan { topic } => {
            let config = Config::load_or_default(&cli.config)?;
            let scanner = Scanner::from_config(config)?;

            let output = match topic {
                Some(name) => scanner.scan_topic(&name).await?.render(),
                None => scanner.scan().await.render(),
            };
            println!("{output}");
        }

        Command::Add { topic, url } => {
            let message = pipeline::add_or_update_topic(&cli.config, &topic, &url)?;
            println!("{message}");
        }

        Command::List => {
            let config = Config::load_or_default(&cli.config)?;
            println!("{}", pipeline::list_topics(&config));
        }

        Command::Validate => {
            log::info!("Validating {}...", cli.config.display());

            let config = Config::load(&cli.config)?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            for (topic, e) in config.invalid_topic_urls() {
                log::warn!("Topic '{}' has an invalid URL and will fail: {e}", topic.name);
            }

            log::info!(
                "Config OK: {} topics ({} enabled)",
                config.projects.len(),
                config.enabled_topics().count()
            );
        }

        Command::Watch { once } => watch(&cli.config, once).await,
    }

    Ok(())
}

/// Repeat full scans, reloading the configuration before each one.
///
/// Ctrl-C is honored between scans; a scan in progress runs to the end.
async fn watch(config_path: &Path, once: bool) {
    // Kept from the last readable config when a reload fails.
    let mut interval = Config::default().check_interval();

    loop {
        match run_cycle(config_path).await {
            Ok(next) => interval = next,
            Err(e) => log::error!("Scan cycle failed: {e}"),
        }

        if once {
            return;
        }

        log::info!("Next scan in {} minutes", interval.as_secs() / 60);
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, stopping watch");
                return;
            }
        }
    }
}

/// One watch cycle. Returns the configured wait before the next one.
async fn run_cycle(config_path: &Path) -> Result<Duration> {
    let config = Config::load_or_default(config_path)?;
    let interval = config.check_interval();

    let summary = Scanner::from_config(config)?.scan().await;
    println!("{}", summary.render());

    Ok(interval)
}
