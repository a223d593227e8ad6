//! topic-ledger command line.
//!
//! # Commands
//! - `check-config`: load and validate a config file, print the effective config
//! - `demo`: run a topic lifecycle against the simulated ledger and print every
//!   result envelope as JSON

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use topic_ledger::config::{load_config, validate_config, ConfigError, TopicLedgerConfig};
use topic_ledger::keys::{Ed25519KeyResolver, KeyError, Operator, PrivateKey};
use topic_ledger::ledger::{AccountId, SimulatedLedger, SimulatedLedgerConfig};
use topic_ledger::observability::{logging::init_logging, metrics::init_metrics};
use topic_ledger::topics::{ServiceSettings, SubmitOptions, TopicService};

#[derive(Parser)]
#[command(name = "topic-ledger")]
#[command(about = "Topic lifecycle and message orchestration", long_about = None)]
struct Cli {
    /// Path to the TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config and print the effective settings
    CheckConfig,
    /// Create, update, write to, read from and delete a topic
    Demo {
        #[arg(long, default_value = "My First Topic")]
        memo: String,

        #[arg(long, default_value = "hello from topic-ledger")]
        message: String,
    },
}

fn load(path: Option<&PathBuf>) -> Result<TopicLedgerConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = TopicLedgerConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

fn print_json<T: Serialize>(label: &str, value: &T) -> Result<(), serde_json::Error> {
    println!("{}: {}", label, serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(cli.config.as_ref())?;

    match cli.command {
        Commands::CheckConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Demo { memo, message } => run_demo(config, &memo, &message).await,
    }
}

async fn run_demo(config: TopicLedgerConfig, memo: &str, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&config.observability)?;
    tracing::info!(network = %config.network.name, "topic-ledger v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let operator = match Operator::from_config(&config.operator, &Ed25519KeyResolver) {
        Ok(operator) => operator,
        Err(KeyError::MissingOperatorKey(var)) => {
            tracing::warn!(env_var = var, "No operator key configured, using a throwaway key");
            let account_id: AccountId = config.operator.account_id.parse()?;
            Operator::new(account_id, PrivateKey::generate())
        }
        Err(e) => return Err(e.into()),
    };
    let admin_key = operator.key().clone();

    let ledger = SimulatedLedger::new(operator, SimulatedLedgerConfig::from_config(&config));
    let service = TopicService::new(Arc::new(ledger), ServiceSettings::from_config(&config));

    let created = service.create_topic_with_memo(memo).await?;
    print_json("create_topic", &created)?;
    let topic_id = *created.result();

    let updated = service
        .update_topic_memo(topic_id, &admin_key, &format!("{} (updated)", memo))
        .await?;
    print_json("update_topic_memo", &updated)?;

    let subscription = service
        .subscribe_messages(topic_id, None, None, |received| {
            println!(
                "message #{} at {}: {}",
                received.sequence_number,
                received.consensus_timestamp,
                String::from_utf8_lossy(&received.contents)
            );
        })
        .await?;

    let submitted = service
        .submit_message(topic_id, message.as_bytes(), SubmitOptions::default())
        .await?;
    print_json("submit_message", &submitted)?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    let delivered = subscription.cancel().await?;
    tracing::info!(delivered, "Subscription cancelled");

    print_json("get_topic_info", &service.get_topic_info(topic_id).await?)?;

    let deleted = service.delete_topic(topic_id, &admin_key).await?;
    print_json("delete_topic", &deleted)?;

    tracing::info!("Demo complete");
    Ok(())
}
