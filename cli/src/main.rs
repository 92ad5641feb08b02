use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};

use seek_config::ServiceConfig;
use seek_metrics::idempotency::{floor_to_seconds, UNPARSED_TIME_FIELD};
use seek_metrics::{metrics_job_key, MetricsEvent};
use seek_queue::InMemoryJobQueue;
use seek_rewards::{resolve_event_type, RewardEventEnqueuer};

/// Search event pipeline CLI
#[derive(Parser)]
#[command(name = "seek", version, about = "Wallet validation and search event queue tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and normalize a wallet address
    Validate {
        /// Arweave, EVM or Solana address
        address: String,
    },

    /// Show which reward event an application earns
    Eligible {
        /// Application identifier, e.g. graphql-images
        application: String,
    },

    /// Compute the idempotency key of a search metrics job
    MetricsKey {
        #[arg(long)]
        query: String,

        #[arg(long, default_value = "0")]
        offset: u64,

        /// Time the search completed, preferably RFC 3339
        #[arg(long)]
        timestamp: String,

        #[arg(long)]
        request_id: String,
    },

    /// Dry-run a reward event against an in-memory queue
    Reward {
        #[arg(long)]
        wallet: String,

        #[arg(long)]
        application: String,

        /// Event time (default: now)
        #[arg(long)]
        timestamp: Option<String>,

        /// Service config to take queue settings from
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Service configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the default configuration
    Init {
        #[arg(long, short, default_value = "seek.toml")]
        output: PathBuf,
    },

    /// Load a configuration, apply REDIS_* overrides and validate it
    Check {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { address } => cmd_validate(&address),
        Commands::Eligible { application } => cmd_eligible(&application),
        Commands::MetricsKey {
            query,
            offset,
            timestamp,
            request_id,
        } => cmd_metrics_key(query, offset, timestamp, request_id),
        Commands::Reward {
            wallet,
            application,
            timestamp,
            config,
        } => cmd_reward(&wallet, &application, timestamp, config).await,
        Commands::Config { command } => match command {
            ConfigCommands::Init { output } => cmd_config_init(output),
            ConfigCommands::Check { config } => cmd_config_check(config),
        },
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error encoding output: {e}");
        std::process::exit(1);
    });
    println!("{json}");
}

fn format_delays(delays: &[Duration]) -> String {
    if delays.is_empty() {
        return "none".to_string();
    }
    delays
        .iter()
        .map(|d| format!("{}ms", d.as_millis()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn cmd_validate(address: &str) {
    let result = seek_wallet::validate_and_normalize(address);
    print_json(&result);
    if !result.is_valid() {
        std::process::exit(1);
    }
}

fn cmd_eligible(application: &str) {
    match resolve_event_type(application) {
        Some(event_type) => println!("{application}: {event_type}"),
        None => {
            println!("{application}: not eligible");
            println!(
                "  Eligible applications: {}",
                seek_rewards::eligibility::eligible_applications()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
}

fn cmd_metrics_key(query: String, offset: u64, timestamp: String, request_id: String) {
    let event = MetricsEvent {
        request_id,
        query,
        offset,
        execution_time_ms: 0,
        total_results: 0,
        hits_count: 0,
        hits: Vec::new(),
        timestamp,
        user_agent: None,
    };
    if let Err(e) = floor_to_seconds(&event.timestamp) {
        eprintln!("Warning: {e}; keying on {UNPARSED_TIME_FIELD}");
    }
    println!("{}", metrics_job_key(&event));
}

fn load_config(path: Option<PathBuf>) -> ServiceConfig {
    let Some(path) = path else {
        return ServiceConfig::default();
    };
    let config = ServiceConfig::from_file(&path).unwrap_or_else(|e| {
        eprintln!("Error reading config {}: {e}", path.display());
        std::process::exit(1);
    });
    config.validate().unwrap_or_else(|e| {
        eprintln!("Config validation failed: {e}");
        std::process::exit(1);
    });
    config
}

async fn cmd_reward(
    wallet: &str,
    application: &str,
    timestamp: Option<String>,
    config: Option<PathBuf>,
) {
    let config = load_config(config);
    let queue = Arc::new(InMemoryJobQueue::new(
        config.rewards.queue.clone(),
        config.rewards.options,
    ));
    let enqueuer = RewardEventEnqueuer::new(queue.clone());
    let timestamp =
        timestamp.unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

    match enqueuer.try_enqueue(wallet, application, &timestamp).await {
        Ok(receipt) => {
            let Some(job) = queue.get(&receipt.job_id) else {
                eprintln!("Job {} missing from queue", receipt.job_id);
                std::process::exit(1);
            };
            println!("Reward event accepted (dry run)");
            println!("  Queue: {}", receipt.queue);
            println!("  Job: {} (id {})", job.name, job.id);
            println!("  Attempts: {}", job.options.attempts);
            println!(
                "  Backoff: {:?} from {}ms",
                job.options.backoff.kind, job.options.backoff.delay_ms
            );
            println!(
                "  Retry delays: {}",
                format_delays(&job.options.retry_schedule())
            );
            println!("  On complete: {}", job.options.remove_on_complete);
            println!("  On fail: {}", job.options.remove_on_fail);
            print_json(&job.payload);
        }
        Err(e) => {
            println!("Reward event not enqueued: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config_init(output: PathBuf) {
    let config = ServiceConfig::default();
    config.to_file(&output).unwrap_or_else(|e| {
        eprintln!("Error writing config file: {e}");
        std::process::exit(1);
    });

    println!("Config file created: {}", output.display());
    println!("  Broker mode: {}", config.connection.mode);
    println!("  Rewards queue: {}", config.rewards.queue);
    println!("  Metrics queue: {}", config.metrics.queue);
}

fn cmd_config_check(path: PathBuf) {
    let mut config = ServiceConfig::from_file(&path).unwrap_or_else(|e| {
        eprintln!("Error reading config {}: {e}", path.display());
        std::process::exit(1);
    });
    config
        .apply_env_overrides(|key| std::env::var(key).ok())
        .unwrap_or_else(|e| {
            eprintln!("Invalid environment override: {e}");
            std::process::exit(1);
        });
    config.validate().unwrap_or_else(|e| {
        eprintln!("Config validation failed: {e}");
        std::process::exit(1);
    });

    let conn = &config.connection;
    println!("Config OK: {}", path.display());
    println!("  Broker mode: {}", conn.mode);
    match conn.mode {
        seek_config::ConnectionMode::Standalone => println!(
            "  Broker: {}:{}",
            conn.host.as_deref().unwrap_or_default(),
            conn.port.unwrap_or_default()
        ),
        seek_config::ConnectionMode::Sentinel => {
            println!("  Master: {}", conn.master_name.as_deref().unwrap_or_default());
            for s in &conn.sentinels {
                println!("  Sentinel: {}:{}", s.host, s.port);
            }
        }
    }
    println!(
        "  Connect retries: {} ({})",
        conn.max_connect_retries,
        format_delays(&config.connect_retry_schedule())
    );
    println!("  Rewards queue: {} ({} attempts)", config.rewards.queue, config.rewards.options.attempts);
    println!("  Metrics queue: {} ({} attempts)", config.metrics.queue, config.metrics.options.attempts);
}
