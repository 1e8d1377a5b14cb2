use std::fs::File;
use std::io::{self, BufReader};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stakeledger_common::{tables, Account, ChainEvent, Config, ProtocolAggregate, PROTOCOL_ID};
use stakeledger_engine::{DispatchOutcome, DispatchSummary, Dispatcher};
use stakeledger_store::{EntityStore, MemoryEntityStore, PgEntityStore};

mod feed;

/// Fold an NDJSON feed of decoded staking events into ledger state.
#[derive(Parser, Debug)]
#[command(name = "stakeledger-replay")]
struct Args {
    /// Event feed, one ChainEvent per line. `-` reads stdin.
    #[arg(long, default_value = "-")]
    input: String,

    /// Postgres connection string. Overrides DATABASE_URL. Without either,
    /// state is kept in memory and summarized at the end.
    #[arg(long)]
    database_url: Option<String>,

    /// Lock window for a newly created protocol row. Overrides MIN_LOCK_DURATION.
    #[arg(long)]
    min_lock_duration: Option<u64>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter = EnvFilter::from_default_env().add_directive("stakeledger=info".parse()?);
    if args.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut config = Config::from_env()?;
    if let Some(url) = args.database_url.clone() {
        config.database_url = Some(url);
    }
    if let Some(duration) = args.min_lock_duration {
        config.ledger.default_min_lock_duration = duration;
    }
    config.log_redacted();

    let events = read_events(&args.input)?;
    feed::check_order(&events)?;
    info!(events = events.len(), "Feed loaded");

    match config.database_url.as_deref() {
        Some(url) => {
            let store = PgEntityStore::connect(url).await?;
            let dispatcher = Dispatcher::new(store, config.ledger);
            replay(&dispatcher, &events).await?;
        }
        None => {
            let dispatcher = Dispatcher::new(MemoryEntityStore::new(), config.ledger);
            replay(&dispatcher, &events).await?;
            log_final_state(dispatcher.store()).await?;
        }
    }

    Ok(())
}

fn read_events(input: &str) -> Result<Vec<ChainEvent>> {
    if input == "-" {
        feed::parse_feed(io::stdin().lock())
    } else {
        let file = File::open(input).with_context(|| format!("Failed to open feed {input}"))?;
        feed::parse_feed(BufReader::new(file))
    }
}

/// Dispatch serially, stopping at the first failure. The driver owns retry.
async fn replay<S: EntityStore>(dispatcher: &Dispatcher<S>, events: &[ChainEvent]) -> Result<DispatchSummary> {
    let mut summary = DispatchSummary::default();

    for event in events {
        let outcome = dispatcher.dispatch(event).await.map_err(|e| {
            error!(
                event_id = %event.id(),
                block = event.provenance.block_number,
                log_index = event.provenance.log_index,
                error = %e,
                "Dispatch failed"
            );
            e
        })?;

        match outcome {
            DispatchOutcome::Applied { event_id, .. } => {
                summary.applied += 1;
                info!(
                    event_id = %event_id,
                    kind = event.event.event_type(),
                    block = event.provenance.block_number,
                    "Event applied"
                );
            }
            DispatchOutcome::Duplicate { .. } => summary.duplicates += 1,
        }
    }

    info!(
        applied = summary.applied,
        duplicates = summary.duplicates,
        "Replay complete"
    );
    Ok(summary)
}

async fn log_final_state(store: &MemoryEntityStore) -> Result<()> {
    if let Some(payload) = store.load(tables::PROTOCOL, PROTOCOL_ID).await? {
        let protocol: ProtocolAggregate = serde_json::from_value(payload)?;
        info!(
            total_staked = %protocol.total_staked,
            current_reward_rate = %protocol.current_reward_rate,
            total_rewards_distributed = %protocol.total_rewards_distributed,
            "Protocol"
        );
    }

    for row in store.rows(tables::ACCOUNT) {
        let account: Account = serde_json::from_value(row.payload)?;
        info!(
            account = %account.id,
            staked = %account.staked_amount,
            pending_rewards = %account.pending_rewards,
            last_stake = account.last_stake_timestamp,
            "Account"
        );
    }

    info!(positions = store.count(tables::STAKE_POSITION), "Stake positions");
    Ok(())
}
