//! NDJSON event feed: one `ChainEvent` per line, in canonical chain order.

use std::io::BufRead;

use anyhow::{Context, Result};
use stakeledger_common::{ChainEvent, LedgerError};

/// Parse every non-blank line of the feed.
pub fn parse_feed<R: BufRead>(reader: R) -> Result<Vec<ChainEvent>> {
    let mut events = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read feed line {}", n + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ChainEvent = serde_json::from_str(&line)
            .with_context(|| format!("Malformed event on feed line {}", n + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// The ledger relies on the driver for ordering: block number ascending,
/// then log index ascending, no repeats.
pub fn check_order(events: &[ChainEvent]) -> Result<(), LedgerError> {
    for pair in events.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.ordering_key() >= next.ordering_key() {
            return Err(LedgerError::OutOfOrder {
                previous: describe(prev),
                next: describe(next),
            });
        }
    }
    Ok(())
}

fn describe(event: &ChainEvent) -> String {
    format!(
        "{}@{}:{}",
        event.event.event_type(),
        event.provenance.block_number,
        event.provenance.log_index
    )
}
