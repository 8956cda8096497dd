use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::MatchPolicy;
use crate::models::{MatchEvent, MatchEventKind};
use crate::services::{EventPublisher, PostgresStore};

/// Background expiry sweep
///
/// Moves due pending offers to expired on a fixed interval. Every
/// transition is a compare-and-set on 'pending', so re-running the sweep
/// (or racing a swipe) can never overwrite a matched row.
pub fn spawn_expiry_sweeper(
    store: Arc<PostgresStore>,
    events: Arc<EventPublisher>,
    policy: MatchPolicy,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = sweep_once(&store, &events, &policy).await {
                tracing::error!("Expiry sweep failed: {}", e);
            }
        }
    })
}

/// One sweep pass; drains in batches until no due rows remain
pub async fn sweep_once(
    store: &PostgresStore,
    events: &EventPublisher,
    policy: &MatchPolicy,
) -> Result<usize, crate::services::StoreError> {
    let mut total = 0usize;

    loop {
        let now = Utc::now();
        let expired = store.expire_due(now, policy.sweep_batch).await?;
        if expired.is_empty() {
            break;
        }

        total += expired.len();
        for m in &expired {
            let event = MatchEvent::for_match(MatchEventKind::Expired, m, now);
            if let Err(e) = events.publish(&event).await {
                tracing::warn!("Failed to publish expiry event for {}: {}", m.id, e);
            }
        }

        if (expired.len() as i64) < policy.sweep_batch {
            break;
        }
    }

    if total > 0 {
        tracing::info!("Expiry sweep transitioned {} matches", total);
    }
    Ok(total)
}
