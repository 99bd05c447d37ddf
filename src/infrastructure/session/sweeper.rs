//! Background eviction of idle sessions

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::ResearchOrchestrator;

/// Periodically evict sessions idle longer than `max_idle`
pub fn spawn_idle_sweeper(
    orchestrator: Arc<ResearchOrchestrator>,
    max_idle: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match orchestrator.evict_idle(max_idle).await {
                Ok(evicted) if !evicted.is_empty() => {
                    debug!(count = evicted.len(), "Idle sweep evicted sessions");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Idle session sweep failed"),
            }
        }
    })
}
