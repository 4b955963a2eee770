//! Fixed-interval polling trigger

use crate::engine::RemediationEngine;
use crate::error::Result;
use crate::gateway::StorageGateway;
use crate::trigger::ChangeTrigger;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Floor below which polling would hit the provider's rate limit
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default interval between activity checks. The provider's documented rate
/// limit is far lower than one query per 5 seconds; 30s keeps a wide margin.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    Idle,
    Checking,
    Sleeping,
}

impl PollState {
    fn name(self) -> &'static str {
        match self {
            PollState::Idle => "idle",
            PollState::Checking => "checking",
            PollState::Sleeping => "sleeping",
        }
    }
}

/// Polls the activity feed on a fixed interval and sweeps when a batch
/// contains creation events.
///
/// The activity checkpoint is owned by the instance, so independent
/// triggers never interfere with each other.
pub struct PollTrigger {
    gateway: Arc<dyn StorageGateway>,
    engine: RemediationEngine,
    interval: Duration,
    state: PollState,
    /// Unix-ms lower bound for the next activity query
    last_activity_check: i64,
}

impl PollTrigger {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        engine: RemediationEngine,
        interval: Duration,
    ) -> Self {
        let interval = if interval < MIN_POLL_INTERVAL {
            warn!(
                "Poll interval {:?} is below the {:?} floor, clamping",
                interval, MIN_POLL_INTERVAL
            );
            MIN_POLL_INTERVAL
        } else {
            interval
        };

        Self {
            gateway,
            engine,
            interval,
            state: PollState::Idle,
            last_activity_check: Utc::now().timestamp_millis(),
        }
    }

    /// Current activity checkpoint (unix ms)
    pub fn last_activity_check(&self) -> i64 {
        self.last_activity_check
    }

    fn transition(&mut self, next: PollState) {
        debug!("Poll state {} -> {}", self.state.name(), next.name());
        self.state = next;
    }

    /// One Idle -> Checking cycle. Returns whether a sweep ran.
    ///
    /// The checkpoint advances to the moment the check *started*, never its
    /// completion time, so events landing during processing stay inside the
    /// next query's window. A failed fetch leaves it untouched.
    async fn check_once(&mut self) -> Result<bool> {
        self.transition(PollState::Checking);
        let cycle_start = Utc::now().timestamp_millis();

        let activities = self
            .gateway
            .list_activity_since(self.last_activity_check)
            .await?;
        self.last_activity_check = cycle_start;

        if activities.is_empty() {
            info!("No activities found");
            return Ok(false);
        }

        // One sweep per batch: the first creation event is enough.
        if activities.iter().any(|activity| activity.is_creation()) {
            self.engine.sweep().await;
            return Ok(true);
        }

        Ok(false)
    }
}

#[async_trait]
impl ChangeTrigger for PollTrigger {
    fn name(&self) -> &'static str {
        "poll"
    }

    async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("Checking activity every {:?}", self.interval);

        while !*shutdown.borrow() {
            if let Err(e) = self.check_once().await {
                error!("Activity check failed: {}", e);
            }

            self.transition(PollState::Sleeping);
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    self.transition(PollState::Idle);
                }
                _ = shutdown.changed() => {
                    info!("Poll trigger interrupted");
                    break;
                }
            }
        }

        Ok(())
    }
}
