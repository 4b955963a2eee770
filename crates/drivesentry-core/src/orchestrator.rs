//! Trigger selection and top-level wiring

use crate::error::Result;
use crate::trigger::ChangeTrigger;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

/// Which trigger strategy drives the remediation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    Poll,
    Push,
}

impl Default for TriggerMode {
    fn default() -> Self {
        Self::Poll
    }
}

/// Runs exactly one configured trigger until interrupted.
///
/// No business logic lives here; the trigger owns the loop and the engine
/// owns the sweeps.
pub struct Orchestrator {
    trigger: Box<dyn ChangeTrigger>,
}

impl Orchestrator {
    pub fn new(trigger: Box<dyn ChangeTrigger>) -> Self {
        Self { trigger }
    }

    /// Drive the trigger to completion; returns when the shutdown signal
    /// flips or the trigger fails fatally.
    pub async fn run(mut self, shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("Starting {} trigger", self.trigger.name());
        self.trigger.run(shutdown).await
    }
}
