//! Change triggers
//!
//! Two interchangeable strategies decide *when* the remediation engine
//! sweeps: [`PollTrigger`] checks the activity feed on a fixed interval,
//! [`PushTrigger`] reacts to change-watch callbacks delivered through the
//! notification tunnel. Both share the [`ChangeTrigger`] contract and the
//! orchestrator picks exactly one.

mod poll;
mod push;

pub use poll::{PollTrigger, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use push::PushTrigger;

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// A strategy that decides when the remediation engine sweeps
#[async_trait]
pub trait ChangeTrigger: Send {
    /// Short strategy name for logs
    fn name(&self) -> &'static str;

    /// Run until the shutdown signal flips.
    ///
    /// An in-progress sleep or blocking read unwinds promptly on shutdown;
    /// no sweep runs on the way out.
    async fn run(&mut self, shutdown: watch::Receiver<bool>) -> Result<()>;
}
