//! Notification tunnel collaborator
//!
//! The tunnel is an external process that exposes a public callback URL and
//! relays inbound HTTP requests as a local line stream. It is modeled as an
//! injectable capability so the push trigger can be tested against a fake
//! stream instead of a spawned subprocess.

mod process;

pub use process::{default_tunnel_args, TunnelProcess};

use crate::error::Result;
use async_trait::async_trait;

/// Capability surface of the notification tunnel collaborator
#[async_trait]
pub trait NotificationTunnel: Send + Sync {
    /// Launch the collaborator and return its public callback URL
    async fn start(&mut self) -> Result<String>;

    /// Next raw notification record, or `None` once the stream has closed
    async fn next_record(&mut self) -> Option<String>;

    /// Tear the collaborator down, terminating any owned subprocess
    async fn stop(&mut self) -> Result<()>;
}
