//! DriveSentry Core Library
//!
//! This crate provides the core functionality for DriveSentry, including:
//! - Public-exposure evaluation of file permission sets
//! - A storage gateway over the provider's file and activity REST APIs
//! - The remediation engine that sweeps and revokes public sharing
//! - Poll- and push-based change triggers and the notification tunnel
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    drivesentry-core                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  exposure.rs     - public-exposure decision (pure)          │
//! │  gateway/        - StorageGateway trait, REST client        │
//! │  engine.rs       - remediation sweeps                       │
//! │  trigger/        - poll + push change triggers              │
//! │  tunnel/         - notification tunnel subprocess           │
//! │  orchestrator.rs - trigger selection and wiring             │
//! │  types/          - wire types                               │
//! │  error.rs        - error types                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod engine;
pub mod error;
pub mod exposure;
pub mod gateway;
pub mod orchestrator;
pub mod trigger;
pub mod tunnel;
pub mod types;

// Re-export commonly used types
pub use error::{Error, GatewayError, Result, TunnelError};
pub use types::*;

pub use engine::{RemediationEngine, SweepReport};
pub use exposure::{is_publicly_exposed, PUBLIC_PERMISSION_ID};
pub use gateway::{DriveGateway, StorageGateway};
pub use orchestrator::{Orchestrator, TriggerMode};
pub use trigger::{
    ChangeTrigger, PollTrigger, PushTrigger, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL,
};
pub use tunnel::{default_tunnel_args, NotificationTunnel, TunnelProcess};
