//! Core type definitions for DriveSentry
//!
//! This module contains the wire types exchanged with the storage provider
//! and with the notification tunnel: file and permission listings, activity
//! pages, and the change-watch channel payload.

mod channel_types;
mod drive_types;

pub use channel_types::*;
pub use drive_types::*;
