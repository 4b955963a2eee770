//! Storage provider gateway
//!
//! This module abstracts the remote storage API behind the
//! [`StorageGateway`] trait: file listings, permission reads and deletes,
//! account info, the activity feed and change-watch registration. The REST
//! implementation is [`DriveGateway`]; everything above it (engine,
//! triggers) only sees the trait, so tests run against a mock.

mod http;
mod rest;

pub use rest::DriveGateway;

use crate::error::Result;
use crate::types::{AccountInfo, ActivityEvent, FileInfo, FileRef, PermissionList, WatchChannel};
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Capability set against the remote storage provider.
///
/// Every operation is network-bound and fallible; authentication and
/// transport details live behind the implementation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// List the account's files (single page, minimal listing path)
    async fn list_files(&self) -> Result<Vec<FileRef>>;

    /// Fetch full metadata for one file
    async fn get_file_info(&self, file_id: &str) -> Result<FileInfo>;

    /// Fetch a file's permission set
    async fn get_permissions(&self, file_id: &str) -> Result<PermissionList>;

    /// Delete one permission entry; true iff the provider confirmed the
    /// deletion, false on any failure
    async fn delete_permission(&self, file_id: &str, permission_id: &str) -> Result<bool>;

    /// Fetch account information
    async fn get_account_info(&self) -> Result<AccountInfo>;

    /// Fetch all creation activity at or after `since_ms`, paging through
    /// the feed until no page token remains
    async fn list_activity_since(&self, since_ms: i64) -> Result<Vec<ActivityEvent>>;

    /// Fetch the current change-feed checkpoint token
    async fn get_start_page_token(&self) -> Result<String>;

    /// Register a change watch; true iff the provider accepted the
    /// registration, false (logged, never fatal) otherwise
    async fn register_change_watch(
        &self,
        channel: &WatchChannel,
        start_page_token: &str,
    ) -> Result<bool>;
}
