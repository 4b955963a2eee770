//! Remediation engine
//!
//! One sweep lists every file, evaluates each permission set and revokes
//! public exposure where it finds any. Per-file failures are contained: the
//! file is logged and skipped, the sweep keeps going.

use crate::error::{Error, GatewayError, Result};
use crate::exposure::{is_publicly_exposed, PUBLIC_PERMISSION_ID};
use crate::gateway::StorageGateway;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome counters for one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub files_checked: usize,
    pub exposures_found: usize,
    pub permissions_removed: usize,
    pub failures: usize,
}

/// Orchestrates list -> evaluate -> remediate over the storage gateway
pub struct RemediationEngine {
    gateway: Arc<dyn StorageGateway>,
}

impl RemediationEngine {
    pub fn new(gateway: Arc<dyn StorageGateway>) -> Self {
        Self { gateway }
    }

    /// Run one full pass over all files.
    ///
    /// A listing failure yields an empty report rather than an error: the
    /// long-running loop must survive a bad cycle. Running twice with no
    /// intervening provider-side changes removes nothing the second time.
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let files = match self.gateway.list_files().await {
            Ok(files) => files,
            Err(e) => {
                error!("Failed to list files, skipping sweep: {}", e);
                return report;
            }
        };

        for file in files {
            report.files_checked += 1;

            let permissions = match self.gateway.get_permissions(&file.id).await {
                Ok(permissions) => permissions,
                Err(e) => {
                    error!("Failed to get permissions for file {}: {}", file.id, e);
                    report.failures += 1;
                    continue;
                }
            };

            let exposed = match is_publicly_exposed(&file.id, &permissions) {
                Ok(exposed) => exposed,
                Err(e) => {
                    warn!("Skipping file {}: {}", file.id, e);
                    report.failures += 1;
                    continue;
                }
            };

            if !exposed {
                continue;
            }

            report.exposures_found += 1;
            info!(
                "File {} ({}) is publicly exposed, restricting permissions",
                file.id, file.name
            );

            match self
                .gateway
                .delete_permission(&file.id, PUBLIC_PERMISSION_ID)
                .await
            {
                Ok(true) => report.permissions_removed += 1,
                Ok(false) => report.failures += 1,
                Err(e) => {
                    error!(
                        "Failed to remove public permission from file {}: {}",
                        file.id, e
                    );
                    report.failures += 1;
                }
            }
        }

        info!(
            "Sweep finished: {} files checked, {} exposed, {} permissions removed, {} failures",
            report.files_checked,
            report.exposures_found,
            report.permissions_removed,
            report.failures
        );
        report
    }

    /// Log one file's permission entries (display name, email, role).
    pub async fn describe_file(&self, file_id: &str) -> Result<()> {
        let permissions = self.gateway.get_permissions(file_id).await?;
        if !permissions.has_valid_kind() {
            return Err(Error::Gateway(GatewayError::MalformedPermissions(format!(
                "unexpected kind {:?} in permission listing for file {}",
                permissions.kind, file_id
            ))));
        }

        let file = self.gateway.get_file_info(file_id).await?;
        info!("File permissions for {}:", file.name);
        for entry in permissions.entries() {
            info!(
                "    {} ({}) - {}",
                entry.display_name.as_deref().unwrap_or("-"),
                entry.email_address.as_deref().unwrap_or("-"),
                entry.role
            );
        }
        Ok(())
    }
}
