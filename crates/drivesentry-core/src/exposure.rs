//! Public-exposure evaluation
//!
//! A file is publicly exposed when its permission set contains the
//! provider's well-known "anyone with the link" entry. The decision is a
//! pure function of the permission set: deterministic, order-independent,
//! no side effects.

use crate::error::{Error, GatewayError, Result};
use crate::types::PermissionList;
use tracing::debug;

/// Sentinel permission id granting access to anyone holding the link
pub const PUBLIC_PERMISSION_ID: &str = "anyoneWithLink";

/// Decide whether `permissions` exposes the file to anyone with the link.
///
/// Fails with [`GatewayError::MalformedPermissions`] when the listing
/// carries an unexpected `kind` discriminator; such a set must never be
/// acted on.
pub fn is_publicly_exposed(file_id: &str, permissions: &PermissionList) -> Result<bool> {
    if !permissions.has_valid_kind() {
        return Err(Error::Gateway(GatewayError::MalformedPermissions(format!(
            "unexpected kind {:?} in permission listing for file {}",
            permissions.kind, file_id
        ))));
    }

    let exposed = permissions
        .entries()
        .iter()
        .any(|entry| entry.id == PUBLIC_PERMISSION_ID);

    if exposed {
        debug!("File {} is publicly exposed", file_id);
    } else {
        debug!("File {} is not publicly exposed", file_id);
    }
    Ok(exposed)
}
