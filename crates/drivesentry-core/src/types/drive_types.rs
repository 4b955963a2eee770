//! Wire types for the storage provider's file, permission and activity APIs

use serde::{Deserialize, Serialize};

/// Expected discriminator on a permission listing response
pub const PERMISSION_LIST_KIND: &str = "drive#permissionList";

/// A file as returned by a listing call.
///
/// Identity is the opaque `id`; the snapshot has no lifecycle of its own and
/// is re-fetched on every sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub id: String,
    pub name: String,
}

/// Response body of the file listing endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileList {
    pub files: Option<Vec<FileRef>>,
}

/// Full metadata for a single file (only the fields we report on)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub id: String,
    pub name: String,
    pub mime_type: Option<String>,
}

/// One entry in a file's permission set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEntry {
    pub id: String,
    pub email_address: Option<String>,
    pub role: String,
    pub display_name: Option<String>,
}

/// A file's permission set as returned by the permissions endpoint.
///
/// The `kind` discriminator, when present, must match
/// [`PERMISSION_LIST_KIND`]; a listing with any other tag is malformed and
/// rejected before evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionList {
    pub kind: Option<String>,
    pub permissions: Option<Vec<PermissionEntry>>,
}

impl PermissionList {
    /// True when the discriminator is absent or carries the expected tag
    pub fn has_valid_kind(&self) -> bool {
        match &self.kind {
            Some(kind) => kind == PERMISSION_LIST_KIND,
            None => true,
        }
    }

    /// Entries in listing order; empty when the provider omitted the field
    pub fn entries(&self) -> &[PermissionEntry] {
        self.permissions.as_deref().unwrap_or_default()
    }
}

/// Account information from the `about` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub user: Option<AccountUser>,
}

/// The authenticated user behind the account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUser {
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

/// One activity event from the activity query endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub primary_action_detail: Option<ActionDetail>,
    pub timestamp: Option<String>,
}

impl ActivityEvent {
    /// True when the event's primary action is a file creation
    pub fn is_creation(&self) -> bool {
        self.primary_action_detail
            .as_ref()
            .map(|detail| detail.create.is_some())
            .unwrap_or(false)
    }
}

/// Primary action detail of an activity event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDetail {
    pub create: Option<serde_json::Value>,
}

/// One page of the activity query response.
///
/// Callers must keep fetching while `next_page_token` is present and
/// concatenate `activities` in page order before treating a batch as
/// complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQueryResponse {
    pub activities: Option<Vec<ActivityEvent>>,
    pub next_page_token: Option<String>,
}

/// Response body of the start-page-token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPageTokenResponse {
    pub start_page_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_permission_list_kind_validity() {
        let valid = PermissionList {
            kind: Some(PERMISSION_LIST_KIND.to_string()),
            permissions: None,
        };
        assert!(valid.has_valid_kind());

        let missing = PermissionList::default();
        assert!(missing.has_valid_kind());

        let wrong = PermissionList {
            kind: Some("drive#fileList".to_string()),
            permissions: None,
        };
        assert!(!wrong.has_valid_kind());
    }

    #[test]
    fn test_permission_list_deserializes_camel_case() {
        let json = r#"{
            "kind": "drive#permissionList",
            "permissions": [
                {"id": "anyoneWithLink", "role": "reader"},
                {"id": "12345", "role": "owner", "emailAddress": "a@b.c", "displayName": "A"}
            ]
        }"#;

        let list: PermissionList = serde_json::from_str(json).unwrap();
        assert_eq!(list.entries().len(), 2);
        assert_eq!(list.entries()[0].id, "anyoneWithLink");
        assert_eq!(list.entries()[1].email_address.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_activity_event_creation_detection() {
        let json = r#"{"primaryActionDetail": {"create": {"new": {}}}, "timestamp": "2024-01-01T00:00:00Z"}"#;
        let event: ActivityEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_creation());

        let json = r#"{"primaryActionDetail": {"edit": {}}}"#;
        let event: ActivityEvent = serde_json::from_str(json).unwrap();
        assert!(!event.is_creation());

        assert!(!ActivityEvent::default().is_creation());
    }
}
