//! REST implementation of the storage gateway

use super::http::RestClient;
use super::StorageGateway;
use crate::error::Result;
use crate::types::{
    AccountInfo, ActivityEvent, ActivityQueryResponse, DriveFileList, FileInfo, FileRef,
    PermissionList, StartPageTokenResponse, WatchChannel,
};
use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, error, info, warn};

const LIST_FILES_PATH: &str = "/files";
const ABOUT_PATH: &str = "/about";
const START_PAGE_TOKEN_PATH: &str = "/changes/startPageToken";
const CHANGES_WATCH_PATH: &str = "/changes/watch";
const ACTIVITY_QUERY_PATH: &str = "/activity:query";
const ACTIVITY_PAGE_SIZE: u32 = 100;

const ALL_FIELDS: [(&str, &str); 1] = [("fields", "*")];

/// Gateway to the provider's file and activity REST APIs.
///
/// The two APIs live on distinct base URLs, so each gets its own
/// [`RestClient`].
pub struct DriveGateway {
    drive: RestClient,
    activity: ActivityClient,
}

impl DriveGateway {
    pub fn new(
        base_api_url: &str,
        base_activity_url: &str,
        api_key: &str,
        access_token: &str,
    ) -> Result<Self> {
        Ok(Self {
            drive: RestClient::new(base_api_url, api_key, access_token)?,
            activity: ActivityClient {
                rest: RestClient::new(base_activity_url, api_key, access_token)?,
            },
        })
    }
}

#[async_trait]
impl StorageGateway for DriveGateway {
    async fn list_files(&self) -> Result<Vec<FileRef>> {
        let listing: DriveFileList = self.drive.get_json(LIST_FILES_PATH, &ALL_FIELDS).await?;
        let files = listing.files.unwrap_or_default();
        for file in &files {
            debug!("Listed file {} ({})", file.name, file.id);
        }
        Ok(files)
    }

    async fn get_file_info(&self, file_id: &str) -> Result<FileInfo> {
        self.drive
            .get_json(&format!("/files/{}", file_id), &ALL_FIELDS)
            .await
    }

    async fn get_permissions(&self, file_id: &str) -> Result<PermissionList> {
        self.drive
            .get_json(&format!("/files/{}/permissions", file_id), &ALL_FIELDS)
            .await
    }

    async fn delete_permission(&self, file_id: &str, permission_id: &str) -> Result<bool> {
        let path = format!("/files/{}/permissions/{}", file_id, permission_id);
        match self.drive.send(Method::DELETE, &path, &[], None).await {
            Ok(_) => {
                debug!("Permission {} deleted for file {}", permission_id, file_id);
                Ok(true)
            }
            Err(e) => {
                error!(
                    "Failed to delete permission {} on file {}: {}",
                    permission_id, file_id, e
                );
                Ok(false)
            }
        }
    }

    async fn get_account_info(&self) -> Result<AccountInfo> {
        self.drive.get_json(ABOUT_PATH, &ALL_FIELDS).await
    }

    async fn list_activity_since(&self, since_ms: i64) -> Result<Vec<ActivityEvent>> {
        fetch_all_activities(&self.activity, since_ms).await
    }

    async fn get_start_page_token(&self) -> Result<String> {
        let response: StartPageTokenResponse = self
            .drive
            .get_json(START_PAGE_TOKEN_PATH, &ALL_FIELDS)
            .await?;
        Ok(response.start_page_token)
    }

    async fn register_change_watch(
        &self,
        channel: &WatchChannel,
        start_page_token: &str,
    ) -> Result<bool> {
        let body = serde_json::to_value(channel)?;
        let query = [("pageToken", start_page_token)];
        match self
            .drive
            .send(Method::POST, CHANGES_WATCH_PATH, &query, Some(&body))
            .await
        {
            Ok(_) => {
                info!("Change watch registered for channel {}", channel.id);
                Ok(true)
            }
            Err(e) => {
                error!("Failed to register change watch: {}", e);
                Ok(false)
            }
        }
    }
}

/// One page of creation activity. Seam for the pagination loop so tests can
/// drive it without a network.
#[async_trait]
trait ActivityPageSource: Send + Sync {
    async fn fetch_page(
        &self,
        since_ms: i64,
        page_token: Option<&str>,
    ) -> Result<ActivityQueryResponse>;
}

struct ActivityClient {
    rest: RestClient,
}

#[async_trait]
impl ActivityPageSource for ActivityClient {
    async fn fetch_page(
        &self,
        since_ms: i64,
        page_token: Option<&str>,
    ) -> Result<ActivityQueryResponse> {
        let mut body = serde_json::json!({
            "pageSize": ACTIVITY_PAGE_SIZE,
            "filter": format!("detail.action_detail_case:CREATE AND time >= {}", since_ms),
        });
        if let Some(token) = page_token {
            body["pageToken"] = serde_json::Value::String(token.to_string());
        }

        let response = self
            .rest
            .send(Method::POST, ACTIVITY_QUERY_PATH, &[], Some(&body))
            .await?;
        Ok(response.json().await?)
    }
}

/// Fetch every activity page since `since_ms`, concatenating events in page
/// order.
///
/// A failure on the very first fetch propagates; a failure mid-pagination
/// stops the loop and returns the events collected so far, so creation
/// events already fetched are not lost.
async fn fetch_all_activities(
    source: &dyn ActivityPageSource,
    since_ms: i64,
) -> Result<Vec<ActivityEvent>> {
    let mut events: Vec<ActivityEvent> = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = match source.fetch_page(since_ms, page_token.as_deref()).await {
            Ok(page) => page,
            Err(e) if events.is_empty() && page_token.is_none() => return Err(e),
            Err(e) => {
                warn!(
                    "Activity pagination failed mid-fetch, keeping {} collected events: {}",
                    events.len(),
                    e
                );
                break;
            }
        };

        events.extend(page.activities.unwrap_or_default());
        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, GatewayError};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct StubSource {
        pages: Mutex<VecDeque<Result<ActivityQueryResponse>>>,
        seen_tokens: Mutex<Vec<Option<String>>>,
    }

    impl StubSource {
        fn new(pages: Vec<Result<ActivityQueryResponse>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                seen_tokens: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ActivityPageSource for StubSource {
        async fn fetch_page(
            &self,
            _since_ms: i64,
            page_token: Option<&str>,
        ) -> Result<ActivityQueryResponse> {
            self.seen_tokens
                .lock()
                .unwrap()
                .push(page_token.map(str::to_string));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ActivityQueryResponse::default()))
        }
    }

    fn event(stamp: &str) -> ActivityEvent {
        ActivityEvent {
            primary_action_detail: None,
            timestamp: Some(stamp.to_string()),
        }
    }

    fn page(stamps: &[&str], token: Option<&str>) -> ActivityQueryResponse {
        ActivityQueryResponse {
            activities: Some(stamps.iter().map(|s| event(s)).collect()),
            next_page_token: token.map(str::to_string),
        }
    }

    fn upstream(status: u16) -> Error {
        Error::Gateway(GatewayError::Upstream { status })
    }

    #[tokio::test]
    async fn test_pagination_concatenates_in_page_order() {
        let source = StubSource::new(vec![
            Ok(page(&["a", "b"], Some("t1"))),
            Ok(page(&["c"], None)),
        ]);

        let events = fetch_all_activities(&source, 0).await.unwrap();
        let stamps: Vec<_> = events.iter().filter_map(|e| e.timestamp.as_deref()).collect();
        assert_eq!(stamps, vec!["a", "b", "c"]);

        let tokens = source.seen_tokens.lock().unwrap().clone();
        assert_eq!(tokens, vec![None, Some("t1".to_string())]);
    }

    #[tokio::test]
    async fn test_pagination_failure_mid_fetch_keeps_collected_events() {
        let source = StubSource::new(vec![
            Ok(page(&["a", "b"], Some("t1"))),
            Err(upstream(500)),
        ]);

        let events = fetch_all_activities(&source, 0).await.unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_pagination_failure_on_first_fetch_propagates() {
        let source = StubSource::new(vec![Err(upstream(403))]);

        let err = fetch_all_activities(&source, 0).await.unwrap_err();
        match err {
            Error::Gateway(GatewayError::Upstream { status }) => assert_eq!(status, 403),
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pagination_handles_missing_activities_field() {
        let source = StubSource::new(vec![Ok(ActivityQueryResponse {
            activities: None,
            next_page_token: None,
        })]);

        let events = fetch_all_activities(&source, 0).await.unwrap();
        assert!(events.is_empty());
    }
}
