//! Webhook-driven push trigger

use crate::engine::RemediationEngine;
use crate::error::{Error, Result, TunnelError};
use crate::gateway::StorageGateway;
use crate::trigger::ChangeTrigger;
use crate::tunnel::NotificationTunnel;
use crate::types::{TunnelRecord, WatchChannel};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Resource the change watch subscribes to: the whole files collection, not
/// a single file.
const WATCHED_RESOURCE_URI: &str = "https://www.googleapis.com/drive/v3/files";

/// Registers a change watch delivering through the notification tunnel and
/// sweeps once per qualifying callback record.
pub struct PushTrigger {
    gateway: Arc<dyn StorageGateway>,
    engine: RemediationEngine,
    tunnel: Box<dyn NotificationTunnel>,
}

impl PushTrigger {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        engine: RemediationEngine,
        tunnel: Box<dyn NotificationTunnel>,
    ) -> Self {
        Self {
            gateway,
            engine,
            tunnel,
        }
    }

    /// Register the change watch for this session's callback address.
    ///
    /// Registration problems are logged, never fatal: the watch can be
    /// re-registered out of band while the record loop keeps listening.
    async fn register_watch(&self, address: &str) {
        let token = match self.gateway.get_start_page_token().await {
            Ok(token) => token,
            Err(e) => {
                error!(
                    "Failed to fetch start page token, change watch not registered: {}",
                    e
                );
                return;
            }
        };

        let channel = WatchChannel::new(address, "", WATCHED_RESOURCE_URI);
        match self.gateway.register_change_watch(&channel, &token).await {
            Ok(true) => info!("Change watch registration succeeded"),
            Ok(false) => error!("Failed to create a change watch"),
            Err(e) => error!("Failed to create a change watch: {}", e),
        }
    }

    /// Handle one raw tunnel line; returns whether it triggered a sweep
    async fn handle_record(&self, line: &str) -> bool {
        let record: TunnelRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                let err = TunnelError::MalformedNotification(format!("{}: {}", line, e));
                warn!("Skipping notification record: {}", err);
                return false;
            }
        };

        if !record.is_channel_notification() {
            debug!("Ignoring non-channel record ({} protocol)", record.protocol);
            return false;
        }

        self.engine.sweep().await;
        true
    }
}

#[async_trait]
impl ChangeTrigger for PushTrigger {
    fn name(&self) -> &'static str {
        "push"
    }

    async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let address = self.tunnel.start().await?;
        info!("Webhook url: {}", address);
        self.register_watch(&address).await;

        let result = loop {
            if *shutdown.borrow() {
                break Ok(());
            }

            let line = tokio::select! {
                line = self.tunnel.next_record() => line,
                _ = shutdown.changed() => {
                    info!("Push trigger interrupted");
                    break Ok(());
                }
            };

            match line {
                Some(line) => {
                    self.handle_record(&line).await;
                }
                None => {
                    warn!("Notification stream closed");
                    break Err(Error::Tunnel(TunnelError::Closed));
                }
            }
        };

        self.tunnel.stop().await?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockStorageGateway;
    use crate::types::CHANNEL_ID_HEADER;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct FakeTunnel {
        records: VecDeque<String>,
        block_when_empty: bool,
        stopped: Arc<AtomicBool>,
    }

    impl FakeTunnel {
        fn new(records: Vec<String>, block_when_empty: bool) -> (Self, Arc<AtomicBool>) {
            let stopped = Arc::new(AtomicBool::new(false));
            (
                Self {
                    records: records.into(),
                    block_when_empty,
                    stopped: stopped.clone(),
                },
                stopped,
            )
        }
    }

    #[async_trait]
    impl NotificationTunnel for FakeTunnel {
        async fn start(&mut self) -> Result<String> {
            Ok("abc1234.oast.fun".to_string())
        }

        async fn next_record(&mut self) -> Option<String> {
            match self.records.pop_front() {
                Some(line) => Some(line),
                None if self.block_when_empty => std::future::pending().await,
                None => None,
            }
        }

        async fn stop(&mut self) -> Result<()> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn qualifying_line() -> String {
        format!(
            r#"{{"protocol":"http","raw-response":"HTTP/1.1 200 OK\r\n{}: chan-1\r\n"}}"#,
            CHANNEL_ID_HEADER
        )
    }

    fn registering_gateway() -> MockStorageGateway {
        let mut gateway = MockStorageGateway::new();
        gateway
            .expect_get_start_page_token()
            .times(1)
            .returning(|| Ok("token-1".to_string()));
        gateway
            .expect_register_change_watch()
            .withf(|channel, token| {
                channel.resource_uri == WATCHED_RESOURCE_URI && token == "token-1"
            })
            .times(1)
            .returning(|_, _| Ok(true));
        gateway
    }

    fn build_trigger(
        gateway: MockStorageGateway,
        tunnel: FakeTunnel,
    ) -> PushTrigger {
        let gateway: Arc<dyn StorageGateway> = Arc::new(gateway);
        let engine = RemediationEngine::new(gateway.clone());
        PushTrigger::new(gateway, engine, Box::new(tunnel))
    }

    #[tokio::test]
    async fn test_qualifying_record_sweeps_once() {
        let mut gateway = registering_gateway();
        // One sweep = exactly one listing call.
        gateway.expect_list_files().times(1).returning(|| Ok(vec![]));

        let (tunnel, stopped) = FakeTunnel::new(vec![qualifying_line()], false);
        let mut trigger = build_trigger(gateway, tunnel);

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let result = trigger.run(shutdown_rx).await;

        // Stream ends after the one record, which is fatal for the trigger.
        assert!(matches!(result, Err(Error::Tunnel(TunnelError::Closed))));
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_non_qualifying_records_never_sweep() {
        let gateway = registering_gateway();
        // No list_files expectation: a sweep would panic the mock.

        let (tunnel, _stopped) = FakeTunnel::new(
            vec![
                "not json at all".to_string(),
                r#"{"protocol":"dns","raw-response":"x-goog-channel-id"}"#.to_string(),
                r#"{"protocol":"http","raw-response":"HTTP/1.1 200 OK"}"#.to_string(),
            ],
            false,
        );
        let mut trigger = build_trigger(gateway, tunnel);

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let result = trigger.run(shutdown_rx).await;
        assert!(matches!(result, Err(Error::Tunnel(TunnelError::Closed))));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_blocking_read_and_stops_tunnel() {
        let gateway = registering_gateway();

        let (tunnel, stopped) = FakeTunnel::new(vec![], true);
        let mut trigger = build_trigger(gateway, tunnel);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { trigger.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("trigger did not stop promptly")
            .unwrap();
        assert!(result.is_ok());
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_registration_failure_is_not_fatal() {
        let mut gateway = MockStorageGateway::new();
        gateway
            .expect_get_start_page_token()
            .times(1)
            .returning(|| Err(Error::Gateway(crate::error::GatewayError::Upstream {
                status: 500,
            })));
        // register_change_watch must not be attempted without a token.

        let (tunnel, _stopped) = FakeTunnel::new(vec![], false);
        let mut trigger = build_trigger(gateway, tunnel);

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let result = trigger.run(shutdown_rx).await;

        // Loop still ran; it ended only because the fake stream closed.
        assert!(matches!(result, Err(Error::Tunnel(TunnelError::Closed))));
    }

    #[tokio::test]
    async fn test_handle_record_decisions() {
        // handle_record never touches the registration endpoints.
        let mut gateway = MockStorageGateway::new();
        gateway.expect_list_files().times(1).returning(|| Ok(vec![]));

        let (tunnel, _stopped) = FakeTunnel::new(vec![], false);
        let trigger = build_trigger(gateway, tunnel);

        assert!(trigger.handle_record(&qualifying_line()).await);
        assert!(!trigger.handle_record("{broken").await);
        assert!(
            !trigger
                .handle_record(r#"{"protocol":"smtp","raw-response":""}"#)
                .await
        );
    }
}
