//! Tunnel subprocess client
//!
//! Spawns the external tunnel binary, parses the public callback URL out of
//! its startup banner and exposes the subsequent output as a record stream.
//! A reader task pumps stdout lines into a channel and stderr is drained so
//! the child can never block on a full pipe.

use crate::error::{Error, Result, TunnelError};
use crate::tunnel::NotificationTunnel;
use async_trait::async_trait;
use regex::Regex;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Banner lines the collaborator prints before anything useful
const BANNER_LINES: usize = 10;
/// Banner line carrying the public callback URL
const URL_LINE_NUMBER: usize = 11;
/// Host pattern the callback URL must match
const URL_PATTERN: &str = r"\w+\.\w{4}\.\w+";

/// Default argument set for an interactsh-style client binary
pub fn default_tunnel_args(poll_interval_secs: u64) -> Vec<String> {
    vec![
        "-duc".to_string(),
        "-pi".to_string(),
        poll_interval_secs.to_string(),
        "-http-only".to_string(),
        "-json".to_string(),
        "-v".to_string(),
    ]
}

/// Tunnel collaborator running as an owned subprocess
pub struct TunnelProcess {
    command: String,
    args: Vec<String>,
    child: Option<Child>,
    lines: Option<mpsc::Receiver<String>>,
    _stdout_task: Option<tokio::task::JoinHandle<()>>,
    _stderr_task: Option<tokio::task::JoinHandle<()>>,
}

impl TunnelProcess {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            child: None,
            lines: None,
            _stdout_task: None,
            _stderr_task: None,
        }
    }

    /// Skip the banner and pull the callback URL off its URL line
    async fn read_banner(&mut self, url_pattern: &Regex) -> Result<String> {
        let lines = self.lines.as_mut().ok_or_else(|| {
            Error::Internal("tunnel banner read before process start".to_string())
        })?;

        let mut count = 0usize;
        while let Some(line) = lines.recv().await {
            count += 1;
            if count <= BANNER_LINES {
                continue;
            }
            if count == URL_LINE_NUMBER {
                return match url_pattern.find(&line) {
                    Some(found) => {
                        debug!("Tunnel callback URL: {}", found.as_str());
                        Ok(found.as_str().to_string())
                    }
                    None => Err(Error::Tunnel(TunnelError::Setup(format!(
                        "no callback URL in banner line: {}",
                        line.trim()
                    )))),
                };
            }
        }

        Err(Error::Tunnel(TunnelError::Setup(
            "tunnel exited before printing its banner".to_string(),
        )))
    }

    /// Background task to pump stdout lines into the record channel
    async fn read_stdout_task(stdout: ChildStdout, tx: mpsc::Sender<String>) {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("Tunnel stdout closed");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && tx.send(trimmed.to_string()).await.is_err() {
                        warn!("Failed to forward tunnel line, channel closed");
                        break;
                    }
                }
                Err(e) => {
                    error!("Error reading tunnel stdout: {}", e);
                    break;
                }
            }
        }
    }

    /// Background task to drain stderr
    async fn read_stderr_task(stderr: ChildStderr) {
        let mut reader = BufReader::new(stderr);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("Tunnel stderr closed");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        warn!("Tunnel stderr: {}", trimmed);
                    }
                }
                Err(e) => {
                    error!("Error reading tunnel stderr: {}", e);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl NotificationTunnel for TunnelProcess {
    async fn start(&mut self) -> Result<String> {
        debug!("Spawning tunnel: {} {:?}", self.command, self.args);

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Tunnel(TunnelError::Setup(format!(
                    "failed to spawn {}: {}",
                    self.command, e
                )))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            Error::Tunnel(TunnelError::Setup("failed to capture tunnel stdout".to_string()))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            Error::Tunnel(TunnelError::Setup("failed to capture tunnel stderr".to_string()))
        })?;

        let (tx, rx) = mpsc::channel::<String>(100);
        self._stdout_task = Some(tokio::spawn(Self::read_stdout_task(stdout, tx)));
        self._stderr_task = Some(tokio::spawn(Self::read_stderr_task(stderr)));
        self.child = Some(child);
        self.lines = Some(rx);

        let url_pattern = Regex::new(URL_PATTERN)
            .map_err(|e| Error::Tunnel(TunnelError::Setup(format!("invalid URL pattern: {}", e))))?;
        self.read_banner(&url_pattern).await
    }

    async fn next_record(&mut self) -> Option<String> {
        match self.lines.as_mut() {
            Some(lines) => lines.recv().await,
            None => None,
        }
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            debug!("Terminating tunnel subprocess");
            if let Err(e) = child.kill().await {
                warn!("Failed to kill tunnel subprocess: {}", e);
            }
        }
        self.lines = None;
        Ok(())
    }
}
