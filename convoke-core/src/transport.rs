//! Mailer subprocess transport.
//!
//! This module handles communication with external mailer binaries
//! (e.g., `convoke-mailer-smtp`) using JSON over stdin/stdout.
//!
//! Mailers own delivery entirely: credentials, rate pacing, retries.
//! The pipeline hands over one fully-rendered message per recipient and
//! only cares whether delivery was accepted.

use crate::error::{InviteError, InviteResult};
use crate::protocol::{Command as MailerCommand, OutboundMessage, Request, Response};
use std::future::Future;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

const MAILER_TIMEOUT: Duration = Duration::from_secs(30);

/// A transport capable of delivering one rendered message.
///
/// The subprocess [`Mailer`] is the production implementation; tests use
/// in-memory fakes.
pub trait MailTransport {
    fn send(&self, message: &OutboundMessage) -> impl Future<Output = InviteResult<()>> + Send;
}

#[derive(Clone)]
pub struct Mailer(String);

impl Mailer {
    pub fn from_name(name: &str) -> Self {
        Mailer(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    fn binary_path(&self) -> InviteResult<std::path::PathBuf> {
        let binary_name = format!("convoke-mailer-{}", self.0);
        let binary_path = which::which(&binary_name).map_err(|_| {
            InviteError::MailerNotInstalled(format!(
                "Mailer '{}' not found. Install it with:\n  cargo install {}",
                self.0, binary_name
            ))
        })?;
        Ok(binary_path)
    }

    /// Deliver one message, bounded by the mailer timeout.
    pub async fn deliver(&self, message: &OutboundMessage) -> InviteResult<()> {
        timeout(MAILER_TIMEOUT, self.call(message))
            .await
            .map_err(|_| InviteError::MailerTimeout(MAILER_TIMEOUT.as_secs()))?
    }

    async fn call(&self, message: &OutboundMessage) -> InviteResult<()> {
        let request = Request {
            command: MailerCommand::Send,
            params: message.clone(),
        };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| InviteError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;

        let mut child = Command::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .spawn()
            .map_err(|e| {
                InviteError::Mailer(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        // Write request to stdin (unwrap safe: we piped stdin above)
        let mut stdin = child.stdin.take().unwrap();
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        // Wait for process and collect output
        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(InviteError::Mailer(format!(
                "Mailer exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.is_empty() {
            return Err(InviteError::Mailer("Mailer returned no response".into()));
        }

        let response: Response<serde_json::Value> = serde_json::from_str(&response_str)
            .map_err(|e| InviteError::Mailer(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { .. } => Ok(()),
            Response::Error { error } => Err(InviteError::Mailer(error)),
        }
    }
}

impl MailTransport for Mailer {
    async fn send(&self, message: &OutboundMessage) -> InviteResult<()> {
        self.deliver(message).await
    }
}
