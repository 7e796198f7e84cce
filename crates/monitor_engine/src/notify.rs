use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use monitor_core::{ChannelTarget, Delta, NotificationMessage};
use monitor_logging::{monitor_info, monitor_warn};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("could not start notifier: {0}")]
    Spawn(String),
    #[error("notifier exited with {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },
    #[error("notifier timed out after {0:?}")]
    Timeout(Duration),
}

/// Transport for one message to one target.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, target: &ChannelTarget, message: &str) -> Result<(), NotifyError>;
}

/// Runs an external program per delivery. Arguments are passed as-is, never
/// through a shell; `{channel}`, `{target}` and `{message}` are substituted.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandNotifier {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    fn expand_args(&self, target: &ChannelTarget, message: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{channel}", &target.channel)
                    .replace("{target}", &target.recipient)
                    .replace("{message}", message)
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn send(&self, target: &ChannelTarget, message: &str) -> Result<(), NotifyError> {
        let child = Command::new(&self.program)
            .args(self.expand_args(target, message))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| NotifyError::Spawn(format!("{}: {}", self.program, err)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| NotifyError::Timeout(self.timeout))?
            .map_err(|err| NotifyError::Spawn(err.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(NotifyError::ExitStatus {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub target: ChannelTarget,
    pub ok: bool,
    pub error: Option<String>,
}

/// Sends one summary message to every target. A failed target never stops the others.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn dispatch(&self, delta: &Delta, targets: &[ChannelTarget]) -> Vec<DeliveryReport> {
        let body = NotificationMessage::from_delta(delta).render();
        let sends = targets.iter().map(|target| {
            let body = body.as_str();
            async move {
                match self.notifier.send(target, body).await {
                    Ok(()) => {
                        monitor_info!("Notified {}", target);
                        DeliveryReport {
                            target: target.clone(),
                            ok: true,
                            error: None,
                        }
                    }
                    Err(err) => {
                        monitor_warn!("Notification to {} failed: {}", target, err);
                        DeliveryReport {
                            target: target.clone(),
                            ok: false,
                            error: Some(err.to_string()),
                        }
                    }
                }
            }
        });
        join_all(sends).await
    }
}
