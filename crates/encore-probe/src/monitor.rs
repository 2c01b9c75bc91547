//! Host process availability checks.

use std::future::Future;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::platform::run_with_timeout;

/// Reports whether the media player and the presence peer are running.
pub trait HostMonitor: Send + Sync {
    fn app_running(&self) -> impl Future<Output = bool> + Send;

    fn peer_running(&self) -> impl Future<Output = bool> + Send;
}

/// `pgrep -f` based monitor.
pub struct PgrepMonitor {
    app_pattern: String,
    peer_patterns: Vec<String>,
    timeout: Duration,
}

impl PgrepMonitor {
    pub fn new(app_pattern: String, peer_patterns: Vec<String>, timeout: Duration) -> Self {
        Self {
            app_pattern,
            peer_patterns,
            timeout,
        }
    }

    async fn is_running(&self, pattern: &str) -> bool {
        let mut cmd = Command::new("pgrep");
        cmd.arg("-f").arg(pattern);

        match run_with_timeout(cmd, self.timeout).await {
            Ok(output) => output.status.success() && !output.stdout.trim_ascii().is_empty(),
            Err(e) => {
                debug!(pattern, error = %e, "pgrep failed");
                false
            }
        }
    }
}

impl HostMonitor for PgrepMonitor {
    async fn app_running(&self) -> bool {
        self.is_running(&self.app_pattern).await
    }

    async fn peer_running(&self) -> bool {
        for pattern in &self.peer_patterns {
            if self.is_running(pattern).await {
                return true;
            }
        }
        false
    }
}
