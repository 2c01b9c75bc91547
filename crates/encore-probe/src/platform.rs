pub mod apple_music;

use std::process::Output;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ProbeError;

pub use apple_music::AppleMusicProbe;

/// Whether a player adapter exists for the current platform.
pub fn supported() -> bool {
    cfg!(target_os = "macos")
}

/// Run an external command to completion, killing it if it outlives `timeout`.
pub(crate) async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
) -> Result<Output, ProbeError> {
    cmd.kill_on_drop(true);
    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| ProbeError::Timeout(timeout))??;
    Ok(output)
}
