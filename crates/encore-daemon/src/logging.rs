//! Subscriber setup: stderr always, plus an optional plain-text log file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use encore_core::config::GeneralConfig;
use encore_core::EncoreError;

const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Pick the verbosity: CLI flag, then `LOG_LEVEL`, then config.
pub fn resolve_level(cli: Option<&str>, env: Option<&str>, config: &str) -> String {
    [cli, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(config)
        .to_string()
}

/// A bare level applies to our own crates only; anything else is taken as a
/// full filter directive.
pub fn directive(level: &str) -> String {
    let lower = level.to_ascii_lowercase();
    if LEVELS.contains(&lower.as_str()) {
        format!("encore={lower}")
    } else {
        level.to_string()
    }
}

/// Install the global subscriber. Keep the returned guard alive for as long
/// as the file writer should flush.
pub fn init(level: &str, config: &GeneralConfig) -> Result<Option<WorkerGuard>, EncoreError> {
    let filter = EnvFilter::try_new(directive(level))
        .map_err(|e| EncoreError::Config(format!("invalid log level {level:?}: {e}")))?;

    let (file_layer, guard) = match config.log_file.as_deref() {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

fn file_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender, EncoreError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| EncoreError::Config(format!("log_file {} has no file name", path.display())))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    Ok(tracing_appender::rolling::never(dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_precedence() {
        assert_eq!(resolve_level(Some("debug"), Some("info"), "warn"), "debug");
        assert_eq!(resolve_level(None, Some("info"), "warn"), "info");
        assert_eq!(resolve_level(None, Some(""), "warn"), "warn");
        assert_eq!(resolve_level(None, None, "error"), "error");
    }

    #[test]
    fn test_bare_level_is_scoped() {
        assert_eq!(directive("DEBUG"), "encore=debug");
        assert_eq!(directive("off"), "encore=off");
        assert_eq!(
            directive("encore_core=trace,reqwest=info"),
            "encore_core=trace,reqwest=info"
        );
    }
}
