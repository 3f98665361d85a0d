//! Tracing subscriber setup.

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::{LogFormat, LoggingSection};

pub const LOG_FILE: &str = "che-dash.log";

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(section: &LoggingSection, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        section.level.to_lowercase()
    }
}

/// Install the global subscriber.
///
/// With a log directory, events go to a daily rolling file and the returned
/// guard must stay alive until exit so buffered lines are flushed.
pub fn init_logging(
    section: &LoggingSection,
    log_dir: Option<&std::path::Path>,
    verbose: bool,
) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(section, verbose)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (writer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_dir.is_none())
        .with_target(false);

    let installed = match section.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        let section = LoggingSection {
            level: "INFO".to_string(),
            ..LoggingSection::default()
        };
        assert_eq!(default_directive(&section, false), "info");
        assert_eq!(default_directive(&section, true), "debug");
        assert_eq!(default_directive(&LoggingSection::default(), false), "warn");
    }
}
