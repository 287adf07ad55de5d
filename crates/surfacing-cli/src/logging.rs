use anyhow::{Context, Result};
use surfacing_infrastructure::SurfacingPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;

const CRATES: &[&str] = &[
    "surfacing",
    "surfacing_core",
    "surfacing_infrastructure",
    "surfacing_interaction",
    "surfacing_application",
];

fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    CRATES
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs a daily-rolling file logger under the logs directory. Stdout is
/// left to the terminal panel. Keep the guard alive until exit.
pub fn init(paths: &SurfacingPaths, verbose: bool) -> Result<WorkerGuard> {
    let log_dir = paths.logs_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("surfacing")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to open log file")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = if verbose {
        tracing_subscriber::EnvFilter::new(default_directives(true))
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_directives(false).into())
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .with(filter)
        .init();

    tracing::debug!(dir = %log_dir.display(), "Logging initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_every_crate() {
        let directives = default_directives(false);
        assert!(directives.contains("surfacing_application=info"));
        assert!(directives.starts_with("surfacing=info"));
        assert!(default_directives(true).contains("surfacing_interaction=debug"));
    }
}
