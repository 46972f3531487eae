use report_core::settings::PipelineConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the output directory exists (including any missing parents).
///
/// The data and input directories are only read, so a missing one surfaces
/// later as a read error or an empty search.
pub fn ensure_directories(config: &PipelineConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.output_dir)?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI log level name to an [`EnvFilter`] directive.
///
/// Unknown names are passed through so that raw directives such as
/// `report_data=trace` keep working.
pub fn filter_directive(log_level: &str) -> String {
    let upper = log_level.to_uppercase();
    match upper.as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber. Output goes to stderr.
///
/// `RUST_LOG` wins over `log_level` when set.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(log_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::settings::ConfigOverrides;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directories_creates_nested_output() {
        let tmp = TempDir::new().expect("tempdir");
        let out = tmp.path().join("reports").join("2024");
        let overrides = ConfigOverrides {
            output_dir: Some(out.to_string_lossy().to_string()),
            ..Default::default()
        };
        let config = PipelineConfig::resolve_with(&overrides, |_| None).expect("config");

        ensure_directories(&config).expect("ensure_directories should succeed");
        assert!(out.is_dir(), "output dir must exist");

        // Second call is a no-op.
        ensure_directories(&config).expect("idempotent");
    }

    #[test]
    fn test_filter_directive_levels() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("info"), "info");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("CRITICAL"), "error");
        assert_eq!(filter_directive("report_data=trace"), "report_data=trace");
    }
}
