mod bootstrap;

use anyhow::Result;
use clap::Parser;
use report_core::settings::{Command, PipelineConfig, Settings};
use report_runtime::orchestrator::{Flow, ReportOrchestrator};

fn flow_for(command: &Command) -> Flow {
    match command {
        Command::Tracking { no_lessons } => Flow::Tracking {
            include_lessons: !no_lessons,
        },
        Command::Summary => Flow::Summary,
        Command::Completed => Flow::Completed,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env is fine; the process environment still applies.
    let dotenv = dotenvy::dotenv();

    let settings = Settings::parse();
    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("course-report v{} starting", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config = PipelineConfig::resolve(&settings.overrides)?;
    bootstrap::ensure_directories(&config)?;
    tracing::info!(
        "Timezone: {}, output: {}",
        config.timezone,
        config.output_dir.display()
    );

    let flow = flow_for(&settings.command);
    let orchestrator = ReportOrchestrator::new(config);

    match orchestrator.run(flow).await? {
        Some(outcome) => tracing::info!(
            "Report written to {} ({} rows)",
            outcome.path.display(),
            outcome.rows
        ),
        None => tracing::info!("No data to process."),
    }

    Ok(())
}
