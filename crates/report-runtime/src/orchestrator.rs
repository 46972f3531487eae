//! Run-to-completion report flows.
//!
//! Each flow consumes the full output of one stage before starting the next
//! and writes at most one file. A flow with nothing to process returns
//! `Ok(None)` after logging; configuration and I/O failures abort it before
//! anything is written.

use std::path::PathBuf;

use report_core::error::Result;
use report_core::settings::{ConfigKey, PipelineConfig};
use report_data::aggregator::LessonAggregator;
use report_data::assembler::assemble;
use report_data::client::ApiClient;
use report_data::completed::flatten_records;
use report_data::reader::{find_latest_csv, load_catalogs, parse_delimited, read_text};
use report_data::reconcile::Reconciler;
use report_data::summary::{summarize, ExportedRow};
use report_data::writer::ReportWriter;
use tracing::{info, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// What a flow wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub path: PathBuf,
    pub rows: usize,
}

/// The flows the binary can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Users × catalogs, optionally joined with lessons.
    Tracking { include_lessons: bool },
    /// Grouped summary of the latest tracking export.
    Summary,
    /// Pass-through export of the completed-lessons feed.
    Completed,
}

// ── ReportOrchestrator ────────────────────────────────────────────────────────

/// Runs one flow against a resolved configuration.
pub struct ReportOrchestrator {
    config: PipelineConfig,
}

impl ReportOrchestrator {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, flow: Flow) -> Result<Option<RunOutcome>> {
        match flow {
            Flow::Tracking { include_lessons } => self.run_tracking(include_lessons).await,
            Flow::Summary => self.run_summary(),
            Flow::Completed => self.run_completed().await,
        }
    }

    /// Fetch users, reconcile them against the catalogs, optionally join the
    /// lessons feed and export the result.
    pub async fn run_tracking(&self, include_lessons: bool) -> Result<Option<RunOutcome>> {
        let cfg = &self.config;

        let users_url = cfg.require_url(ConfigKey::UsersApiUrl)?;
        let lessons_url = if include_lessons {
            Some(cfg.require_url(ConfigKey::LessonsApiUrl)?)
        } else {
            None
        };

        let client = ApiClient::new(cfg.http_timeout)?;

        info!("Fetching users from {}", users_url);
        let users = client.fetch_users(users_url).await?;
        if users.is_empty() {
            info!("Users endpoint returned no data; nothing to export");
            return Ok(None);
        }

        let (courses, memberships) = load_catalogs(
            &cfg.course_dataset_path,
            &cfg.membership_dataset_path,
            cfg.encoding,
        )?;
        info!(
            "Loaded {} courses and {} memberships",
            courses.len(),
            memberships.len()
        );

        let tz = cfg.timezone_handler();
        let flat = Reconciler::new(&courses, &memberships).flatten_all(&users);
        let base = assemble(flat, &tz);

        let writer = ReportWriter::new(&cfg.output_dir, cfg.export_encoding);

        let Some(lessons_url) = lessons_url else {
            let path = writer.write_rows(&cfg.report_prefix, &base)?;
            return Ok(Some(RunOutcome {
                path,
                rows: base.len(),
            }));
        };

        info!("Fetching lessons from {}", lessons_url);
        let lessons = client.fetch_lessons(lessons_url).await?;
        if lessons.is_empty() {
            warn!("Lessons endpoint returned no data; exporting without lesson progress");
        }

        let tracking = LessonAggregator::join(&base, &lessons, &tz);
        let path = writer.write_rows(&cfg.report_prefix, &tracking)?;
        Ok(Some(RunOutcome {
            path,
            rows: tracking.len(),
        }))
    }

    /// Group the latest tracking export by learner for the configured
    /// membership. The input file is only read.
    pub fn run_summary(&self) -> Result<Option<RunOutcome>> {
        let cfg = &self.config;

        let Some(input) = find_latest_csv(&cfg.input_dir, &cfg.report_prefix) else {
            info!(
                "No {}_*.csv file found in {}; nothing to summarise",
                cfg.report_prefix,
                cfg.input_dir.display()
            );
            return Ok(None);
        };

        info!("Summarising {}", input.display());
        let text = read_text(&input, cfg.encoding)?;
        let rows: Vec<ExportedRow> = parse_delimited(&text)?;
        let summary = summarize(rows, &cfg.filter_membership);

        let writer = ReportWriter::new(&cfg.output_dir, cfg.encoding);
        let path = writer.write_rows(&cfg.summary_prefix, &summary)?;
        Ok(Some(RunOutcome {
            path,
            rows: summary.len(),
        }))
    }

    /// Export the completed-lessons feed as a flat table.
    pub async fn run_completed(&self) -> Result<Option<RunOutcome>> {
        let cfg = &self.config;
        let url = cfg.require_url(ConfigKey::CompletedApiUrl)?;

        let client = ApiClient::new(cfg.http_timeout)?;
        info!("Fetching completed lessons from {}", url);
        let records = client.fetch_completed(url).await?;
        if records.is_empty() {
            info!("Completed endpoint returned no data; nothing to export");
            return Ok(None);
        }

        let table = flatten_records(&records);
        let writer = ReportWriter::new(&cfg.output_dir, cfg.encoding);
        let path = writer.write_table(&cfg.completed_prefix, &table.headers, &table.rows)?;
        Ok(Some(RunOutcome {
            path,
            rows: table.rows.len(),
        }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
