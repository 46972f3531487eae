use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::encoding::TextEncoding;
use crate::error::{ReportError, Result};
use crate::time_utils::{TimezoneHandler, DEFAULT_REPORT_TIMEZONE};

// ── Configuration schema ───────────────────────────────────────────────────────

/// Every configuration value the pipelines recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigKey {
    UsersApiUrl,
    LessonsApiUrl,
    CompletedApiUrl,
    CourseDataset,
    MembershipDataset,
    DataDir,
    InputDir,
    OutputDir,
    ReportPrefix,
    SummaryPrefix,
    CompletedPrefix,
    Encoding,
    ExportEncoding,
    FilterMembership,
    Timezone,
    HttpTimeoutSecs,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 16] = [
        ConfigKey::UsersApiUrl,
        ConfigKey::LessonsApiUrl,
        ConfigKey::CompletedApiUrl,
        ConfigKey::CourseDataset,
        ConfigKey::MembershipDataset,
        ConfigKey::DataDir,
        ConfigKey::InputDir,
        ConfigKey::OutputDir,
        ConfigKey::ReportPrefix,
        ConfigKey::SummaryPrefix,
        ConfigKey::CompletedPrefix,
        ConfigKey::Encoding,
        ConfigKey::ExportEncoding,
        ConfigKey::FilterMembership,
        ConfigKey::Timezone,
        ConfigKey::HttpTimeoutSecs,
    ];

    /// Environment variable consulted when no explicit override is given.
    pub fn env_name(self) -> &'static str {
        match self {
            ConfigKey::UsersApiUrl => "USERS_API_URL",
            ConfigKey::LessonsApiUrl => "LESSONS_API_URL",
            ConfigKey::CompletedApiUrl => "COMPLETED_API_URL",
            ConfigKey::CourseDataset => "COURSE_DATASET",
            ConfigKey::MembershipDataset => "MEMBERSHIP_DATASET",
            ConfigKey::DataDir => "DATA_DIR",
            ConfigKey::InputDir => "INPUT_DIR",
            ConfigKey::OutputDir => "OUTPUT_DIR",
            ConfigKey::ReportPrefix => "REPORT_PREFIX",
            ConfigKey::SummaryPrefix => "SUMMARY_PREFIX",
            ConfigKey::CompletedPrefix => "COMPLETED_PREFIX",
            ConfigKey::Encoding => "ENCODING",
            ConfigKey::ExportEncoding => "EXPORT_ENCODING",
            ConfigKey::FilterMembership => "FILTER_MEMBERSHIP",
            ConfigKey::Timezone => "REPORT_TIMEZONE",
            ConfigKey::HttpTimeoutSecs => "HTTP_TIMEOUT_SECS",
        }
    }

    /// Documented default. API URLs have none and must be supplied.
    pub fn default_value(self) -> Option<&'static str> {
        match self {
            ConfigKey::UsersApiUrl | ConfigKey::LessonsApiUrl | ConfigKey::CompletedApiUrl => None,
            ConfigKey::CourseDataset => Some("courses.csv"),
            ConfigKey::MembershipDataset => Some("memberships.csv"),
            ConfigKey::DataDir | ConfigKey::InputDir | ConfigKey::OutputDir => Some("data"),
            ConfigKey::ReportPrefix => Some("dataCourses"),
            ConfigKey::SummaryPrefix => Some("groupby_name"),
            ConfigKey::CompletedPrefix => Some("completedLessons"),
            ConfigKey::Encoding => Some("latin-1"),
            ConfigKey::ExportEncoding => Some("utf-8-sig"),
            ConfigKey::FilterMembership => Some("Dalia Pro Mensual"),
            ConfigKey::Timezone => Some(DEFAULT_REPORT_TIMEZONE),
            ConfigKey::HttpTimeoutSecs => Some("30"),
        }
    }
}

/// Resolve `key` from the process environment.
///
/// Returns the first non-empty value among `override_value`, the environment
/// variable and the documented default.
pub fn resolve_value(key: ConfigKey, override_value: Option<&str>) -> Option<String> {
    resolve_with(key, override_value, |name| std::env::var(name).ok())
}

/// Same as [`resolve_value`] with an injectable environment lookup.
pub fn resolve_with(
    key: ConfigKey,
    override_value: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let non_empty = |v: &str| !v.trim().is_empty();

    if let Some(v) = override_value.filter(|v| non_empty(v)) {
        return Some(v.to_string());
    }
    if let Some(v) = lookup(key.env_name()).filter(|v| non_empty(v)) {
        return Some(v);
    }
    key.default_value().map(str::to_string)
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Course progress reports from the users and lessons APIs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "course-report",
    about = "Course progress reports from the users and lessons APIs",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// The top-level flows.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reconcile users against the catalogs, join lessons and export
    Tracking {
        /// Export the reconciled table without joining the lessons feed
        #[arg(long)]
        no_lessons: bool,
    },
    /// Group the latest tracking export by learner for one membership
    Summary,
    /// Export the completed-lessons feed as-is
    Completed,
}

/// Explicit overrides; anything left unset falls back to the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Users endpoint
    #[arg(long, global = true)]
    pub users_api_url: Option<String>,
    /// Lessons endpoint
    #[arg(long, global = true)]
    pub lessons_api_url: Option<String>,
    /// Completed-lessons endpoint
    #[arg(long, global = true)]
    pub completed_api_url: Option<String>,
    /// Course catalog file name inside the data directory
    #[arg(long, global = true)]
    pub course_dataset: Option<String>,
    /// Membership catalog file name inside the data directory
    #[arg(long, global = true)]
    pub membership_dataset: Option<String>,
    /// Directory holding the catalogs
    #[arg(long, global = true)]
    pub data_dir: Option<String>,
    /// Directory searched for the latest tracking export
    #[arg(long, global = true)]
    pub input_dir: Option<String>,
    /// Directory reports are written to
    #[arg(long, global = true)]
    pub output_dir: Option<String>,
    /// File name prefix of tracking exports
    #[arg(long, global = true)]
    pub report_prefix: Option<String>,
    /// File name prefix of grouped summaries
    #[arg(long, global = true)]
    pub summary_prefix: Option<String>,
    /// File name prefix of completed-lessons exports
    #[arg(long, global = true)]
    pub completed_prefix: Option<String>,
    /// Encoding of catalogs and summary files
    #[arg(long, global = true)]
    pub encoding: Option<String>,
    /// Encoding of the tracking export
    #[arg(long, global = true)]
    pub export_encoding: Option<String>,
    /// Membership name kept by the summary
    #[arg(long, global = true)]
    pub filter_membership: Option<String>,
    /// Report timezone (IANA name or "auto")
    #[arg(long, global = true)]
    pub timezone: Option<String>,
    /// HTTP timeout in seconds
    #[arg(long, global = true)]
    pub http_timeout_secs: Option<String>,
}

impl ConfigOverrides {
    /// The explicit override for `key`, if one was given.
    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        let value = match key {
            ConfigKey::UsersApiUrl => &self.users_api_url,
            ConfigKey::LessonsApiUrl => &self.lessons_api_url,
            ConfigKey::CompletedApiUrl => &self.completed_api_url,
            ConfigKey::CourseDataset => &self.course_dataset,
            ConfigKey::MembershipDataset => &self.membership_dataset,
            ConfigKey::DataDir => &self.data_dir,
            ConfigKey::InputDir => &self.input_dir,
            ConfigKey::OutputDir => &self.output_dir,
            ConfigKey::ReportPrefix => &self.report_prefix,
            ConfigKey::SummaryPrefix => &self.summary_prefix,
            ConfigKey::CompletedPrefix => &self.completed_prefix,
            ConfigKey::Encoding => &self.encoding,
            ConfigKey::ExportEncoding => &self.export_encoding,
            ConfigKey::FilterMembership => &self.filter_membership,
            ConfigKey::Timezone => &self.timezone,
            ConfigKey::HttpTimeoutSecs => &self.http_timeout_secs,
        };
        value.as_deref()
    }
}

impl Settings {
    /// Effective log level after applying `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

// ── PipelineConfig ────────────────────────────────────────────────────────────

/// Fully resolved, typed configuration shared by every flow.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub users_api_url: Option<String>,
    pub lessons_api_url: Option<String>,
    pub completed_api_url: Option<String>,
    pub course_dataset_path: PathBuf,
    pub membership_dataset_path: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub report_prefix: String,
    pub summary_prefix: String,
    pub completed_prefix: String,
    pub encoding: TextEncoding,
    pub export_encoding: TextEncoding,
    pub filter_membership: String,
    pub timezone: String,
    pub http_timeout: Duration,
}

impl PipelineConfig {
    /// Resolve every key against `overrides` and the process environment.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |name| std::env::var(name).ok())
    }

    /// Resolve every key against `overrides` and an injectable lookup.
    pub fn resolve_with(
        overrides: &ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let get = |key: ConfigKey| resolve_with(key, overrides.get(key), &lookup);
        let get_or_default = |key: ConfigKey| get(key).unwrap_or_default();

        let data_dir = PathBuf::from(get_or_default(ConfigKey::DataDir));

        let timezone = get_or_default(ConfigKey::Timezone);
        if !TimezoneHandler::validate_timezone(&timezone) {
            return Err(ReportError::Config(format!(
                "{} is not a valid timezone: {}",
                ConfigKey::Timezone.env_name(),
                timezone
            )));
        }

        let timeout_raw = get_or_default(ConfigKey::HttpTimeoutSecs);
        let timeout_secs: u64 = timeout_raw.trim().parse().map_err(|_| {
            ReportError::Config(format!(
                "{} must be a whole number of seconds, got {:?}",
                ConfigKey::HttpTimeoutSecs.env_name(),
                timeout_raw
            ))
        })?;

        Ok(Self {
            users_api_url: get(ConfigKey::UsersApiUrl),
            lessons_api_url: get(ConfigKey::LessonsApiUrl),
            completed_api_url: get(ConfigKey::CompletedApiUrl),
            course_dataset_path: data_dir.join(get_or_default(ConfigKey::CourseDataset)),
            membership_dataset_path: data_dir.join(get_or_default(ConfigKey::MembershipDataset)),
            input_dir: PathBuf::from(get_or_default(ConfigKey::InputDir)),
            output_dir: PathBuf::from(get_or_default(ConfigKey::OutputDir)),
            report_prefix: get_or_default(ConfigKey::ReportPrefix),
            summary_prefix: get_or_default(ConfigKey::SummaryPrefix),
            completed_prefix: get_or_default(ConfigKey::CompletedPrefix),
            encoding: get_or_default(ConfigKey::Encoding).parse()?,
            export_encoding: get_or_default(ConfigKey::ExportEncoding).parse()?,
            filter_membership: get_or_default(ConfigKey::FilterMembership),
            timezone,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Return the URL for `key`, or a fatal [`ReportError::MissingConfig`].
    pub fn require_url(&self, key: ConfigKey) -> Result<&str> {
        let value = match key {
            ConfigKey::UsersApiUrl => &self.users_api_url,
            ConfigKey::LessonsApiUrl => &self.lessons_api_url,
            ConfigKey::CompletedApiUrl => &self.completed_api_url,
            other => {
                return Err(ReportError::Config(format!(
                    "{} is not a URL setting",
                    other.env_name()
                )))
            }
        };
        value
            .as_deref()
            .ok_or_else(|| ReportError::MissingConfig(key.env_name().to_string()))
    }

    /// Timezone handler for the configured report timezone.
    pub fn timezone_handler(&self) -> TimezoneHandler {
        TimezoneHandler::new(&self.timezone)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
