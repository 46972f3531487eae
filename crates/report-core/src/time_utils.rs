use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

/// Timezone every report column is localised to unless configured otherwise.
pub const DEFAULT_REPORT_TIMEZONE: &str = "America/Mexico_City";

/// Date column format, e.g. `01/03/2024`.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Time column format, e.g. `12:30:00`.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Timestamp embedded in output file names, e.g. `01_03_24_12_30`.
pub const FILE_STAMP_FORMAT: &str = "%d_%m_%y_%H_%M";

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// A timestamp split into the two string columns the reports carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStamp {
    pub date: String,
    pub time: String,
}

/// Parses upstream timestamps and renders them in the report timezone.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    target_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler rendering into `tz_name`.
    ///
    /// `"auto"` resolves to the system timezone. An unrecognised name falls
    /// back to UTC and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let resolved = if tz_name.eq_ignore_ascii_case("auto") {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };
        let tz = resolved.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                resolved
            );
            Tz::UTC
        });
        Self { target_tz: tz }
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.eq_ignore_ascii_case("auto") || tz_name.parse::<Tz>().is_ok()
    }

    /// The timezone report columns are rendered in.
    pub fn target_tz(&self) -> Tz {
        self.target_tz
    }

    /// Parse an ISO 8601 / RFC 3339 timestamp into UTC.
    ///
    /// Timestamps without an offset are taken to be UTC, which is what the
    /// upstream API emits. Returns `None` for empty or unrecognised input.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in FMTS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }

        debug!("TimezoneHandler: could not parse timestamp \"{}\"", s);
        None
    }

    /// Convert a UTC instant to the report timezone.
    pub fn to_local(&self, dt: DateTime<Utc>) -> DateTime<Tz> {
        dt.with_timezone(&self.target_tz)
    }

    /// Parse `raw` and split it into local date and time strings.
    ///
    /// `None` input or an unparseable value yields `None`; callers decide
    /// which sentinel to render.
    pub fn split_local(&self, raw: Option<&str>) -> Option<LocalStamp> {
        let utc = self.parse_timestamp(raw?)?;
        let local = self.to_local(utc);
        Some(LocalStamp {
            date: local.format(DATE_FORMAT).to_string(),
            time: local.format(TIME_FORMAT).to_string(),
        })
    }

    /// Like [`split_local`](Self::split_local) but substitutes `sentinel` for
    /// both columns when the value cannot be parsed.
    pub fn split_local_or(&self, raw: Option<&str>, sentinel: &str) -> LocalStamp {
        self.split_local(raw).unwrap_or_else(|| LocalStamp {
            date: sentinel.to_string(),
            time: sentinel.to_string(),
        })
    }
}

impl Default for TimezoneHandler {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_TIMEZONE)
    }
}

// ── File naming ───────────────────────────────────────────────────────────────

/// Build `<prefix>_<DD>_<MM>_<YY>_<HH>_<MM>.csv` for the given instant.
pub fn timestamped_file_name<T>(prefix: &str, now: &DateTime<T>) -> String
where
    T: TimeZone,
    T::Offset: std::fmt::Display,
{
    format!("{}_{}.csv", prefix, now.format(FILE_STAMP_FORMAT))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
