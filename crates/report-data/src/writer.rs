//! Timestamped, write-once report files.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use report_core::encoding::TextEncoding;
use report_core::error::{ReportError, Result};
use report_core::models::{BaseRow, TrackingRow};
use report_core::time_utils::timestamped_file_name;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::summary::SummaryRow;

/// How many numeric suffixes to try before giving up on a free file name.
const MAX_NAME_ATTEMPTS: u32 = 100;

// ── Tabular ───────────────────────────────────────────────────────────────────

/// A row type with a fixed output column order.
pub trait Tabular: Serialize {
    const HEADERS: &'static [&'static str];
}

impl Tabular for BaseRow {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Email",
        "First Name",
        "Last Name",
        "Membership Names",
        "Last Login Date",
        "Last Login Hour",
        "ID Course",
        "Course",
        "Course Type",
        "Courses Count",
        "Status",
        "Category",
        "Level",
        "Instructor",
        "Membership IDs",
    ];
}

impl Tabular for TrackingRow {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Email",
        "First Name",
        "Last Name",
        "Membership Names",
        "Last Login Date",
        "Last Login Hour",
        "ID Course",
        "Course",
        "Course Type",
        "Courses Count",
        "Status",
        "Category",
        "Level",
        "Instructor",
        "lessonID",
        "lessonName",
        "isCompleted",
        "Fecha primer ingreso",
        "Hora primer ingreso",
        "Fecha ultimo ingreso",
        "Hora ultimo ingreso",
    ];
}

impl Tabular for SummaryRow {
    const HEADERS: &'static [&'static str] = &[
        "Nombre completo",
        "email",
        "Fecha ultimo ingreso",
        "Cursos asignados",
        "Cursos",
        "Lecciones",
    ];
}

// ── ReportWriter ──────────────────────────────────────────────────────────────

/// Writes reports named `<prefix>_<DD>_<MM>_<YY>_<HH>_<MM>.csv` into one
/// directory. Existing files are never overwritten.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    encoding: TextEncoding,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>, encoding: TextEncoding) -> Self {
        Self {
            dir: dir.into(),
            encoding,
        }
    }

    /// Serialize `rows` under their fixed headers. The header line is written
    /// even when `rows` is empty.
    pub fn write_rows<T: Tabular>(&self, prefix: &str, rows: &[T]) -> Result<PathBuf> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.write_record(T::HEADERS)?;
        for row in rows {
            wtr.serialize(row)?;
        }
        let path = self.persist(prefix, finish(wtr)?)?;
        info!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }

    /// Write an untyped table of pre-rendered cells.
    pub fn write_table(
        &self,
        prefix: &str,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> Result<PathBuf> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(Vec::new());
        wtr.write_record(headers)?;
        for row in rows {
            wtr.write_record(row)?;
        }
        let path = self.persist(prefix, finish(wtr)?)?;
        info!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }

    fn persist(&self, prefix: &str, utf8: Vec<u8>) -> Result<PathBuf> {
        let text = String::from_utf8_lossy(&utf8);
        let bytes = self.encoding.encode(&text);
        let file_name = timestamped_file_name(prefix, &Local::now());
        create_new_file(&self.dir, &file_name, &bytes)
    }
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))
}

/// Create `dir/file_name` with create-new semantics.
///
/// When the name is taken, `_2`, `_3`, … is inserted before the extension.
pub fn create_new_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (file_name, String::new()),
    };

    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let candidate = if attempt == 1 {
            dir.join(file_name)
        } else {
            dir.join(format!("{stem}_{attempt}{ext}"))
        };

        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => {
                fill_or_discard(&candidate, file, bytes)?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!("{} exists, trying next name", candidate.display());
            }
            Err(source) => {
                return Err(ReportError::FileWrite {
                    path: candidate,
                    source,
                })
            }
        }
    }

    Err(ReportError::FileWrite {
        path: dir.join(file_name),
        source: std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "no free file name left",
        ),
    })
}

/// Write `bytes` to the freshly created `path`, removing it again when the
/// write fails so no truncated report is left behind.
fn fill_or_discard(path: &Path, mut file: impl Write, bytes: &[u8]) -> Result<()> {
    if let Err(source) = file.write_all(bytes).and_then(|_| file.flush()) {
        drop(file);
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove partial file {}: {}", path.display(), e);
        }
        return Err(ReportError::FileWrite {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Accepts the first write, then fails like a full disk.
    struct FullDisk {
        accepted: bool,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.accepted {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"));
            }
            self.accepted = true;
            Ok(buf.len().min(4))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn base_row() -> BaseRow {
        BaseRow {
            user_id: "u1".to_string(),
            email: "a@x.com".to_string(),
            first_name: "Añil".to_string(),
            last_name: "B".to_string(),
            membership_names: "N/A".to_string(),
            last_login_date: "-".to_string(),
            last_login_hour: "-".to_string(),
            course_id: "Sin curso".to_string(),
            course_name: "-".to_string(),
            course_type: "-".to_string(),
            courses_count: 0,
            status: "-".to_string(),
            category: "-".to_string(),
            level: "-".to_string(),
            instructor: "-".to_string(),
            membership_ids: "N/A".to_string(),
        }
    }

    /// The serde field names must match the declared header order.
    fn serde_header<T: Serialize>(row: &T) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(row).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        out.lines().next().unwrap().to_string()
    }

    #[test]
    fn test_base_row_headers_match_serde() {
        assert_eq!(serde_header(&base_row()), BaseRow::HEADERS.join(","));
    }

    #[test]
    fn test_summary_row_headers_match_serde() {
        let row = SummaryRow {
            full_name: "A B".to_string(),
            email: "a@x.com".to_string(),
            last_login_date: "01/01/2024".to_string(),
            courses_assigned: "2".to_string(),
            courses: "X".to_string(),
            lessons: "Y".to_string(),
        };
        assert_eq!(serde_header(&row), SummaryRow::HEADERS.join(","));
    }

    #[test]
    fn test_write_rows_latin1() {
        let tmp = TempDir::new().unwrap();
        let writer = ReportWriter::new(tmp.path(), TextEncoding::Latin1);
        let path = writer.write_rows("dataCourses", &[base_row()]).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("dataCourses_") && name.ends_with(".csv"));

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.contains(&0xF1), "ñ encoded as a single Latin-1 byte");
        let text = TextEncoding::Latin1.decode(&bytes);
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), BaseRow::HEADERS.join(","));
        assert!(lines.next().unwrap().starts_with("u1,a@x.com,Añil,B,N/A,-,-,Sin curso"));
    }

    #[test]
    fn test_write_rows_empty_still_has_header() {
        let tmp = TempDir::new().unwrap();
        let writer = ReportWriter::new(tmp.path(), TextEncoding::Utf8);
        let path = writer.write_rows::<SummaryRow>("groupby_name", &[]).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.trim_end(), SummaryRow::HEADERS.join(","));
    }

    #[test]
    fn test_write_table_utf8_bom() {
        let tmp = TempDir::new().unwrap();
        let writer = ReportWriter::new(tmp.path(), TextEncoding::Utf8Bom);
        let path = writer
            .write_table(
                "completedLessons",
                &["a".to_string(), "b".to_string()],
                &[vec!["1".to_string(), "x, y".to_string()]],
            )
            .unwrap();
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"a,b\n1,\"x, y\"\n");
    }

    #[test]
    fn test_create_new_file_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let first = create_new_file(tmp.path(), "r_01.csv", b"one").unwrap();
        let second = create_new_file(tmp.path(), "r_01.csv", b"two").unwrap();
        let third = create_new_file(tmp.path(), "r_01.csv", b"three").unwrap();

        assert_eq!(first, tmp.path().join("r_01.csv"));
        assert_eq!(second, tmp.path().join("r_01_2.csv"));
        assert_eq!(third, tmp.path().join("r_01_3.csv"));
        assert_eq!(std::fs::read(first).unwrap(), b"one");
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dataCourses_01_03_24_12_30.csv");
        std::fs::write(&path, b"").unwrap();

        let err = fill_or_discard(&path, FullDisk { accepted: false }, b"ID,Email\nu1,a@x.com\n")
            .unwrap_err();

        assert!(matches!(err, ReportError::FileWrite { .. }));
        assert!(!path.exists(), "partial file must be removed");
        assert!(crate::reader::find_latest_csv(tmp.path(), "dataCourses").is_none());
    }
}
