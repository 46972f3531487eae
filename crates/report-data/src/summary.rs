//! Grouped summary of a previously exported tracking report.
//!
//! Keeps the rows of one membership, renames the columns to their display
//! labels and collapses them into one row per learner.
//!
//! Per-field policies inside a learner group:
//! - last login date: last value by original row order
//! - courses assigned: first value by original row order
//! - courses and lessons: unique values joined with `", "`, in first-seen
//!   order, then split and deduplicated once more on the same separator

use std::collections::BTreeMap;

use report_core::models::MISSING;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reconcile::LIST_SEPARATOR;

// ── Row types ─────────────────────────────────────────────────────────────────

/// The columns of a tracking export the summary needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportedRow {
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "First Name", default)]
    pub first_name: String,
    #[serde(rename = "Last Name", default)]
    pub last_name: String,
    #[serde(rename = "Membership Names", default)]
    pub membership_names: String,
    #[serde(rename = "Last Login Date", default)]
    pub last_login_date: String,
    #[serde(rename = "Course", default)]
    pub course: String,
    #[serde(rename = "Courses Count", default)]
    pub courses_count: String,
    /// Absent when the export was written without the lessons join.
    #[serde(rename = "lessonName", default)]
    pub lesson_name: Option<String>,
}

/// One exported row after projection and renaming to display labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerActivity {
    /// `email`
    pub email: String,
    /// `Nombre(s)`
    pub first_name: String,
    /// `Apellido(s)`
    pub last_name: String,
    /// `Fecha ultimo ingreso`
    pub last_login_date: String,
    /// `Curso`
    pub course: String,
    /// `Cursos asignados`
    pub courses_assigned: String,
    /// `Leccion`
    pub lesson: String,
}

impl From<ExportedRow> for LearnerActivity {
    fn from(row: ExportedRow) -> Self {
        Self {
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            last_login_date: row.last_login_date,
            course: row.course,
            courses_assigned: row.courses_count,
            lesson: row.lesson_name.unwrap_or_else(|| MISSING.to_string()),
        }
    }
}

/// One learner in the grouped summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "Nombre completo")]
    pub full_name: String,
    #[serde(rename = "email")]
    pub email: String,
    #[serde(rename = "Fecha ultimo ingreso")]
    pub last_login_date: String,
    #[serde(rename = "Cursos asignados")]
    pub courses_assigned: String,
    #[serde(rename = "Cursos")]
    pub courses: String,
    #[serde(rename = "Lecciones")]
    pub lessons: String,
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Values seen so far, deduplicated, in first-seen order.
#[derive(Debug, Default)]
struct UniqueValues(Vec<String>);

impl UniqueValues {
    fn push(&mut self, value: &str) {
        if !self.0.iter().any(|v| v == value) {
            self.0.push(value.to_string());
        }
    }

    fn joined(&self) -> String {
        self.0.join(LIST_SEPARATOR)
    }
}

#[derive(Debug)]
struct LearnerGroup {
    last_login_date: String,
    courses_assigned: String,
    courses: UniqueValues,
    lessons: UniqueValues,
}

impl LearnerGroup {
    fn start(first: &LearnerActivity) -> Self {
        Self {
            last_login_date: first.last_login_date.clone(),
            courses_assigned: first.courses_assigned.clone(),
            courses: UniqueValues::default(),
            lessons: UniqueValues::default(),
        }
    }

    fn add(&mut self, row: &LearnerActivity) {
        self.last_login_date.clone_from(&row.last_login_date);
        self.courses.push(&row.course);
        self.lessons.push(&row.lesson);
    }
}

/// Split a joined cell on the list separator and rejoin it without
/// duplicates, keeping first-seen order.
pub fn dedup_joined(joined: &str) -> String {
    let mut unique = UniqueValues::default();
    for part in joined.split(LIST_SEPARATOR) {
        unique.push(part);
    }
    unique.joined()
}

/// Keep only the rows whose membership string equals `membership` exactly,
/// projected to their display columns.
pub fn select_membership(rows: Vec<ExportedRow>, membership: &str) -> Vec<LearnerActivity> {
    rows.into_iter()
        .filter(|row| row.membership_names == membership)
        .map(LearnerActivity::from)
        .collect()
}

/// Collapse activity rows into one row per `(email, first name, last name)`,
/// ordered by that key.
pub fn group_by_learner(rows: &[LearnerActivity]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(&str, &str, &str), LearnerGroup> = BTreeMap::new();

    for row in rows {
        let key = (row.email.as_str(), row.first_name.as_str(), row.last_name.as_str());
        groups
            .entry(key)
            .or_insert_with(|| LearnerGroup::start(row))
            .add(row);
    }

    groups
        .into_iter()
        .map(|((email, first, last), group)| SummaryRow {
            full_name: format!("{first} {last}"),
            email: email.to_string(),
            last_login_date: group.last_login_date,
            courses_assigned: group.courses_assigned,
            courses: dedup_joined(&group.courses.joined()),
            lessons: dedup_joined(&group.lessons.joined()),
        })
        .collect()
}

/// Filter, project and group an exported report in one step.
pub fn summarize(rows: Vec<ExportedRow>, membership: &str) -> Vec<SummaryRow> {
    let total = rows.len();
    let selected = select_membership(rows, membership);
    let summary = group_by_learner(&selected);
    debug!(
        "Summary: {} rows, {} in \"{}\", {} learners",
        total,
        selected.len(),
        membership,
        summary.len()
    );
    summary
}

// ── Tests ─────────────────────────────────────────────────────────────────────
