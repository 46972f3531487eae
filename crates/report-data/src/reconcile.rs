//! User → flat row reconciliation.
//!
//! Resolves each user's subscriptions and enrollments against the membership
//! and course catalogs and expands the user into one row per enrollment.
//! Lookup misses are never errors: they render as sentinels.

use report_core::models::{
    CourseEntry, FlatRow, UserRecord, MISSING, NOT_AVAILABLE, NO_COURSE,
};
use tracing::debug;

use crate::catalog::{CourseCatalog, MembershipCatalog};

/// Separator for multi-valued cells.
pub const LIST_SEPARATOR: &str = ", ";

/// Course attributes as rendered on a flat row.
struct CourseCells {
    id: String,
    name: String,
    course_type: String,
    status: String,
    category: String,
    level: String,
    instructor: String,
}

impl CourseCells {
    fn resolved(entry: &CourseEntry) -> Self {
        Self {
            id: cell(&entry.id),
            name: cell(&entry.name),
            course_type: cell(&entry.course_type),
            status: cell(&entry.status),
            category: cell(&entry.category),
            level: cell(&entry.level),
            instructor: cell(&entry.instructor),
        }
    }

    fn unresolved() -> Self {
        Self::placeholder(MISSING)
    }

    fn no_course() -> Self {
        Self::placeholder(NO_COURSE)
    }

    fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: MISSING.to_string(),
            course_type: MISSING.to_string(),
            status: MISSING.to_string(),
            category: MISSING.to_string(),
            level: MISSING.to_string(),
            instructor: MISSING.to_string(),
        }
    }
}

/// Joins users against both catalogs.
pub struct Reconciler<'a> {
    courses: &'a CourseCatalog,
    memberships: &'a MembershipCatalog,
}

impl<'a> Reconciler<'a> {
    pub fn new(courses: &'a CourseCatalog, memberships: &'a MembershipCatalog) -> Self {
        Self {
            courses,
            memberships,
        }
    }

    /// Expand one user into flat rows.
    ///
    /// A user without enrollments yields exactly one [`NO_COURSE`] row with a
    /// count of zero; otherwise one row per enrollment, each carrying the
    /// total enrollment count.
    pub fn flatten_user(&self, user: &UserRecord) -> Vec<FlatRow> {
        let membership_ids: Vec<&str> = user
            .subscriptions
            .iter()
            .map(|s| s.membership_id_or_sentinel())
            .collect();
        let membership_names: Vec<&str> = membership_ids
            .iter()
            .map(|id| self.membership_name(id))
            .collect();

        let names = join_or_sentinel(&membership_names);
        let ids = join_or_sentinel(&membership_ids);

        let row = |cells: CourseCells, courses_count: usize| FlatRow {
            user_id: text(&user.id),
            email: text(&user.email),
            first_name: text(&user.first_name),
            last_name: text(&user.last_name),
            membership_names: names.clone(),
            last_login: user.last_login.clone(),
            course_id: cells.id,
            course_name: cells.name,
            course_type: cells.course_type,
            courses_count,
            status: cells.status,
            category: cells.category,
            level: cells.level,
            instructor: cells.instructor,
            membership_ids: ids.clone(),
        };

        if user.courses.is_empty() {
            return vec![row(CourseCells::no_course(), 0)];
        }

        let count = user.courses.len();
        user.courses
            .iter()
            .map(|enrollment| {
                let cells = match self.courses.get(&enrollment.course_id) {
                    Some(entry) => CourseCells::resolved(entry),
                    None => {
                        debug!(
                            "user {}: course {} not in catalog",
                            user.id, enrollment.course_id
                        );
                        CourseCells::unresolved()
                    }
                };
                row(cells, count)
            })
            .collect()
    }

    /// Flatten every user, preserving user and enrollment order.
    pub fn flatten_all(&self, users: &[UserRecord]) -> Vec<FlatRow> {
        let rows: Vec<FlatRow> = users.iter().flat_map(|u| self.flatten_user(u)).collect();
        debug!("Flattened {} users into {} rows", users.len(), rows.len());
        rows
    }

    fn membership_name(&self, id: &str) -> &'a str {
        self.memberships
            .get(id)
            .and_then(|m| m.name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(NOT_AVAILABLE)
    }
}

fn cell(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

fn text(value: &str) -> String {
    if value.is_empty() {
        MISSING.to_string()
    } else {
        value.to_string()
    }
}

fn join_or_sentinel(values: &[&str]) -> String {
    if values.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        values.join(LIST_SEPARATOR)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
