//! Left outer join of the base table against the lessons feed.

use std::collections::HashMap;

use report_core::models::{BaseRow, LessonRecord, TrackingRow, MISSING};
use report_core::time_utils::TimezoneHandler;
use tracing::debug;

// ── LessonAggregator ──────────────────────────────────────────────────────────

/// Stateless helper joining base rows with lesson progress.
pub struct LessonAggregator;

impl LessonAggregator {
    /// Left-join `base` on `(user id, course id)` against
    /// `(lesson.userID, lesson.courseID)`.
    ///
    /// Every base row survives. A row with no matching lesson carries
    /// [`MISSING`] lesson cells; a row with several matches is repeated once
    /// per lesson, in feed order.
    pub fn join(
        base: &[BaseRow],
        lessons: &[LessonRecord],
        tz: &TimezoneHandler,
    ) -> Vec<TrackingRow> {
        let mut by_key: HashMap<(&str, &str), Vec<&LessonRecord>> = HashMap::new();
        for lesson in lessons {
            if let (Some(user), Some(course)) = (lesson.user_id.as_deref(), lesson.course_id.as_deref())
            {
                by_key.entry((user, course)).or_default().push(lesson);
            }
        }

        let mut out = Vec::with_capacity(base.len());
        let mut matched = 0usize;

        for row in base {
            match by_key.get(&(row.user_id.as_str(), row.course_id.as_str())) {
                Some(hits) => {
                    matched += 1;
                    out.extend(hits.iter().map(|&lesson| Self::merge(row, Some(lesson), tz)));
                }
                None => out.push(Self::merge(row, None, tz)),
            }
        }

        debug!(
            "Joined {} base rows ({} with lessons) into {} rows",
            base.len(),
            matched,
            out.len()
        );
        out
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn merge(row: &BaseRow, lesson: Option<&LessonRecord>, tz: &TimezoneHandler) -> TrackingRow {
        let text = |value: Option<&String>| match value {
            Some(v) if !v.is_empty() => v.clone(),
            _ => MISSING.to_string(),
        };

        let first = tz.split_local_or(lesson.and_then(|l| l.created_at.as_deref()), MISSING);
        let last = tz.split_local_or(lesson.and_then(|l| l.updated_at.as_deref()), MISSING);

        TrackingRow {
            user_id: row.user_id.clone(),
            email: row.email.clone(),
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            membership_names: row.membership_names.clone(),
            last_login_date: row.last_login_date.clone(),
            last_login_hour: row.last_login_hour.clone(),
            course_id: row.course_id.clone(),
            course_name: row.course_name.clone(),
            course_type: row.course_type.clone(),
            courses_count: row.courses_count,
            status: row.status.clone(),
            category: row.category.clone(),
            level: row.level.clone(),
            instructor: row.instructor.clone(),
            lesson_id: text(lesson.and_then(|l| l.lesson_id.as_ref())),
            lesson_name: text(lesson.and_then(|l| l.lesson_name.as_ref())),
            is_completed: lesson.and_then(|l| l.is_completed),
            first_access_date: first.date,
            first_access_hour: first.time,
            last_access_date: last.date,
            last_access_hour: last.time,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
