//! Flat rows → fixed-schema base table.

use report_core::models::{BaseRow, FlatRow, MISSING};
use report_core::time_utils::TimezoneHandler;
use tracing::{debug, warn};

/// Split each row's last login into local date and hour columns.
///
/// Row count and order are preserved. An absent or unparseable last login
/// renders as [`MISSING`] in both columns.
pub fn assemble(rows: Vec<FlatRow>, tz: &TimezoneHandler) -> Vec<BaseRow> {
    let mut unparsed = 0usize;

    let table: Vec<BaseRow> = rows
        .into_iter()
        .map(|row| {
            let stamp = tz.split_local(row.last_login.as_deref());
            if stamp.is_none() {
                unparsed += 1;
            }
            let (last_login_date, last_login_hour) = match stamp {
                Some(s) => (s.date, s.time),
                None => (MISSING.to_string(), MISSING.to_string()),
            };

            BaseRow {
                user_id: row.user_id,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
                membership_names: row.membership_names,
                last_login_date,
                last_login_hour,
                course_id: row.course_id,
                course_name: row.course_name,
                course_type: row.course_type,
                courses_count: row.courses_count,
                status: row.status,
                category: row.category,
                level: row.level,
                instructor: row.instructor,
                membership_ids: row.membership_ids,
            }
        })
        .collect();

    if unparsed > 0 {
        warn!("{} rows without a usable last login", unparsed);
    }
    debug!("Assembled {} base rows", table.len());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(user: &str, last_login: Option<&str>) -> FlatRow {
        FlatRow {
            user_id: user.to_string(),
            email: format!("{user}@x.com"),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            membership_names: "N/A".to_string(),
            last_login: last_login.map(str::to_string),
            course_id: "c1".to_string(),
            course_name: "Acuarela".to_string(),
            course_type: "online".to_string(),
            courses_count: 1,
            status: "active".to_string(),
            category: "Art".to_string(),
            level: "-".to_string(),
            instructor: "Ana".to_string(),
            membership_ids: "N/A".to_string(),
        }
    }

    #[test]
    fn test_assemble_splits_last_login() {
        let tz = TimezoneHandler::default();
        let table = assemble(vec![flat("u1", Some("2024-03-01T18:30:00.000Z"))], &tz);
        assert_eq!(table[0].last_login_date, "01/03/2024");
        assert_eq!(table[0].last_login_hour, "12:30:00");
        assert_eq!(table[0].course_name, "Acuarela");
    }

    #[test]
    fn test_assemble_unparseable_is_missing() {
        let tz = TimezoneHandler::default();
        let table = assemble(vec![flat("u1", Some("N/A")), flat("u2", None)], &tz);
        for row in &table {
            assert_eq!(row.last_login_date, MISSING);
            assert_eq!(row.last_login_hour, MISSING);
        }
    }

    #[test]
    fn test_assemble_preserves_count_and_order() {
        let tz = TimezoneHandler::default();
        let rows: Vec<FlatRow> = (0..5).map(|i| flat(&format!("u{i}"), None)).collect();
        let table = assemble(rows, &tz);
        assert_eq!(table.len(), 5);
        let ids: Vec<&str> = table.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, ["u0", "u1", "u2", "u3", "u4"]);
    }
}
