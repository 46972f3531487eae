use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

// ── Sentinels ─────────────────────────────────────────────────────────────────

/// Placeholder for an absent field or an unresolved course attribute.
pub const MISSING: &str = "-";

/// Placeholder for an unresolved membership.
pub const NOT_AVAILABLE: &str = "N/A";

/// Course identifier used on the single row of a user without enrollments.
pub const NO_COURSE: &str = "Sin curso";

// ── API records ───────────────────────────────────────────────────────────────

/// Field deserializer that never rejects the enclosing record.
///
/// An explicit `null` or a value of the wrong JSON type yields `T::default()`.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// A user as returned by the users endpoint.
///
/// Every field is optional on the wire; a malformed record flows through the
/// pipeline with sentinel substitution instead of failing the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id", default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub email: String,
    #[serde(rename = "firstName", default, deserialize_with = "lenient")]
    pub first_name: String,
    #[serde(rename = "lastName", default, deserialize_with = "lenient")]
    pub last_name: String,
    /// Raw last-login timestamp, parsed later by the assembler.
    #[serde(rename = "lastLogin", default, deserialize_with = "lenient")]
    pub last_login: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub courses: Vec<CourseEnrollment>,
    #[serde(default, deserialize_with = "lenient")]
    pub subscriptions: Vec<Subscription>,
}

/// Foreign key into the course catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseEnrollment {
    #[serde(rename = "courseId", default, deserialize_with = "lenient")]
    pub course_id: String,
}

/// Foreign key into the membership catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "membershipId", default, deserialize_with = "lenient")]
    pub membership_id: Option<String>,
}

impl Subscription {
    /// The membership id, or [`NOT_AVAILABLE`] when the subscription has none.
    pub fn membership_id_or_sentinel(&self) -> &str {
        match self.membership_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => NOT_AVAILABLE,
        }
    }
}

/// A lesson progress record from the lessons feed.
///
/// The feed's internal `__v` versioning field is not mapped and therefore
/// dropped on deserialisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonRecord {
    #[serde(rename = "_id", default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(rename = "lessonID", default, deserialize_with = "lenient")]
    pub lesson_id: Option<String>,
    #[serde(rename = "userID", default, deserialize_with = "lenient")]
    pub user_id: Option<String>,
    #[serde(rename = "courseID", default, deserialize_with = "lenient")]
    pub course_id: Option<String>,
    #[serde(rename = "lessonName", default, deserialize_with = "lenient")]
    pub lesson_name: Option<String>,
    #[serde(rename = "isCompleted", default, deserialize_with = "lenient")]
    pub is_completed: Option<bool>,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient")]
    pub updated_at: Option<String>,
}

// ── Catalog entries ───────────────────────────────────────────────────────────

/// One row of the course catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEntry {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub course_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
}

/// One row of the membership catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEntry {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Reconciled rows ───────────────────────────────────────────────────────────

/// One user × one course, or the single "no course" row of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Resolved membership names, comma-joined. Never empty.
    pub membership_names: String,
    pub last_login: Option<String>,
    pub course_id: String,
    pub course_name: String,
    pub course_type: String,
    /// Total enrollments of the user (not unique courses).
    pub courses_count: usize,
    pub status: String,
    pub category: String,
    pub level: String,
    pub instructor: String,
    /// Raw membership ids, comma-joined.
    pub membership_ids: String,
}

/// A [`FlatRow`] with its last login split into local date and time columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRow {
    #[serde(rename = "ID")]
    pub user_id: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Membership Names")]
    pub membership_names: String,
    #[serde(rename = "Last Login Date")]
    pub last_login_date: String,
    #[serde(rename = "Last Login Hour")]
    pub last_login_hour: String,
    #[serde(rename = "ID Course")]
    pub course_id: String,
    #[serde(rename = "Course")]
    pub course_name: String,
    #[serde(rename = "Course Type")]
    pub course_type: String,
    #[serde(rename = "Courses Count")]
    pub courses_count: usize,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Level")]
    pub level: String,
    #[serde(rename = "Instructor")]
    pub instructor: String,
    #[serde(rename = "Membership IDs")]
    pub membership_ids: String,
}

/// A [`BaseRow`] left-joined with at most one lesson record.
///
/// Join keys, raw lesson timestamps and the membership ids are not part of
/// the exported schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRow {
    #[serde(rename = "ID")]
    pub user_id: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Membership Names")]
    pub membership_names: String,
    #[serde(rename = "Last Login Date")]
    pub last_login_date: String,
    #[serde(rename = "Last Login Hour")]
    pub last_login_hour: String,
    #[serde(rename = "ID Course")]
    pub course_id: String,
    #[serde(rename = "Course")]
    pub course_name: String,
    #[serde(rename = "Course Type")]
    pub course_type: String,
    #[serde(rename = "Courses Count")]
    pub courses_count: usize,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Level")]
    pub level: String,
    #[serde(rename = "Instructor")]
    pub instructor: String,
    #[serde(rename = "lessonID")]
    pub lesson_id: String,
    #[serde(rename = "lessonName")]
    pub lesson_name: String,
    #[serde(rename = "isCompleted")]
    pub is_completed: Option<bool>,
    #[serde(rename = "Fecha primer ingreso")]
    pub first_access_date: String,
    #[serde(rename = "Hora primer ingreso")]
    pub first_access_hour: String,
    #[serde(rename = "Fecha ultimo ingreso")]
    pub last_access_date: String,
    #[serde(rename = "Hora ultimo ingreso")]
    pub last_access_hour: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_deserialises_api_shape() {
        let json = r#"{
            "_id": "u1",
            "email": "a@x.com",
            "firstName": "A",
            "lastName": "B",
            "lastLogin": "2024-03-01T18:30:00.000Z",
            "courses": [{"courseId": "c1"}, {"courseId": "c2"}],
            "subscriptions": [{"membershipId": "m1"}, {}]
        }"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.first_name, "A");
        assert_eq!(user.courses.len(), 2);
        assert_eq!(user.courses[1].course_id, "c2");
        assert_eq!(user.subscriptions[0].membership_id_or_sentinel(), "m1");
        assert_eq!(user.subscriptions[1].membership_id_or_sentinel(), NOT_AVAILABLE);
    }

    #[test]
    fn test_user_record_tolerates_missing_fields() {
        let user: UserRecord = serde_json::from_str(r#"{"_id": "u9"}"#).unwrap();
        assert!(user.courses.is_empty());
        assert!(user.subscriptions.is_empty());
        assert!(user.last_login.is_none());
        assert_eq!(user.email, "");
    }

    #[test]
    fn test_user_record_tolerates_null_fields() {
        let json = r#"[
            {"_id": "u1", "email": "a@x.com", "firstName": "A", "lastName": "B",
             "courses": [{"courseId": "c1"}]},
            {"_id": "u2", "email": null, "firstName": "C", "lastName": null,
             "lastLogin": null, "courses": null, "subscriptions": null}
        ]"#;
        let users: Vec<UserRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].courses.len(), 1);
        assert_eq!(users[1].last_name, "");
        assert_eq!(users[1].email, "");
        assert!(users[1].courses.is_empty());
        assert!(users[1].subscriptions.is_empty());
    }

    #[test]
    fn test_lesson_record_tolerates_wrong_types() {
        let json = r#"[
            {"lessonID": "les1", "userID": 42, "courseID": null, "isCompleted": "yes"},
            {"lessonID": "les2", "userID": "u1", "courseID": "c1", "isCompleted": false}
        ]"#;
        let lessons: Vec<LessonRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(lessons.len(), 2);
        assert!(lessons[0].user_id.is_none());
        assert!(lessons[0].course_id.is_none());
        assert!(lessons[0].is_completed.is_none());
        assert_eq!(lessons[1].is_completed, Some(false));
    }

    #[test]
    fn test_lesson_record_ignores_version_field() {
        let json = r#"{
            "_id": "l-1", "lessonID": "les1", "userID": "u1", "courseID": "c1",
            "lessonName": "Intro", "isCompleted": true,
            "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-02T00:00:00Z",
            "__v": 3
        }"#;
        let lesson: LessonRecord = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.lesson_name.as_deref(), Some("Intro"));
        assert_eq!(lesson.is_completed, Some(true));
        let back = serde_json::to_value(&lesson).unwrap();
        assert!(back.get("__v").is_none());
    }
}
