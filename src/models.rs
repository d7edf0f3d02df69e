use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Unix seconds of the last access, `0` when the student never logged in.
    pub last_access: i64,
    pub suspended: bool,
    pub deleted: bool,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn last_access_at(&self) -> Option<DateTime<Utc>> {
        if self.last_access <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.last_access, 0)
    }
}

/// A completion percentage known to lie in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Percent(f64);

impl Percent {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || !(0.0..=100.0).contains(&value) {
            return Err(DashboardError::InvalidRecord(format!(
                "percentage out of range: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRecord {
    pub course_id: i64,
    pub course_name: String,
    pub completed: bool,
    /// `None` when the course does not track completion.
    pub progress: Option<Percent>,
}

impl CompletionRecord {
    /// Derives the record from activity completion counts. Courses with
    /// tracking disabled, or with nothing tracked, have no progress.
    pub fn derive(
        course_id: i64,
        course_name: impl Into<String>,
        tracking_enabled: bool,
        tracked: i64,
        completed: i64,
    ) -> Result<Self> {
        if tracked < 0 || completed < 0 || completed > tracked {
            return Err(DashboardError::InvalidRecord(format!(
                "course {course_id}: {completed} of {tracked} activities completed"
            )));
        }

        let progress = if tracking_enabled && tracked > 0 {
            Some(Percent::new(completed as f64 / tracked as f64 * 100.0)?)
        } else {
            None
        };

        Ok(Self {
            course_id,
            course_name: course_name.into(),
            completed: progress.is_some() && completed == tracked,
            progress,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskReason {
    NoActivity,
    NoCompletion,
}

impl RiskReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoActivity => "no_activity",
            Self::NoCompletion => "no_completion",
        }
    }
}

impl fmt::Display for RiskReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskEntry {
    pub student: Student,
    pub reasons: BTreeSet<RiskReason>,
}

impl RiskEntry {
    /// Returns `None` for an empty reason set; a flagged student always has a reason.
    pub fn new(student: Student, reasons: BTreeSet<RiskReason>) -> Option<Self> {
        if reasons.is_empty() {
            None
        } else {
            Some(Self { student, reasons })
        }
    }
}

/// One detail row of a meeting occurrence. Several rows may share a uuid.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MeetingSession {
    pub meeting_id: i64,
    pub uuid: String,
    pub end_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ParticipantRecord {
    pub session_uuid: String,
    pub user_id: Option<i64>,
    pub name: String,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RegisterSession {
    pub id: i64,
    pub session_date: i64,
    pub duration: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkStatus {
    Present,
    Late,
    Excused,
    Absent,
}

impl MarkStatus {
    pub fn counts_as_attended(&self) -> bool {
        matches!(self, Self::Present | Self::Late)
    }
}

impl FromStr for MarkStatus {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "present" => Ok(Self::Present),
            "late" => Ok(Self::Late),
            "excused" => Ok(Self::Excused),
            "absent" => Ok(Self::Absent),
            other => Err(DashboardError::InvalidRecord(format!(
                "unknown attendance mark: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMark {
    pub session_id: i64,
    pub student_id: i64,
    pub status: MarkStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    NoActivity,
    NoCompletion,
    LowGrade,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoActivity => "no_activity",
            Self::NoCompletion => "no_completion",
            Self::LowGrade => "low_grade",
        }
    }
}

impl From<RiskReason> for AlertType {
    fn from(reason: RiskReason) -> Self {
        match reason {
            RiskReason::NoActivity => Self::NoActivity,
            RiskReason::NoCompletion => Self::NoCompletion,
        }
    }
}

impl FromStr for AlertType {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "no_activity" => Ok(Self::NoActivity),
            "no_completion" => Ok(Self::NoCompletion),
            "low_grade" => Ok(Self::LowGrade),
            other => Err(DashboardError::InvalidRecord(format!(
                "unknown alert type: {other}"
            ))),
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
        }
    }
}

impl FromStr for AlertStatus {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "active" => Ok(Self::Active),
            "acknowledged" => Ok(Self::Acknowledged),
            "resolved" => Ok(Self::Resolved),
            other => Err(DashboardError::InvalidRecord(format!(
                "unknown alert status: {other}"
            ))),
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub student_email: String,
    pub course_id: Option<i64>,
    pub course_name: Option<String>,
    pub alert_type: AlertType,
    pub details: String,
    pub status: AlertStatus,
    pub acknowledged_by: Option<i64>,
    pub time_created: i64,
    pub time_modified: i64,
}

/// An alert about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub student_id: i64,
    pub alert_type: AlertType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlertFilter {
    pub alert_type: Option<AlertType>,
    pub status: Option<AlertStatus>,
    pub class_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertStats {
    pub active: i64,
    pub acknowledged: i64,
    pub resolved: i64,
    pub no_activity: i64,
    pub no_completion: i64,
    pub low_grade: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ClassSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub member_count: i64,
}

const MAX_CLASS_NAME_CHARS: usize = 255;

/// A class about to be created, with a trimmed non-empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClass {
    name: String,
    description: String,
}

impl NewClass {
    pub fn new(name: &str, description: Option<&str>) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DashboardError::InvalidRecord(
                "class name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_CLASS_NAME_CHARS {
            return Err(DashboardError::InvalidRecord(format!(
                "class name longer than {MAX_CLASS_NAME_CHARS} characters"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            description: description.map(str::trim).unwrap_or_default().to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseStanding {
    pub course_id: i64,
    pub course_name: String,
    pub progress: Option<Percent>,
    pub attendance: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentOverview {
    pub student: Student,
    pub courses: Vec<CourseStanding>,
    pub average_progress: u8,
    pub average_attendance: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rejects_out_of_range() {
        assert!(Percent::new(-0.5).is_err());
        assert!(Percent::new(100.1).is_err());
        assert!(Percent::new(f64::NAN).is_err());
        assert_eq!(Percent::new(100.0).map(|p| p.value()).ok(), Some(100.0));
    }

    #[test]
    fn completion_is_absent_when_tracking_disabled() {
        let record = CompletionRecord::derive(4, "Algebra", false, 10, 3).unwrap();
        assert_eq!(record.progress, None);
        assert!(!record.completed);
    }

    #[test]
    fn completion_is_absent_without_tracked_activities() {
        let record = CompletionRecord::derive(4, "Algebra", true, 0, 0).unwrap();
        assert_eq!(record.progress, None);
    }

    #[test]
    fn zero_percent_is_distinct_from_absent() {
        let record = CompletionRecord::derive(4, "Algebra", true, 5, 0).unwrap();
        assert_eq!(record.progress.map(|p| p.value()), Some(0.0));
    }

    #[test]
    fn completion_derives_percentage() {
        let record = CompletionRecord::derive(4, "Algebra", true, 4, 4).unwrap();
        assert_eq!(record.progress.map(|p| p.value()), Some(100.0));
        assert!(record.completed);

        let partial = CompletionRecord::derive(4, "Algebra", true, 8, 2).unwrap();
        assert_eq!(partial.progress.map(|p| p.value()), Some(25.0));
        assert!(!partial.completed);
    }

    #[test]
    fn completion_rejects_inconsistent_counts() {
        assert!(CompletionRecord::derive(4, "Algebra", true, 2, 3).is_err());
    }

    #[test]
    fn risk_entry_requires_a_reason() {
        let student = Student {
            id: 1,
            first_name: "Noa".to_string(),
            last_name: "Levi".to_string(),
            email: "noa@example.com".to_string(),
            last_access: 0,
            suspended: false,
            deleted: false,
        };
        assert!(RiskEntry::new(student.clone(), BTreeSet::new()).is_none());
        let entry = RiskEntry::new(student, BTreeSet::from([RiskReason::NoActivity]));
        assert!(entry.is_some());
    }

    #[test]
    fn enum_labels_round_trip_through_strings() {
        assert_eq!("no_completion".parse::<AlertType>().unwrap(), AlertType::NoCompletion);
        assert_eq!("resolved".parse::<AlertStatus>().unwrap(), AlertStatus::Resolved);
        assert!("pending".parse::<AlertStatus>().is_err());
        assert!("late".parse::<MarkStatus>().unwrap().counts_as_attended());
        assert!(!"excused".parse::<MarkStatus>().unwrap().counts_as_attended());
    }

    #[test]
    fn class_name_is_trimmed_and_required() {
        let class = NewClass::new("  Cohort B  ", Some(" evening track ")).unwrap();
        assert_eq!(class.name(), "Cohort B");
        assert_eq!(class.description(), "evening track");

        assert_eq!(NewClass::new("Cohort C", None).unwrap().description(), "");
        assert!(matches!(
            NewClass::new("   ", None),
            Err(DashboardError::InvalidRecord(_))
        ));
        assert!(NewClass::new(&"x".repeat(256), None).is_err());
        assert!(NewClass::new(&"x".repeat(255), None).is_ok());
    }

    #[test]
    fn never_logged_in_has_no_access_time() {
        let student = Student {
            id: 1,
            first_name: "Noa".to_string(),
            last_name: "Levi".to_string(),
            email: "noa@example.com".to_string(),
            last_access: 0,
            suspended: false,
            deleted: false,
        };
        assert_eq!(student.last_access_at(), None);
        assert_eq!(student.full_name(), "Noa Levi");
    }
}
