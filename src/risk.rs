use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::config::{RequestContext, Thresholds};
use crate::models::{CompletionRecord, RiskEntry, RiskReason, Student};

pub fn is_stale(student: &Student, thresholds: &Thresholds, now: i64) -> bool {
    student.last_access <= 0 || now - student.last_access > thresholds.inactivity_seconds()
}

/// True as soon as one tracked course sits strictly below the threshold.
pub fn has_low_completion(records: &[CompletionRecord], thresholds: &Thresholds) -> bool {
    let threshold = f64::from(thresholds.completion_pct());
    records
        .iter()
        .any(|record| record.progress.is_some_and(|p| p.value() < threshold))
}

pub fn assess_student(
    student: Student,
    completions: &[CompletionRecord],
    thresholds: &Thresholds,
    now: i64,
) -> Option<RiskEntry> {
    let mut reasons = BTreeSet::new();

    if is_stale(&student, thresholds, now) {
        reasons.insert(RiskReason::NoActivity);
    }
    if has_low_completion(completions, thresholds) {
        reasons.insert(RiskReason::NoCompletion);
    }

    RiskEntry::new(student, reasons)
}

/// Flags students by inactivity and low completion. Entries come back
/// ordered by student id and only for students with at least one reason.
pub fn compute_at_risk(
    students: Vec<Student>,
    completions: &HashMap<i64, Vec<CompletionRecord>>,
    thresholds: &Thresholds,
    ctx: &RequestContext,
) -> Vec<RiskEntry> {
    let now = ctx.timestamp();
    let mut entries: Vec<RiskEntry> = students
        .into_iter()
        .filter_map(|student| {
            let records = completions
                .get(&student.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            assess_student(student, records, thresholds, now)
        })
        .collect();

    entries.sort_by_key(|entry| entry.student.id);
    entries
}

/// Students whose last access is before this instant count as inactive.
pub fn inactivity_cutoff(thresholds: &Thresholds, ctx: &RequestContext) -> DateTime<Utc> {
    ctx.now - chrono::Duration::days(i64::from(thresholds.inactivity_days()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn student(id: i64, days_ago: Option<i64>, now: DateTime<Utc>) -> Student {
        Student {
            id,
            first_name: "Avery".to_string(),
            last_name: "Lee".to_string(),
            email: format!("avery{id}@example.com"),
            last_access: days_ago
                .map(|days| (now - Duration::days(days)).timestamp())
                .unwrap_or(0),
            suspended: false,
            deleted: false,
        }
    }

    fn record(course_id: i64, tracked: i64, completed: i64) -> CompletionRecord {
        CompletionRecord::derive(course_id, format!("Course {course_id}"), true, tracked, completed)
            .unwrap()
    }

    #[test]
    fn flags_both_reasons_for_inactive_low_completion_student() {
        let ctx = RequestContext::new(None);
        let students = vec![student(1, Some(10), ctx.now)];
        let completions = HashMap::from([(1, vec![record(7, 10, 4)])]);

        let entries = compute_at_risk(students, &completions, &Thresholds::default(), &ctx);

        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].reasons,
            BTreeSet::from([RiskReason::NoActivity, RiskReason::NoCompletion])
        );
    }

    #[test]
    fn never_logged_in_is_always_stale() {
        let ctx = RequestContext::new(None);
        let never = student(1, None, ctx.now);
        assert!(is_stale(&never, &Thresholds::new(3650, 50).unwrap(), ctx.timestamp()));
    }

    #[test]
    fn recent_activity_is_not_stale() {
        let ctx = RequestContext::new(None);
        let active = student(1, Some(2), ctx.now);
        assert!(!is_stale(&active, &Thresholds::default(), ctx.timestamp()));
    }

    #[test]
    fn inactive_exactly_at_threshold_is_not_stale() {
        let thresholds = Thresholds::default();
        let now = 1_760_000_000;
        let mut edge = student(1, Some(1), Utc::now());
        edge.last_access = now - thresholds.inactivity_seconds();

        assert!(!is_stale(&edge, &thresholds, now));
    }

    #[test]
    fn one_second_past_threshold_is_stale() {
        let thresholds = Thresholds::default();
        let now = 1_760_000_000;
        let mut past = student(1, Some(1), Utc::now());
        past.last_access = now - thresholds.inactivity_seconds() - 1;

        assert!(is_stale(&past, &thresholds, now));
    }

    #[test]
    fn completion_at_threshold_is_not_low() {
        let records = vec![record(1, 2, 1), record(2, 4, 4)];
        assert!(!has_low_completion(&records, &Thresholds::default()));
    }

    #[test]
    fn any_single_low_course_triggers() {
        let records = vec![record(1, 4, 4), record(2, 10, 1), record(3, 2, 2)];
        assert!(has_low_completion(&records, &Thresholds::default()));
    }

    #[test]
    fn untracked_courses_never_trigger() {
        let untracked = CompletionRecord::derive(3, "Drama", false, 6, 0).unwrap();
        assert!(!has_low_completion(&[untracked], &Thresholds::default()));
        assert!(!has_low_completion(&[], &Thresholds::default()));
    }

    #[test]
    fn omits_students_without_reasons() {
        let ctx = RequestContext::new(None);
        let students = vec![
            student(3, Some(1), ctx.now),
            student(2, Some(30), ctx.now),
            student(1, Some(1), ctx.now),
        ];
        let completions = HashMap::from([
            (1, vec![record(9, 10, 2)]),
            (3, vec![record(9, 10, 9)]),
        ]);

        let entries = compute_at_risk(students, &completions, &Thresholds::default(), &ctx);
        let ids: Vec<i64> = entries.iter().map(|e| e.student.id).collect();

        assert_eq!(ids, vec![1, 2]);
        assert_eq!(entries[0].reasons, BTreeSet::from([RiskReason::NoCompletion]));
        assert_eq!(entries[1].reasons, BTreeSet::from([RiskReason::NoActivity]));
    }

    #[test]
    fn cutoff_respects_inactivity_days() {
        let ctx = RequestContext::new(None);
        let cutoff = inactivity_cutoff(&Thresholds::new(14, 50).unwrap(), &ctx);
        assert_eq!(cutoff, ctx.now - Duration::days(14));
    }
}
