use std::collections::HashMap;
use std::fmt::Write;

use crate::config::{RequestContext, Thresholds};
use crate::models::{RiskEntry, RiskReason};
use crate::risk;

pub const REPORT_STUDENT_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasonSummary {
    pub reason: RiskReason,
    pub count: usize,
}

pub fn summarize_by_reason(entries: &[RiskEntry]) -> Vec<ReasonSummary> {
    let mut map: HashMap<RiskReason, usize> = HashMap::new();

    for entry in entries {
        for reason in &entry.reasons {
            *map.entry(*reason).or_insert(0) += 1;
        }
    }

    let mut summaries: Vec<ReasonSummary> = map
        .into_iter()
        .map(|(reason, count)| ReasonSummary { reason, count })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then(a.reason.cmp(&b.reason)));
    summaries
}

pub fn build_report(
    scope: Option<&str>,
    thresholds: &Thresholds,
    ctx: &RequestContext,
    entries: &[RiskEntry],
    attendance: &HashMap<i64, Option<u8>>,
) -> String {
    let summaries = summarize_by_reason(entries);
    let cutoff = risk::inactivity_cutoff(thresholds, ctx);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all students");

    let _ = writeln!(output, "# At-Risk Students Report");
    let _ = writeln!(
        output,
        "Generated for {} on {} (inactive since {}, completion below {}%)",
        scope_label,
        ctx.now.format("%Y-%m-%d"),
        cutoff.format("%Y-%m-%d"),
        thresholds.completion_pct()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Reason Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No students flagged.");
    } else {
        for summary in &summaries {
            let _ = writeln!(output, "- {}: {} students", summary.reason, summary.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Flagged Students");

    if entries.is_empty() {
        let _ = writeln!(output, "No students flagged.");
    } else {
        for entry in entries.iter().take(REPORT_STUDENT_LIMIT) {
            let student = &entry.student;
            let last_access = student
                .last_access_at()
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "never".to_string());
            let reasons: Vec<&str> = entry.reasons.iter().map(RiskReason::as_str).collect();
            let attendance = match attendance.get(&student.id).copied().flatten() {
                Some(pct) => format!("{pct}%"),
                None => "n/a".to_string(),
            };

            let _ = writeln!(
                output,
                "- {} ({}) last access {}, attendance {}: {}",
                student.full_name(),
                student.email,
                last_access,
                attendance,
                reasons.join(", ")
            );
        }
        if entries.len() > REPORT_STUDENT_LIMIT {
            let _ = writeln!(
                output,
                "- ... and {} more",
                entries.len() - REPORT_STUDENT_LIMIT
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Student;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn entry(id: i64, reasons: &[RiskReason]) -> RiskEntry {
        let student = Student {
            id,
            first_name: "Tal".to_string(),
            last_name: format!("Student{id}"),
            email: format!("tal{id}@example.edu"),
            last_access: 0,
            suspended: false,
            deleted: false,
        };
        RiskEntry::new(student, reasons.iter().copied().collect::<BTreeSet<_>>()).unwrap()
    }

    #[test]
    fn reason_mix_is_sorted_by_count() {
        let entries = vec![
            entry(1, &[RiskReason::NoCompletion]),
            entry(2, &[RiskReason::NoActivity, RiskReason::NoCompletion]),
        ];
        let summaries = summarize_by_reason(&entries);
        assert_eq!(
            summaries,
            vec![
                ReasonSummary { reason: RiskReason::NoCompletion, count: 2 },
                ReasonSummary { reason: RiskReason::NoActivity, count: 1 },
            ]
        );
    }

    #[test]
    fn report_lists_students_with_attendance() {
        let ctx = RequestContext::at(Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap());
        let entries = vec![entry(1, &[RiskReason::NoActivity, RiskReason::NoCompletion])];
        let attendance = HashMap::from([(1, Some(67))]);

        let report = build_report(Some("Class 7B"), &Thresholds::default(), &ctx, &entries, &attendance);

        assert!(report.contains("Generated for Class 7B on 2026-03-10 (inactive since 2026-03-03, completion below 50%)"));
        assert!(report.contains("- no_activity: 1 students"));
        assert!(report.contains(
            "- Tal Student1 (tal1@example.edu) last access never, attendance 67%: no_activity, no_completion"
        ));
    }

    #[test]
    fn empty_report_says_so() {
        let ctx = RequestContext::new(None);
        let report = build_report(None, &Thresholds::default(), &ctx, &[], &HashMap::new());
        assert!(report.contains("Generated for all students"));
        assert_eq!(report.matches("No students flagged.").count(), 2);
    }
}
