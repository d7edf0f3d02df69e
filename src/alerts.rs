use std::collections::HashSet;

use crate::config::Thresholds;
use crate::models::{AlertType, NewAlert, RiskEntry, RiskReason};

/// Alerts to raise for the at-risk entries, skipping every (student, type)
/// pair that already has an open alert.
pub fn plan_alerts(
    entries: &[RiskEntry],
    open: &HashSet<(i64, AlertType)>,
    thresholds: &Thresholds,
) -> Vec<NewAlert> {
    entries
        .iter()
        .flat_map(|entry| {
            entry.reasons.iter().filter_map(move |reason| {
                let alert_type = AlertType::from(*reason);
                if open.contains(&(entry.student.id, alert_type)) {
                    return None;
                }
                Some(NewAlert {
                    student_id: entry.student.id,
                    alert_type,
                    details: describe(entry, *reason, thresholds),
                })
            })
        })
        .collect()
}

fn describe(entry: &RiskEntry, reason: RiskReason, thresholds: &Thresholds) -> String {
    match reason {
        RiskReason::NoActivity => match entry.student.last_access_at() {
            Some(at) => format!(
                "No activity for more than {} days (last access {})",
                thresholds.inactivity_days(),
                at.format("%Y-%m-%d")
            ),
            None => "Never accessed the site".to_string(),
        },
        RiskReason::NoCompletion => format!(
            "Completion below {}% in at least one course",
            thresholds.completion_pct()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Student;
    use std::collections::BTreeSet;

    fn entry(id: i64, last_access: i64, reasons: &[RiskReason]) -> RiskEntry {
        let student = Student {
            id,
            first_name: "Omer".to_string(),
            last_name: "Shapiro".to_string(),
            email: format!("omer{id}@example.edu"),
            last_access,
            suspended: false,
            deleted: false,
        };
        RiskEntry::new(student, reasons.iter().copied().collect::<BTreeSet<_>>()).unwrap()
    }

    #[test]
    fn raises_one_alert_per_reason() {
        let entries = vec![entry(1, 0, &[RiskReason::NoActivity, RiskReason::NoCompletion])];
        let planned = plan_alerts(&entries, &HashSet::new(), &Thresholds::default());

        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].alert_type, AlertType::NoActivity);
        assert_eq!(planned[0].details, "Never accessed the site");
        assert_eq!(planned[1].alert_type, AlertType::NoCompletion);
        assert_eq!(planned[1].details, "Completion below 50% in at least one course");
    }

    #[test]
    fn skips_pairs_with_open_alerts() {
        let entries = vec![
            entry(1, 0, &[RiskReason::NoActivity, RiskReason::NoCompletion]),
            entry(2, 0, &[RiskReason::NoActivity]),
        ];
        let open = HashSet::from([(1, AlertType::NoActivity), (2, AlertType::NoCompletion)]);

        let planned = plan_alerts(&entries, &open, &Thresholds::default());
        let keys: Vec<(i64, AlertType)> =
            planned.iter().map(|a| (a.student_id, a.alert_type)).collect();

        assert_eq!(keys, vec![(1, AlertType::NoCompletion), (2, AlertType::NoActivity)]);
    }

    #[test]
    fn inactivity_details_include_last_access_date() {
        // 2025-10-09T00:00:00Z
        let entries = vec![entry(3, 1_759_968_000, &[RiskReason::NoActivity])];
        let planned = plan_alerts(&entries, &HashSet::new(), &Thresholds::default());
        assert_eq!(
            planned[0].details,
            "No activity for more than 7 days (last access 2025-10-09)"
        );
    }
}
