//! Attendance reconciliation.
//!
//! Each source reports how many of its ended sessions a student attended.
//! Meeting-platform participant logs are not reliably linked to internal
//! accounts, so they are matched through an ordered cascade of id, email and
//! name checks. The name checks are substring matches and can credit the
//! wrong student when two students share a name fragment; that limitation is
//! kept as is.

use std::collections::{BTreeSet, HashSet};

use crate::models::{
    MeetingSession, ParticipantRecord, RegisterMark, RegisterSession, Student,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionTally {
    pub attended: usize,
    pub countable: usize,
}

pub trait AttendanceSource {
    /// Whether any attendance-taking activity exists in scope.
    fn has_instances(&self) -> bool;

    fn tally(&self, student: &Student, now: i64) -> SessionTally;
}

/// Percentage of countable sessions attended, or `None` when no source is
/// available, nothing in scope takes attendance, or no session has ended.
pub fn compute_attendance(
    source: Option<&dyn AttendanceSource>,
    student: &Student,
    now: i64,
) -> Option<u8> {
    let source = source?;
    if !source.has_instances() {
        return None;
    }

    let tally = source.tally(student, now);
    if tally.countable == 0 {
        return None;
    }

    Some(percentage(tally.attended, tally.countable))
}

pub fn percentage(attended: usize, countable: usize) -> u8 {
    let ratio = attended.min(countable) as f64 / countable as f64;
    (ratio * 100.0).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    UserId,
    Email,
    FullName,
    EmbeddedEmail,
}

impl MatchKind {
    pub const CASCADE: [MatchKind; 4] = [
        MatchKind::UserId,
        MatchKind::Email,
        MatchKind::FullName,
        MatchKind::EmbeddedEmail,
    ];

    pub fn matches(&self, student: &Student, participant: &ParticipantRecord) -> bool {
        match self {
            Self::UserId => participant.user_id == Some(student.id),
            Self::Email => participant
                .user_email
                .as_deref()
                .is_some_and(|email| !email.is_empty() && email.eq_ignore_ascii_case(&student.email)),
            Self::FullName => {
                let display = participant.name.to_lowercase();
                let first = student.first_name.trim().to_lowercase();
                let last = student.last_name.trim().to_lowercase();
                if first.is_empty() && last.is_empty() {
                    return false;
                }
                display.contains(&format!("{first} {last}"))
                    || display.contains(&format!("{last} {first}"))
            }
            Self::EmbeddedEmail => {
                let email = student.email.trim().to_lowercase();
                !email.is_empty() && participant.name.to_lowercase().contains(&email)
            }
        }
    }
}

/// First cascade step that finds the student among a session's participants.
pub fn match_session<'a, I>(student: &Student, participants: I) -> Option<MatchKind>
where
    I: IntoIterator<Item = &'a ParticipantRecord>,
    I::IntoIter: Clone,
{
    let participants = participants.into_iter();
    MatchKind::CASCADE.into_iter().find(|kind| {
        participants
            .clone()
            .any(|participant| kind.matches(student, participant))
    })
}

/// Participant logs pulled from the external meeting platform.
#[derive(Debug, Clone, Default)]
pub struct MeetingLedger {
    pub meeting_ids: Vec<i64>,
    pub sessions: Vec<MeetingSession>,
    pub participants: Vec<ParticipantRecord>,
}

impl MeetingLedger {
    /// Uuids of ended sessions belonging to meetings in scope, each once.
    pub fn countable_uuids(&self, now: i64) -> BTreeSet<&str> {
        let meeting_ids: HashSet<i64> = self.meeting_ids.iter().copied().collect();
        self.sessions
            .iter()
            .filter(|session| meeting_ids.contains(&session.meeting_id) && session.end_time < now)
            .map(|session| session.uuid.as_str())
            .collect()
    }
}

impl AttendanceSource for MeetingLedger {
    fn has_instances(&self) -> bool {
        !self.meeting_ids.is_empty()
    }

    fn tally(&self, student: &Student, now: i64) -> SessionTally {
        let uuids = self.countable_uuids(now);
        let attended = uuids
            .iter()
            .filter(|uuid| {
                let on_session = self
                    .participants
                    .iter()
                    .filter(|participant| participant.session_uuid == **uuid);
                let found = match_session(student, on_session);
                if let Some(kind) = found {
                    tracing::trace!(student = student.id, session = %uuid, ?kind, "matched participant");
                }
                found.is_some()
            })
            .count();

        SessionTally {
            attended,
            countable: uuids.len(),
        }
    }
}

/// Marks kept by the dedicated attendance register.
#[derive(Debug, Clone, Default)]
pub struct RegisterLedger {
    pub sessions: Vec<RegisterSession>,
    pub marks: Vec<RegisterMark>,
}

impl AttendanceSource for RegisterLedger {
    fn has_instances(&self) -> bool {
        !self.sessions.is_empty()
    }

    fn tally(&self, student: &Student, now: i64) -> SessionTally {
        let countable: BTreeSet<i64> = self
            .sessions
            .iter()
            .filter(|session| session.session_date + session.duration < now)
            .map(|session| session.id)
            .collect();

        let attended = countable
            .iter()
            .filter(|session_id| {
                self.marks.iter().any(|mark| {
                    mark.session_id == **session_id
                        && mark.student_id == student.id
                        && mark.status.counts_as_attended()
                })
            })
            .count();

        SessionTally {
            attended,
            countable: countable.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarkStatus;

    const NOW: i64 = 1_760_000_000;

    fn student() -> Student {
        Student {
            id: 42,
            first_name: "Dana".to_string(),
            last_name: "Cohen".to_string(),
            email: "dana.cohen@example.edu".to_string(),
            last_access: NOW - 3600,
            suspended: false,
            deleted: false,
        }
    }

    fn session(uuid: &str, end_time: i64) -> MeetingSession {
        MeetingSession {
            meeting_id: 1,
            uuid: uuid.to_string(),
            end_time,
        }
    }

    fn participant(uuid: &str, user_id: Option<i64>, name: &str, email: Option<&str>) -> ParticipantRecord {
        ParticipantRecord {
            session_uuid: uuid.to_string(),
            user_id,
            name: name.to_string(),
            user_email: email.map(str::to_string),
        }
    }

    fn ledger(sessions: Vec<MeetingSession>, participants: Vec<ParticipantRecord>) -> MeetingLedger {
        MeetingLedger {
            meeting_ids: vec![1],
            sessions,
            participants,
        }
    }

    #[test]
    fn id_and_email_matches_give_two_of_three() {
        let ledger = ledger(
            vec![session("a", NOW - 10), session("b", NOW - 10), session("c", NOW - 10)],
            vec![
                participant("a", Some(42), "Someone", None),
                participant("b", None, "Laptop", Some("DANA.COHEN@example.edu")),
                participant("c", None, "Guest", Some("other@example.edu")),
            ],
        );

        assert_eq!(compute_attendance(Some(&ledger), &student(), NOW), Some(67));
    }

    #[test]
    fn duplicate_uuid_rows_count_once() {
        let ledger = ledger(
            vec![session("a", NOW - 10), session("a", NOW - 5), session("b", NOW - 10)],
            vec![participant("a", Some(42), "Dana", None)],
        );

        assert_eq!(ledger.countable_uuids(NOW).len(), 2);
        assert_eq!(compute_attendance(Some(&ledger), &student(), NOW), Some(50));
    }

    #[test]
    fn future_sessions_are_not_countable() {
        let ledger = ledger(
            vec![session("a", NOW + 600)],
            vec![participant("a", Some(42), "Dana", None)],
        );

        assert_eq!(compute_attendance(Some(&ledger), &student(), NOW), None);
    }

    #[test]
    fn zero_attended_is_zero_not_absent() {
        let ledger = ledger(vec![session("a", NOW - 10)], vec![]);
        assert_eq!(compute_attendance(Some(&ledger), &student(), NOW), Some(0));
    }

    #[test]
    fn no_meetings_is_absent() {
        let empty = MeetingLedger::default();
        assert_eq!(compute_attendance(Some(&empty), &student(), NOW), None);
    }

    #[test]
    fn missing_source_is_absent() {
        assert_eq!(compute_attendance(None, &student(), NOW), None);
    }

    #[test]
    fn cascade_prefers_earlier_kinds() {
        let records = vec![
            participant("a", None, "Dana Cohen", None),
            participant("a", Some(42), "phone", None),
        ];
        assert_eq!(match_session(&student(), &records), Some(MatchKind::UserId));
    }

    #[test]
    fn name_matches_in_either_order_case_insensitively() {
        let s = student();
        let forward = participant("a", None, "DANA COHEN (iPad)", None);
        let reversed = participant("a", None, "cohen dana", None);
        let partial = participant("a", None, "Dana", None);

        assert!(MatchKind::FullName.matches(&s, &forward));
        assert!(MatchKind::FullName.matches(&s, &reversed));
        assert!(!MatchKind::FullName.matches(&s, &partial));
    }

    #[test]
    fn email_embedded_in_display_name_matches() {
        let embedded = participant("a", None, "Dana.Cohen@Example.edu (guest)", None);
        assert_eq!(
            match_session(&student(), std::slice::from_ref(&embedded)),
            Some(MatchKind::EmbeddedEmail)
        );
    }

    #[test]
    fn empty_email_never_matches() {
        let mut s = student();
        s.email = String::new();
        let record = participant("a", None, "anyone", Some(""));
        assert!(!MatchKind::Email.matches(&s, &record));
        assert!(!MatchKind::EmbeddedEmail.matches(&s, &record));
    }

    #[test]
    fn recomputation_is_stable() {
        let ledger = ledger(
            vec![session("x", NOW - 10), session("y", NOW - 10), session("z", NOW - 10)],
            vec![
                participant("z", None, "dana cohen", None),
                participant("x", Some(42), "", None),
            ],
        );
        let first = compute_attendance(Some(&ledger), &student(), NOW);
        let second = compute_attendance(Some(&ledger), &student(), NOW);
        assert_eq!(first, Some(67));
        assert_eq!(first, second);
    }

    #[test]
    fn register_counts_present_and_late() {
        let register = RegisterLedger {
            sessions: vec![
                RegisterSession { id: 1, session_date: NOW - 7200, duration: 3600 },
                RegisterSession { id: 2, session_date: NOW - 7200, duration: 3600 },
                RegisterSession { id: 3, session_date: NOW - 7200, duration: 3600 },
                RegisterSession { id: 4, session_date: NOW - 7200, duration: 3600 },
                RegisterSession { id: 5, session_date: NOW + 3600, duration: 3600 },
            ],
            marks: vec![
                RegisterMark { session_id: 1, student_id: 42, status: MarkStatus::Present },
                RegisterMark { session_id: 2, student_id: 42, status: MarkStatus::Late },
                RegisterMark { session_id: 3, student_id: 42, status: MarkStatus::Excused },
                RegisterMark { session_id: 4, student_id: 7, status: MarkStatus::Present },
                RegisterMark { session_id: 5, student_id: 42, status: MarkStatus::Present },
            ],
        };

        assert_eq!(
            register.tally(&student(), NOW),
            SessionTally { attended: 2, countable: 4 }
        );
        assert_eq!(compute_attendance(Some(&register), &student(), NOW), Some(50));
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(3, 3), 100);
    }
}
