use std::collections::{BTreeSet, HashMap, HashSet};

use anyhow::Context;
use chrono::{Duration, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::attendance::{AttendanceSource, MeetingLedger, RegisterLedger};
use crate::config::AttendanceSourceKind;
use crate::error::{DashboardError, Result};
use crate::import;
use crate::models::{
    Alert, AlertFilter, AlertStats, AlertType, ClassSummary, CompletionRecord, MeetingSession,
    NewAlert, NewClass, ParticipantRecord, RegisterMark, RegisterSession, Student,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn fetch_student(pool: &PgPool, student_id: i64) -> Result<Student> {
    sqlx::query_as::<_, Student>(
        "SELECT id, first_name, last_name, email, last_access, suspended, deleted \
         FROM academic_dashboard.students WHERE id = $1",
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DashboardError::not_found("student", student_id))
}

pub async fn fetch_class_name(pool: &PgPool, class_id: i64) -> Result<String> {
    let row = sqlx::query("SELECT name FROM academic_dashboard.classes WHERE id = $1")
        .bind(class_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(row.try_get("name")?),
        None => Err(DashboardError::not_found("class", class_id)),
    }
}

pub async fn ensure_course(pool: &PgPool, course_id: i64) -> Result<()> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM academic_dashboard.courses WHERE id = $1)",
    )
    .bind(course_id)
    .fetch_one(pool)
    .await?;

    if exists {
        Ok(())
    } else {
        Err(DashboardError::not_found("course", course_id))
    }
}

/// Class members when scoped, otherwise every student that is neither
/// deleted nor suspended.
pub async fn fetch_students(pool: &PgPool, class_id: Option<i64>) -> Result<Vec<Student>> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT DISTINCT u.id, u.first_name, u.last_name, u.email, u.last_access, \
         u.suspended, u.deleted \
         FROM academic_dashboard.students u",
    );

    match class_id {
        Some(class_id) => {
            builder
                .push(
                    " JOIN academic_dashboard.class_members cm ON cm.student_id = u.id \
                     WHERE cm.class_id = ",
                )
                .push_bind(class_id);
        }
        None => {
            builder.push(" WHERE u.deleted = FALSE AND u.suspended = FALSE");
        }
    }
    builder.push(" ORDER BY u.id");

    let students = builder.build_query_as::<Student>().fetch_all(pool).await?;
    Ok(students)
}

/// Escapes `%`, `_` and `\` so a user search matches literally inside LIKE.
pub fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Classes ordered by name, with their member counts.
pub async fn list_classes(pool: &PgPool, search: Option<&str>) -> Result<Vec<ClassSummary>> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT c.id, c.name, c.description, COUNT(cm.student_id) AS member_count \
         FROM academic_dashboard.classes c \
         LEFT JOIN academic_dashboard.class_members cm ON cm.class_id = c.id",
    );
    if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
        builder
            .push(" WHERE c.name ILIKE ")
            .push_bind(like_pattern(search.trim()));
    }
    builder.push(" GROUP BY c.id, c.name, c.description ORDER BY c.name");

    let classes = builder.build_query_as::<ClassSummary>().fetch_all(pool).await?;
    Ok(classes)
}

pub async fn create_class(pool: &PgPool, class: &NewClass, now: i64) -> Result<i64> {
    let id: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO academic_dashboard.classes (name, description, time_created, time_modified)
        VALUES ($1, $2, $3, $3)
        ON CONFLICT (name) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(class.name())
    .bind(class.description())
    .bind(now)
    .fetch_optional(pool)
    .await?;

    id.ok_or_else(|| {
        DashboardError::InvalidRecord(format!("a class named {:?} already exists", class.name()))
    })
}

/// Returns `false` when the student was already a member.
pub async fn add_class_member(pool: &PgPool, class_id: i64, student_id: i64, now: i64) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO academic_dashboard.class_members (class_id, student_id) \
         VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(class_id)
    .bind(student_id)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        touch_class(pool, class_id, now).await?;
    }
    Ok(result.rows_affected() > 0)
}

pub async fn remove_class_member(pool: &PgPool, class_id: i64, student_id: i64, now: i64) -> Result<()> {
    let result = sqlx::query(
        "DELETE FROM academic_dashboard.class_members WHERE class_id = $1 AND student_id = $2",
    )
    .bind(class_id)
    .bind(student_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DashboardError::not_found("class member", student_id));
    }
    touch_class(pool, class_id, now).await
}

async fn touch_class(pool: &PgPool, class_id: i64, now: i64) -> Result<()> {
    sqlx::query("UPDATE academic_dashboard.classes SET time_modified = $2 WHERE id = $1")
        .bind(class_id)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

/// Completion records per student over active enrollments, optionally
/// restricted to the given courses.
pub async fn fetch_completion(
    pool: &PgPool,
    student_ids: &[i64],
    course_ids: Option<&[i64]>,
) -> Result<HashMap<i64, Vec<CompletionRecord>>> {
    let mut completions: HashMap<i64, Vec<CompletionRecord>> = HashMap::new();
    if student_ids.is_empty() {
        return Ok(completions);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT e.student_id, c.id AS course_id, c.full_name, c.completion_enabled, \
         COUNT(a.id) FILTER (WHERE a.tracked) AS tracked, \
         COUNT(a.id) FILTER (WHERE a.tracked AND ac.completed) AS completed \
         FROM academic_dashboard.enrollments e \
         JOIN academic_dashboard.courses c ON c.id = e.course_id \
         LEFT JOIN academic_dashboard.course_activities a ON a.course_id = c.id \
         LEFT JOIN academic_dashboard.activity_completions ac \
         ON ac.activity_id = a.id AND ac.student_id = e.student_id \
         WHERE e.status = 'active' AND e.student_id = ANY(",
    );
    builder.push_bind(student_ids.to_vec()).push(")");

    if let Some(course_ids) = course_ids {
        builder
            .push(" AND c.id = ANY(")
            .push_bind(course_ids.to_vec())
            .push(")");
    }
    builder.push(
        " GROUP BY e.student_id, c.id, c.full_name, c.completion_enabled \
         ORDER BY e.student_id, c.id",
    );

    let rows = builder.build().fetch_all(pool).await?;
    for row in rows {
        let student_id: i64 = row.try_get("student_id")?;
        let record = CompletionRecord::derive(
            row.try_get("course_id")?,
            row.try_get::<String, _>("full_name")?,
            row.try_get("completion_enabled")?,
            row.try_get("tracked")?,
            row.try_get("completed")?,
        )?;
        completions.entry(student_id).or_default().push(record);
    }

    Ok(completions)
}

pub async fn fetch_enrolled_courses(pool: &PgPool, student_id: i64) -> Result<Vec<(i64, String)>> {
    let rows = sqlx::query(
        "SELECT c.id, c.full_name \
         FROM academic_dashboard.enrollments e \
         JOIN academic_dashboard.courses c ON c.id = e.course_id \
         WHERE e.student_id = $1 AND e.status = 'active' \
         ORDER BY c.id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    let mut courses = Vec::with_capacity(rows.len());
    for row in rows {
        courses.push((row.try_get("id")?, row.try_get("full_name")?));
    }
    Ok(courses)
}

pub async fn integration_enabled(pool: &PgPool, name: &str) -> Result<bool> {
    let enabled: Option<bool> =
        sqlx::query_scalar("SELECT enabled FROM academic_dashboard.integrations WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
    Ok(enabled.unwrap_or(false))
}

/// Loads the configured attendance source for the courses, or `None` when
/// the source is switched off or its integration is not enabled.
pub async fn load_attendance_source(
    pool: &PgPool,
    kind: AttendanceSourceKind,
    course_ids: &[i64],
) -> Result<Option<Box<dyn AttendanceSource>>> {
    let Some(integration) = kind.integration() else {
        return Ok(None);
    };
    if !integration_enabled(pool, integration).await? {
        tracing::debug!(source = %kind, "attendance integration not enabled");
        return Ok(None);
    }

    let source: Box<dyn AttendanceSource> = match kind {
        AttendanceSourceKind::Meeting => Box::new(load_meeting_ledger(pool, course_ids).await?),
        AttendanceSourceKind::Register => Box::new(load_register_ledger(pool, course_ids).await?),
        AttendanceSourceKind::None => return Ok(None),
    };
    Ok(Some(source))
}

async fn load_meeting_ledger(pool: &PgPool, course_ids: &[i64]) -> Result<MeetingLedger> {
    let meeting_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM academic_dashboard.meetings WHERE course_id = ANY($1) ORDER BY id",
    )
    .bind(course_ids)
    .fetch_all(pool)
    .await?;

    if meeting_ids.is_empty() {
        return Ok(MeetingLedger::default());
    }

    let sessions = sqlx::query_as::<_, MeetingSession>(
        "SELECT meeting_id, uuid, end_time \
         FROM academic_dashboard.meeting_sessions WHERE meeting_id = ANY($1)",
    )
    .bind(&meeting_ids[..])
    .fetch_all(pool)
    .await?;

    let uuids: Vec<String> = sessions
        .iter()
        .map(|s| s.uuid.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let participants = sqlx::query_as::<_, ParticipantRecord>(
        "SELECT session_uuid, user_id, name, user_email \
         FROM academic_dashboard.meeting_participants WHERE session_uuid = ANY($1)",
    )
    .bind(&uuids[..])
    .fetch_all(pool)
    .await?;

    tracing::debug!(
        meetings = meeting_ids.len(),
        sessions = sessions.len(),
        participants = participants.len(),
        "loaded meeting ledger"
    );

    Ok(MeetingLedger {
        meeting_ids,
        sessions,
        participants,
    })
}

async fn load_register_ledger(pool: &PgPool, course_ids: &[i64]) -> Result<RegisterLedger> {
    let sessions = sqlx::query_as::<_, RegisterSession>(
        "SELECT id, session_date, duration \
         FROM academic_dashboard.register_sessions WHERE course_id = ANY($1)",
    )
    .bind(course_ids)
    .fetch_all(pool)
    .await?;

    let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
    let rows = sqlx::query(
        "SELECT session_id, student_id, status \
         FROM academic_dashboard.register_marks WHERE session_id = ANY($1)",
    )
    .bind(&session_ids[..])
    .fetch_all(pool)
    .await?;

    let mut marks = Vec::with_capacity(rows.len());
    for row in rows {
        marks.push(RegisterMark {
            session_id: row.try_get("session_id")?,
            student_id: row.try_get("student_id")?,
            status: row.try_get::<String, _>("status")?.parse()?,
        });
    }

    Ok(RegisterLedger { sessions, marks })
}

fn push_alert_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &AlertFilter) {
    if let Some(alert_type) = filter.alert_type {
        builder
            .push(" AND a.alert_type = ")
            .push_bind(alert_type.as_str());
    }
    if let Some(status) = filter.status {
        builder.push(" AND a.status = ").push_bind(status.as_str());
    }
    if let Some(class_id) = filter.class_id {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM academic_dashboard.class_members cm \
                 WHERE cm.student_id = a.student_id AND cm.class_id = ",
            )
            .push_bind(class_id)
            .push(")");
    }
}

fn alert_from_row(row: &PgRow) -> Result<Alert> {
    let first_name: String = row.try_get("first_name")?;
    let last_name: String = row.try_get("last_name")?;

    Ok(Alert {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        student_name: format!("{first_name} {last_name}"),
        student_email: row.try_get("email")?,
        course_id: row.try_get("course_id")?,
        course_name: row.try_get("course_name")?,
        alert_type: row.try_get::<String, _>("alert_type")?.parse()?,
        details: row.try_get("details")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        acknowledged_by: row.try_get("acknowledged_by")?,
        time_created: row.try_get("time_created")?,
        time_modified: row.try_get("time_modified")?,
    })
}

/// Row offset of a zero-based page. Saturates instead of overflowing.
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    page.max(0).saturating_mul(per_page.max(0))
}

/// One page of alerts, newest first, along with the total matching count.
pub async fn list_alerts(
    pool: &PgPool,
    filter: &AlertFilter,
    page: i64,
    per_page: i64,
) -> Result<(Vec<Alert>, i64)> {
    let mut count: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM academic_dashboard.alerts a WHERE 1=1");
    push_alert_filters(&mut count, filter);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT a.id, a.student_id, u.first_name, u.last_name, u.email, \
         a.course_id, c.full_name AS course_name, a.alert_type, a.details, a.status, \
         a.acknowledged_by, a.time_created, a.time_modified \
         FROM academic_dashboard.alerts a \
         JOIN academic_dashboard.students u ON u.id = a.student_id \
         LEFT JOIN academic_dashboard.courses c ON c.id = a.course_id \
         WHERE 1=1",
    );
    push_alert_filters(&mut builder, filter);
    builder
        .push(" ORDER BY a.time_created DESC, a.id DESC LIMIT ")
        .push_bind(per_page)
        .push(" OFFSET ")
        .push_bind(page_offset(page, per_page));

    let rows = builder.build().fetch_all(pool).await?;
    let alerts = rows.iter().map(alert_from_row).collect::<Result<Vec<_>>>()?;

    Ok((alerts, total))
}

pub async fn alert_stats(pool: &PgPool) -> Result<AlertStats> {
    let row = sqlx::query(
        "SELECT \
         COUNT(*) FILTER (WHERE status = 'active') AS active, \
         COUNT(*) FILTER (WHERE status = 'acknowledged') AS acknowledged, \
         COUNT(*) FILTER (WHERE status = 'resolved') AS resolved, \
         COUNT(*) FILTER (WHERE status = 'active' AND alert_type = 'no_activity') AS no_activity, \
         COUNT(*) FILTER (WHERE status = 'active' AND alert_type = 'no_completion') AS no_completion, \
         COUNT(*) FILTER (WHERE status = 'active' AND alert_type = 'low_grade') AS low_grade \
         FROM academic_dashboard.alerts",
    )
    .fetch_one(pool)
    .await?;

    Ok(AlertStats {
        active: row.try_get("active")?,
        acknowledged: row.try_get("acknowledged")?,
        resolved: row.try_get("resolved")?,
        no_activity: row.try_get("no_activity")?,
        no_completion: row.try_get("no_completion")?,
        low_grade: row.try_get("low_grade")?,
    })
}

pub async fn acknowledge_alert(
    pool: &PgPool,
    alert_id: i64,
    actor_id: Option<i64>,
    now: i64,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE academic_dashboard.alerts \
         SET status = 'acknowledged', acknowledged_by = $2, time_modified = $3 \
         WHERE id = $1",
    )
    .bind(alert_id)
    .bind(actor_id)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DashboardError::not_found("alert", alert_id));
    }
    Ok(())
}

pub async fn resolve_alert(pool: &PgPool, alert_id: i64, now: i64) -> Result<()> {
    let result = sqlx::query(
        "UPDATE academic_dashboard.alerts SET status = 'resolved', time_modified = $2 \
         WHERE id = $1",
    )
    .bind(alert_id)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DashboardError::not_found("alert", alert_id));
    }
    Ok(())
}

pub async fn delete_alert(pool: &PgPool, alert_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM academic_dashboard.alerts WHERE id = $1")
        .bind(alert_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DashboardError::not_found("alert", alert_id));
    }
    Ok(())
}

/// (student, type) pairs that already have an active or acknowledged alert.
pub async fn open_alert_keys(
    pool: &PgPool,
    student_ids: &[i64],
) -> Result<HashSet<(i64, AlertType)>> {
    let rows = sqlx::query(
        "SELECT DISTINCT student_id, alert_type FROM academic_dashboard.alerts \
         WHERE status IN ('active', 'acknowledged') AND student_id = ANY($1)",
    )
    .bind(student_ids)
    .fetch_all(pool)
    .await?;

    let mut keys = HashSet::with_capacity(rows.len());
    for row in rows {
        let student_id: i64 = row.try_get("student_id")?;
        let alert_type: AlertType = row.try_get::<String, _>("alert_type")?.parse()?;
        keys.insert((student_id, alert_type));
    }
    Ok(keys)
}

pub async fn insert_alerts(pool: &PgPool, alerts: &[NewAlert], now: i64) -> Result<usize> {
    let mut inserted = 0usize;

    for alert in alerts {
        sqlx::query(
            r#"
            INSERT INTO academic_dashboard.alerts
            (student_id, alert_type, details, status, time_created, time_modified)
            VALUES ($1, $2, $3, 'active', $4, $4)
            "#,
        )
        .bind(alert.student_id)
        .bind(alert.alert_type.as_str())
        .bind(&alert.details)
        .bind(now)
        .execute(pool)
        .await?;
        inserted += 1;
    }

    Ok(inserted)
}

pub async fn import_participants(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = import::read_participants(file)?;
    let mut inserted = 0usize;

    for row in rows {
        let result = sqlx::query(
            r#"
            INSERT INTO academic_dashboard.meeting_participants
            (session_uuid, user_id, name, user_email, join_time, leave_time, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(&row.session_uuid)
        .bind(row.user_id)
        .bind(&row.name)
        .bind(&row.user_email)
        .bind(row.join_time)
        .bind(row.leave_time)
        .bind(row.source_key())
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let days_ago = |days: i64| (now - Duration::days(days)).timestamp();

    let students = vec![
        (101_i64, "Noa", "Levi", "noa.levi@example.edu", days_ago(2), false),
        (102, "Itai", "Ben-David", "itai.bd@example.edu", days_ago(12), false),
        (103, "Maya", "Goldberg", "maya.goldberg@example.edu", 0, false),
        (104, "Yosef", "Haddad", "yosef.haddad@example.edu", days_ago(1), true),
    ];

    for (id, first_name, last_name, email, last_access, suspended) in students {
        sqlx::query(
            r#"
            INSERT INTO academic_dashboard.students
            (id, first_name, last_name, email, last_access, suspended)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET last_access = EXCLUDED.last_access, suspended = EXCLUDED.suspended
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(last_access)
        .bind(suspended)
        .execute(pool)
        .await?;
    }

    let courses = vec![
        (201_i64, "Introduction to Algebra", "ALG101", true),
        (202, "Modern Hebrew Literature", "LIT210", true),
        (203, "Physical Education", "PE100", false),
    ];

    for (id, full_name, short_name, completion_enabled) in courses {
        sqlx::query(
            r#"
            INSERT INTO academic_dashboard.courses (id, full_name, short_name, completion_enabled)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(short_name)
        .bind(completion_enabled)
        .execute(pool)
        .await?;
    }

    let enrollments = [(101_i64, 201_i64), (101, 202), (102, 201), (102, 203), (103, 202), (104, 201)];
    for (student_id, course_id) in enrollments {
        sqlx::query(
            "INSERT INTO academic_dashboard.enrollments (student_id, course_id) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(student_id)
        .bind(course_id)
        .execute(pool)
        .await?;
    }

    let activities = [
        (301_i64, 201_i64, "Linear equations quiz"),
        (302, 201, "Graphing worksheet"),
        (303, 201, "Polynomials lesson"),
        (304, 201, "Midterm"),
        (305, 202, "Agnon reading response"),
        (306, 202, "Poetry seminar notes"),
        (307, 203, "Fitness log"),
    ];
    for (id, course_id, name) in activities {
        sqlx::query(
            "INSERT INTO academic_dashboard.course_activities (id, course_id, name) \
             VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(course_id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let completions = [(301_i64, 101_i64), (302, 101), (303, 101), (305, 101), (306, 101), (301, 102)];
    for (activity_id, student_id) in completions {
        sqlx::query(
            "INSERT INTO academic_dashboard.activity_completions (activity_id, student_id, completed) \
             VALUES ($1, $2, TRUE) ON CONFLICT DO NOTHING",
        )
        .bind(activity_id)
        .bind(student_id)
        .execute(pool)
        .await?;
    }

    let class_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO academic_dashboard.classes (name, description, time_created, time_modified)
        VALUES ('Cohort 2026 A', 'First-year cohort, morning track', $1, $1)
        ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
        RETURNING id
        "#,
    )
    .bind(now.timestamp())
    .fetch_one(pool)
    .await?;
    for student_id in [101_i64, 102, 103] {
        sqlx::query(
            "INSERT INTO academic_dashboard.class_members (class_id, student_id) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(class_id)
        .bind(student_id)
        .execute(pool)
        .await?;
    }

    for (name, enabled) in [("meeting", true), ("register", false)] {
        sqlx::query(
            "INSERT INTO academic_dashboard.integrations (name, enabled) VALUES ($1, $2) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(enabled)
        .execute(pool)
        .await?;
    }

    let meetings = [(401_i64, 201_i64, "Algebra live session"), (402, 202, "Literature seminar")];
    for (id, course_id, name) in meetings {
        sqlx::query(
            "INSERT INTO academic_dashboard.meetings (id, course_id, name) \
             VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(course_id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let first = Uuid::parse_str("5b3c9a1e-8f0d-4c55-9a61-0f2d1c7e4b10")?.to_string();
    let second = Uuid::parse_str("a7e41f02-63b9-4d8e-bc1a-93e5d0f6c284")?.to_string();
    let upcoming = Uuid::parse_str("0d9f6c3b-2e71-48a4-8b5d-c1f7a2e9b356")?.to_string();
    let seminar = Uuid::parse_str("e2c58d47-1b0a-4f93-a6e8-57d3b9c0f412")?.to_string();

    // The first session has two detail rows: the host restarted the call.
    let sessions = vec![
        ("seed-s1", 401_i64, first.clone(), days_ago(3), days_ago(3) + 1800),
        ("seed-s2", 401, first.clone(), days_ago(3) + 1900, days_ago(3) + 3600),
        ("seed-s3", 401, second.clone(), days_ago(1), days_ago(1) + 3600),
        ("seed-s4", 401, upcoming, days_ago(-2), days_ago(-2) + 3600),
        ("seed-s5", 402, seminar.clone(), days_ago(5), days_ago(5) + 5400),
    ];

    for (source_key, meeting_id, uuid, start_time, end_time) in sessions {
        sqlx::query(
            r#"
            INSERT INTO academic_dashboard.meeting_sessions
            (meeting_id, uuid, start_time, end_time, source_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(meeting_id)
        .bind(uuid)
        .bind(start_time)
        .bind(end_time)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let participants = vec![
        ("seed-p1", first.clone(), Some(101_i64), "Noa Levi", None::<&str>),
        ("seed-p2", first, None, "itai.bd@example.edu (Itai)", None),
        ("seed-p3", second, None, "Levi Noa", None),
        ("seed-p4", seminar, None, "Maya's iPad", Some("maya.goldberg@example.edu")),
    ];

    for (source_key, session_uuid, user_id, name, user_email) in participants {
        sqlx::query(
            r#"
            INSERT INTO academic_dashboard.meeting_participants
            (session_uuid, user_id, name, user_email, join_time, leave_time, source_key)
            VALUES ($1, $2, $3, $4, $5, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(session_uuid)
        .bind(user_id)
        .bind(name)
        .bind(user_email)
        .bind(days_ago(3))
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        "INSERT INTO academic_dashboard.register_sessions (id, course_id, session_date, duration) \
         VALUES (501, 201, $1, 5400) ON CONFLICT (id) DO NOTHING",
    )
    .bind(days_ago(6))
    .execute(pool)
    .await?;

    for (student_id, status) in [(101_i64, "present"), (102, "absent")] {
        sqlx::query(
            "INSERT INTO academic_dashboard.register_marks (session_id, student_id, status) \
             VALUES (501, $1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(student_id)
        .bind(status)
        .execute(pool)
        .await?;
    }

    Ok(())
}
