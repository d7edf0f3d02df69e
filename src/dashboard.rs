use std::collections::HashMap;

use sqlx::PgPool;

use crate::alerts;
use crate::attendance;
use crate::config::{AttendanceSourceKind, RequestContext, Thresholds};
use crate::db;
use crate::error::Result;
use crate::models::{
    Alert, AlertFilter, AlertStats, ClassSummary, CompletionRecord, CourseStanding, NewClass,
    RiskEntry, Student, StudentOverview,
};
use crate::overview;
use crate::report;
use crate::risk;

/// Reporting operations over one database, bound to validated settings.
pub struct Dashboard {
    pool: PgPool,
    thresholds: Thresholds,
    attendance_source: AttendanceSourceKind,
}

impl Dashboard {
    pub fn new(pool: PgPool, thresholds: Thresholds, attendance_source: AttendanceSourceKind) -> Self {
        Self {
            pool,
            thresholds,
            attendance_source,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub async fn at_risk(&self, ctx: &RequestContext, class_id: Option<i64>) -> Result<Vec<RiskEntry>> {
        self.class_scope(class_id).await?;
        self.flag_students(ctx, class_id).await
    }

    /// Name of the class, or `None` for the whole population. Unknown ids
    /// are `NotFound`.
    async fn class_scope(&self, class_id: Option<i64>) -> Result<Option<String>> {
        match class_id {
            Some(class_id) => Ok(Some(db::fetch_class_name(&self.pool, class_id).await?)),
            None => Ok(None),
        }
    }

    /// Runs the aggregator over a scope already known to exist.
    async fn flag_students(&self, ctx: &RequestContext, class_id: Option<i64>) -> Result<Vec<RiskEntry>> {
        let students = db::fetch_students(&self.pool, class_id).await?;
        let student_ids: Vec<i64> = students.iter().map(|s| s.id).collect();
        let completions = db::fetch_completion(&self.pool, &student_ids, None).await?;

        let candidates = students.len();
        let entries = risk::compute_at_risk(students, &completions, &self.thresholds, ctx);
        tracing::info!(
            ?class_id,
            candidates,
            flagged = entries.len(),
            inactivity_days = self.thresholds.inactivity_days(),
            completion_pct = self.thresholds.completion_pct(),
            "computed at-risk students"
        );

        Ok(entries)
    }

    /// Attendance for one course, or across every active enrollment when
    /// `course_id` is `None`.
    pub async fn attendance(
        &self,
        ctx: &RequestContext,
        student_id: i64,
        course_id: Option<i64>,
    ) -> Result<Option<u8>> {
        let student = db::fetch_student(&self.pool, student_id).await?;
        let course_ids = match course_id {
            Some(course_id) => {
                db::ensure_course(&self.pool, course_id).await?;
                vec![course_id]
            }
            None => db::fetch_enrolled_courses(&self.pool, student_id)
                .await?
                .into_iter()
                .map(|(id, _)| id)
                .collect(),
        };

        self.attendance_in(ctx, &student, &course_ids).await
    }

    async fn attendance_in(
        &self,
        ctx: &RequestContext,
        student: &Student,
        course_ids: &[i64],
    ) -> Result<Option<u8>> {
        if course_ids.is_empty() {
            return Ok(None);
        }

        let source = db::load_attendance_source(&self.pool, self.attendance_source, course_ids).await?;
        let value = attendance::compute_attendance(source.as_deref(), student, ctx.timestamp());
        tracing::debug!(student = student.id, ?course_ids, ?value, source = %self.attendance_source, "computed attendance");

        Ok(value)
    }

    /// Completion records for a student, optionally limited to some courses.
    pub async fn completion(
        &self,
        student_id: i64,
        course_ids: &[i64],
    ) -> Result<Vec<CompletionRecord>> {
        db::fetch_student(&self.pool, student_id).await?;
        let filter = (!course_ids.is_empty()).then_some(course_ids);
        let records = db::fetch_completion(&self.pool, &[student_id], filter)
            .await?
            .remove(&student_id)
            .unwrap_or_default();
        Ok(records)
    }

    pub async fn student_overview(&self, ctx: &RequestContext, student_id: i64) -> Result<StudentOverview> {
        let student = db::fetch_student(&self.pool, student_id).await?;
        let courses = db::fetch_enrolled_courses(&self.pool, student_id).await?;
        let mut completions = db::fetch_completion(&self.pool, &[student_id], None)
            .await?
            .remove(&student_id)
            .unwrap_or_default();

        let mut standings = Vec::with_capacity(courses.len());
        for (course_id, course_name) in courses {
            let progress = completions
                .iter()
                .position(|record| record.course_id == course_id)
                .and_then(|index| completions.swap_remove(index).progress);
            let attendance = self.attendance_in(ctx, &student, &[course_id]).await?;

            standings.push(CourseStanding {
                course_id,
                course_name,
                progress,
                attendance,
            });
        }

        Ok(overview::summarize_student(student, standings))
    }

    /// Raises an active alert for every new (student, reason) pair and
    /// returns how many were inserted.
    pub async fn raise_alerts(&self, ctx: &RequestContext, class_id: Option<i64>) -> Result<usize> {
        let entries = self.at_risk(ctx, class_id).await?;
        let student_ids: Vec<i64> = entries.iter().map(|e| e.student.id).collect();
        let open = db::open_alert_keys(&self.pool, &student_ids).await?;

        let planned = alerts::plan_alerts(&entries, &open, &self.thresholds);
        let inserted = db::insert_alerts(&self.pool, &planned, ctx.timestamp()).await?;
        tracing::info!(flagged = entries.len(), inserted, "raised alerts");

        Ok(inserted)
    }

    pub async fn report(&self, ctx: &RequestContext, class_id: Option<i64>) -> Result<String> {
        let scope = self.class_scope(class_id).await?;
        let entries = self.flag_students(ctx, class_id).await?;

        let mut attendance = HashMap::new();
        for entry in entries.iter().take(report::REPORT_STUDENT_LIMIT) {
            let courses: Vec<i64> = db::fetch_enrolled_courses(&self.pool, entry.student.id)
                .await?
                .into_iter()
                .map(|(id, _)| id)
                .collect();
            let value = self.attendance_in(ctx, &entry.student, &courses).await?;
            attendance.insert(entry.student.id, value);
        }

        Ok(report::build_report(
            scope.as_deref(),
            &self.thresholds,
            ctx,
            &entries,
            &attendance,
        ))
    }

    pub async fn list_alerts(
        &self,
        filter: &AlertFilter,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Alert>, i64)> {
        self.class_scope(filter.class_id).await?;
        db::list_alerts(&self.pool, filter, page, per_page).await
    }

    pub async fn alert_stats(&self) -> Result<AlertStats> {
        db::alert_stats(&self.pool).await
    }

    pub async fn acknowledge_alert(&self, ctx: &RequestContext, alert_id: i64) -> Result<()> {
        db::acknowledge_alert(&self.pool, alert_id, ctx.actor_id, ctx.timestamp()).await?;
        tracing::info!(alert_id, actor = ?ctx.actor_id, "alert acknowledged");
        Ok(())
    }

    pub async fn resolve_alert(&self, ctx: &RequestContext, alert_id: i64) -> Result<()> {
        db::resolve_alert(&self.pool, alert_id, ctx.timestamp()).await?;
        tracing::info!(alert_id, "alert resolved");
        Ok(())
    }

    pub async fn delete_alert(&self, alert_id: i64) -> Result<()> {
        db::delete_alert(&self.pool, alert_id).await?;
        tracing::info!(alert_id, "alert deleted");
        Ok(())
    }

    pub async fn list_classes(&self, search: Option<&str>) -> Result<Vec<ClassSummary>> {
        db::list_classes(&self.pool, search).await
    }

    pub async fn create_class(&self, ctx: &RequestContext, class: &NewClass) -> Result<i64> {
        let id = db::create_class(&self.pool, class, ctx.timestamp()).await?;
        tracing::info!(class_id = id, name = class.name(), "class created");
        Ok(id)
    }

    /// Adds a student to a class; `false` when they were already a member.
    pub async fn add_class_member(&self, ctx: &RequestContext, class_id: i64, student_id: i64) -> Result<bool> {
        self.class_scope(Some(class_id)).await?;
        db::fetch_student(&self.pool, student_id).await?;

        let added = db::add_class_member(&self.pool, class_id, student_id, ctx.timestamp()).await?;
        tracing::info!(class_id, student_id, added, "class member added");
        Ok(added)
    }

    pub async fn remove_class_member(&self, ctx: &RequestContext, class_id: i64, student_id: i64) -> Result<()> {
        self.class_scope(Some(class_id)).await?;
        db::remove_class_member(&self.pool, class_id, student_id, ctx.timestamp()).await?;
        tracing::info!(class_id, student_id, "class member removed");
        Ok(())
    }
}
