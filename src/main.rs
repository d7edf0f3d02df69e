use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod alerts;
mod attendance;
mod config;
mod dashboard;
mod db;
mod error;
mod import;
mod models;
mod overview;
mod report;
mod risk;

use config::{AttendanceSourceKind, RequestContext, Thresholds};
use dashboard::Dashboard;
use models::{AlertFilter, AlertStatus, AlertType, NewClass};

#[derive(Parser)]
#[command(name = "academic-dashboard")]
#[command(about = "At-risk students, attendance and alerts for academic staff", long_about = None)]
struct Cli {
    /// Days without access before a student counts as inactive
    #[arg(
        long,
        global = true,
        env = "ACADEMIC_DASHBOARD_INACTIVITY_DAYS",
        default_value_t = config::DEFAULT_INACTIVITY_DAYS
    )]
    inactivity_days: i64,

    /// Completion percentage below which a course counts as lagging
    #[arg(
        long,
        global = true,
        env = "ACADEMIC_DASHBOARD_COMPLETION_THRESHOLD",
        default_value_t = config::DEFAULT_COMPLETION_THRESHOLD
    )]
    completion_threshold: i64,

    /// Where attendance is read from
    #[arg(
        long,
        global = true,
        value_enum,
        env = "ACADEMIC_DASHBOARD_ATTENDANCE_SOURCE",
        default_value_t = AttendanceSourceKind::Meeting
    )]
    attendance_source: AttendanceSourceKind,

    /// Id of the staff member performing the action
    #[arg(long, global = true, env = "ACADEMIC_DASHBOARD_ACTOR")]
    actor: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import meeting participants from a platform CSV export
    ImportParticipants {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List at-risk students
    AtRisk {
        #[arg(long)]
        class: Option<i64>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Attendance percentage for a student
    Attendance {
        #[arg(long)]
        student: i64,
        /// Restrict to one course instead of every enrolled course
        #[arg(long)]
        course: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Completion progress per enrolled course
    Completion {
        #[arg(long)]
        student: i64,
        /// Only these courses (repeatable)
        #[arg(long)]
        course: Vec<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Progress and attendance across a student's courses
    Student {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown at-risk report
    Report {
        #[arg(long)]
        class: Option<i64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Manage alerts
    Alerts {
        #[command(subcommand)]
        command: AlertCommands,
    },
    /// Manage classes and their members
    Classes {
        #[command(subcommand)]
        command: ClassCommands,
    },
}

#[derive(Subcommand)]
enum ClassCommands {
    /// List classes by name with member counts
    List {
        /// Only classes whose name contains this text
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Create a class
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a student to a class
    AddMember {
        #[arg(long)]
        class: i64,
        #[arg(long)]
        student: i64,
    },
    /// Remove a student from a class
    RemoveMember {
        #[arg(long)]
        class: i64,
        #[arg(long)]
        student: i64,
    },
}

#[derive(Subcommand)]
enum AlertCommands {
    /// List alerts, newest first
    List {
        #[arg(long, default_value = "active", conflicts_with = "any_status")]
        status: AlertStatus,
        /// Ignore the status filter
        #[arg(long)]
        any_status: bool,
        #[arg(long)]
        alert_type: Option<AlertType>,
        #[arg(long)]
        class: Option<i64>,
        /// Zero-based page number
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..))]
        page: i64,
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(i64).range(1..))]
        per_page: i64,
        #[arg(long)]
        json: bool,
    },
    /// Alert counts by status and type
    Stats,
    /// Mark an alert as acknowledged by the acting staff member
    Acknowledge { id: i64 },
    /// Mark an alert as resolved
    Resolve { id: i64 },
    /// Delete an alert
    Delete { id: i64 },
    /// Raise alerts for currently at-risk students
    Raise {
        #[arg(long)]
        class: Option<i64>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let thresholds = Thresholds::new(cli.inactivity_days, cli.completion_threshold)?;
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let ctx = RequestContext::new(cli.actor);
    let dashboard = Dashboard::new(pool.clone(), thresholds, cli.attendance_source);

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportParticipants { csv } => {
            let inserted = db::import_participants(&pool, &csv).await?;
            println!("Inserted {inserted} participants from {}.", csv.display());
        }
        Commands::AtRisk { class, limit, json } => {
            let entries = dashboard.at_risk(&ctx, class).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("No students at risk.");
                return Ok(());
            }

            println!("At-risk students ({}):", entries.len());
            for entry in entries.iter().take(limit) {
                let reasons: Vec<&str> = entry.reasons.iter().map(|r| r.as_str()).collect();
                println!(
                    "- {} ({}) {}",
                    entry.student.full_name(),
                    entry.student.email,
                    reasons.join(", ")
                );
            }
        }
        Commands::Attendance {
            student,
            course,
            json,
        } => {
            let value = dashboard.attendance(&ctx, student, course).await?;

            if json {
                println!("{}", serde_json::json!({ "student": student, "course": course, "attendance": value }));
            } else {
                match value {
                    Some(pct) => println!("Attendance: {pct}%"),
                    None => println!("Attendance: not available"),
                }
            }
        }
        Commands::Completion {
            student,
            course,
            json,
        } => {
            let records = dashboard.completion(student, &course).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }
            if records.is_empty() {
                println!("No active enrollments.");
                return Ok(());
            }

            for record in &records {
                let progress = record
                    .progress
                    .map(|p| format!("{:.0}%", p.value()))
                    .unwrap_or_else(|| "not tracked".to_string());
                let status = if record.completed { " (complete)" } else { "" };
                println!("- {} {}{}", record.course_name, progress, status);
            }
        }
        Commands::Student { id, json } => {
            let overview = dashboard.student_overview(&ctx, id).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
                return Ok(());
            }

            println!(
                "{} ({}): {} courses, average progress {}%, average attendance {}%",
                overview.student.full_name(),
                overview.student.email,
                overview.courses.len(),
                overview.average_progress,
                overview.average_attendance
            );
            for course in &overview.courses {
                let progress = course
                    .progress
                    .map(|p| format!("{:.0}%", p.value()))
                    .unwrap_or_else(|| "n/a".to_string());
                let attendance = course
                    .attendance
                    .map(|a| format!("{a}%"))
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "- {} progress {}, attendance {}",
                    course.course_name, progress, attendance
                );
            }
        }
        Commands::Report { class, out } => {
            let report = dashboard.report(&ctx, class).await?;
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Alerts { command } => run_alerts(&dashboard, &ctx, command).await?,
        Commands::Classes { command } => run_classes(&dashboard, &ctx, command).await?,
    }

    Ok(())
}

async fn run_alerts(
    dashboard: &Dashboard,
    ctx: &RequestContext,
    command: AlertCommands,
) -> anyhow::Result<()> {
    match command {
        AlertCommands::List {
            status,
            any_status,
            alert_type,
            class,
            page,
            per_page,
            json,
        } => {
            let filter = AlertFilter {
                alert_type,
                status: (!any_status).then_some(status),
                class_id: class,
            };
            let (alerts, total) = dashboard.list_alerts(&filter, page, per_page).await?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "total": total, "alerts": alerts }))?
                );
                return Ok(());
            }

            println!("Alerts ({total}):");
            for alert in &alerts {
                println!(
                    "- #{} {} ({}) {} [{}] {}",
                    alert.id,
                    alert.student_name,
                    alert.student_email,
                    alert.alert_type,
                    alert.status,
                    alert.details
                );
            }
        }
        AlertCommands::Stats => {
            let stats = dashboard.alert_stats().await?;
            println!(
                "active {}, acknowledged {}, resolved {}",
                stats.active, stats.acknowledged, stats.resolved
            );
            println!(
                "active by type: no_activity {}, no_completion {}, low_grade {}",
                stats.no_activity, stats.no_completion, stats.low_grade
            );
        }
        AlertCommands::Acknowledge { id } => {
            if ctx.actor_id.is_none() {
                anyhow::bail!("--actor is required to acknowledge an alert");
            }
            dashboard.acknowledge_alert(ctx, id).await?;
            println!("Alert {id} acknowledged.");
        }
        AlertCommands::Resolve { id } => {
            dashboard.resolve_alert(ctx, id).await?;
            println!("Alert {id} resolved.");
        }
        AlertCommands::Delete { id } => {
            dashboard.delete_alert(id).await?;
            println!("Alert {id} deleted.");
        }
        AlertCommands::Raise { class } => {
            let inserted = dashboard.raise_alerts(ctx, class).await?;
            println!(
                "Raised {inserted} alerts (inactive > {} days, completion < {}%).",
                dashboard.thresholds().inactivity_days(),
                dashboard.thresholds().completion_pct()
            );
        }
    }

    Ok(())
}

async fn run_classes(
    dashboard: &Dashboard,
    ctx: &RequestContext,
    command: ClassCommands,
) -> anyhow::Result<()> {
    match command {
        ClassCommands::List { search, json } => {
            let classes = dashboard.list_classes(search.as_deref()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&classes)?);
                return Ok(());
            }
            if classes.is_empty() {
                println!("No classes.");
                return Ok(());
            }

            for class in &classes {
                println!("- #{} {} ({} students)", class.id, class.name, class.member_count);
                if !class.description.is_empty() {
                    println!("  {}", class.description);
                }
            }
        }
        ClassCommands::Create { name, description } => {
            let class = NewClass::new(&name, description.as_deref())?;
            let id = dashboard.create_class(ctx, &class).await?;
            println!("Class {id} created.");
        }
        ClassCommands::AddMember { class, student } => {
            if dashboard.add_class_member(ctx, class, student).await? {
                println!("Student {student} added to class {class}.");
            } else {
                println!("Student {student} is already in class {class}.");
            }
        }
        ClassCommands::RemoveMember { class, student } => {
            dashboard.remove_class_member(ctx, class, student).await?;
            println!("Student {student} removed from class {class}.");
        }
    }

    Ok(())
}
