use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::TaskStatus;

struct SeedTask {
    title: &'static str,
    description: &'static str,
    created_by: &'static str,
    assigned_to: &'static str,
    status: TaskStatus,
    due_in_days: i64,
    created_days_ago: i64,
    updated_days_ago: Option<i64>,
}

const SAMPLE_TASKS: [SeedTask; 5] = [
    SeedTask {
        title: "Complete API Documentation",
        description: "Write comprehensive documentation for the task manager API including all endpoints and examples",
        created_by: "John Developer",
        assigned_to: "Tech Lead",
        status: TaskStatus::InProgress,
        due_in_days: 7,
        created_days_ago: 5,
        updated_days_ago: None,
    },
    SeedTask {
        title: "Design Database Schema",
        description: "Create and review the database schema for the task management system",
        created_by: "Sarah Architect",
        assigned_to: "Database Team",
        status: TaskStatus::Done,
        due_in_days: -2,
        created_days_ago: 10,
        updated_days_ago: Some(2),
    },
    SeedTask {
        title: "Implement User Authentication",
        description: "Add JWT-based authentication and authorization to the API",
        created_by: "Mike Security",
        assigned_to: "Security Team",
        status: TaskStatus::Pending,
        due_in_days: 14,
        created_days_ago: 3,
        updated_days_ago: None,
    },
    SeedTask {
        title: "Create Frontend Dashboard",
        description: "Build a React-based dashboard for task management with real-time updates",
        created_by: "Lisa Frontend",
        assigned_to: "UI/UX Team",
        status: TaskStatus::Pending,
        due_in_days: 21,
        created_days_ago: 1,
        updated_days_ago: None,
    },
    SeedTask {
        title: "Setup CI/CD Pipeline",
        description: "Configure automated testing and deployment pipeline using GitHub Actions",
        created_by: "DevOps Team",
        assigned_to: "DevOps Team",
        status: TaskStatus::InProgress,
        due_in_days: 5,
        created_days_ago: 7,
        updated_days_ago: Some(1),
    },
];

/// First-boot convenience: inserts the illustrative sample tasks when the
/// tasks table is empty. Returns the number of rows inserted.
pub async fn seed_if_empty(db: &SqlitePool) -> Result<usize, AppError> {
    if repository::count_tasks(db).await? > 0 {
        return Ok(0);
    }

    let now = Utc::now();
    for sample in &SAMPLE_TASKS {
        sqlx::query(
            r#"
            INSERT INTO tasks
                (title, description, due_date, status, created_by, assigned_to,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sample.title)
        .bind(sample.description)
        .bind(now + Duration::days(sample.due_in_days))
        .bind(sample.status)
        .bind(sample.created_by)
        .bind(sample.assigned_to)
        .bind(now - Duration::days(sample.created_days_ago))
        .bind(sample.updated_days_ago.map(|days| now - Duration::days(days)))
        .execute(db)
        .await?;
    }

    info!("seeded {} sample tasks", SAMPLE_TASKS.len());
    Ok(SAMPLE_TASKS.len())
}
