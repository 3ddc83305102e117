use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{CreateTaskRequest, Task, UpdateTaskRequest};

pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 1000;
pub const NAME_MAX: usize = 100;

/// Explicit validation, invoked before any mutation is committed. Title and
/// author are required; all four text fields are length-bounded.
fn validate_fields(
    title: &str,
    description: &str,
    created_by: &str,
    assigned_to: &str,
) -> Result<(), AppError> {
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(AppError::Validation(format!(
            "title must be at most {TITLE_MAX} characters"
        )));
    }
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(AppError::Validation(format!(
            "description must be at most {DESCRIPTION_MAX} characters"
        )));
    }
    if created_by.is_empty() {
        return Err(AppError::Validation("createdBy is required".to_string()));
    }
    if created_by.chars().count() > NAME_MAX {
        return Err(AppError::Validation(format!(
            "createdBy must be at most {NAME_MAX} characters"
        )));
    }
    if assigned_to.chars().count() > NAME_MAX {
        return Err(AppError::Validation(format!(
            "assignedTo must be at most {NAME_MAX} characters"
        )));
    }
    Ok(())
}

pub async fn list_tasks(db: &SqlitePool) -> Result<Vec<Task>, AppError> {
    repository::fetch_tasks(db).await
}

pub async fn get_task(db: &SqlitePool, id: i64) -> Result<Task, AppError> {
    repository::find_task_by_id(db, id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn create_task(db: &SqlitePool, req: CreateTaskRequest) -> Result<Task, AppError> {
    validate_fields(&req.title, &req.description, &req.created_by, &req.assigned_to)?;
    repository::insert_task(db, req, Utc::now()).await
}

pub async fn update_task(
    db: &SqlitePool,
    id: i64,
    req: UpdateTaskRequest,
) -> Result<Task, AppError> {
    validate_fields(&req.title, &req.description, &req.created_by, &req.assigned_to)?;
    repository::update_task(db, id, req, Utc::now())
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn delete_task(db: &SqlitePool, id: i64) -> Result<(), AppError> {
    if repository::delete_task(db, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}
