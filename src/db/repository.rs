use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{CreateTaskRequest, CreateUserRequest, Task, UpdateTaskRequest, User};

/// Unique-index failures on `users` become `Conflict`.
fn user_constraint_error(e: sqlx::Error) -> AppError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => AppError::Conflict(
            "A user with this email or provider identity already exists".to_string(),
        ),
        _ => AppError::Database(e),
    }
}

/// A task insert/update pointing at a nonexistent user trips the foreign key.
fn task_reference_error(e: sqlx::Error) -> AppError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_foreign_key_violation() => AppError::Validation(
            "createdById or assignedToId references an unknown user".to_string(),
        ),
        _ => AppError::Database(e),
    }
}

pub async fn fetch_tasks(db: &SqlitePool) -> Result<Vec<Task>, AppError> {
    let tasks = sqlx::query_as::<_, Task>(
        "SELECT id, title, description, due_date, status, created_by, assigned_to, created_at, updated_at, created_by_id, assigned_to_id FROM tasks ORDER BY id"
    )
    .fetch_all(db)
    .await?;
    Ok(tasks)
}

pub async fn find_task_by_id(db: &SqlitePool, id: i64) -> Result<Option<Task>, AppError> {
    let task = sqlx::query_as::<_, Task>(
        "SELECT id, title, description, due_date, status, created_by, assigned_to, created_at, updated_at, created_by_id, assigned_to_id FROM tasks WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(task)
}

/// Inserts a new task. `created_at` is the caller-supplied server time;
/// `updated_at` stays unset until the first update.
pub async fn insert_task(
    db: &SqlitePool,
    req: CreateTaskRequest,
    now: DateTime<Utc>,
) -> Result<Task, AppError> {
    let status = req.status.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO tasks
            (title, description, due_date, status, created_by, assigned_to,
            created_at, updated_at, created_by_id, assigned_to_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.due_date)
    .bind(status)
    .bind(&req.created_by)
    .bind(&req.assigned_to)
    .bind(now)
    .bind(req.created_by_id)
    .bind(req.assigned_to_id)
    .execute(db)
    .await
    .map_err(task_reference_error)?;

    Ok(Task {
        id: result.last_insert_rowid(),
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        status,
        created_by: req.created_by,
        assigned_to: req.assigned_to,
        created_at: now,
        updated_at: None,
        created_by_id: req.created_by_id,
        assigned_to_id: req.assigned_to_id,
    })
}

/// Full replacement of the mutable fields. `id` and `created_at` are never
/// touched; `updated_at` is set on every successful update, whether or not
/// any value changed. A single guarded UPDATE, so a row deleted concurrently
/// is reported as `None` rather than echoed back.
pub async fn update_task(
    db: &SqlitePool,
    id: i64,
    req: UpdateTaskRequest,
    now: DateTime<Utc>,
) -> Result<Option<Task>, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?,
            description = ?,
            due_date = ?,
            status = ?,
            created_by = ?,
            assigned_to = ?,
            updated_at = ?,
            created_by_id = ?,
            assigned_to_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.due_date)
    .bind(req.status)
    .bind(&req.created_by)
    .bind(&req.assigned_to)
    .bind(now)
    .bind(req.created_by_id)
    .bind(req.assigned_to_id)
    .bind(id)
    .execute(db)
    .await
    .map_err(task_reference_error)?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    find_task_by_id(db, id).await
}

pub async fn delete_task(db: &SqlitePool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_tasks(db: &SqlitePool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn fetch_users(db: &SqlitePool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, email, name, first_name, last_name, picture, provider, provider_id, created_at, last_login_at, is_active FROM users ORDER BY id"
    )
    .fetch_all(db)
    .await?;
    Ok(users)
}

pub async fn find_user_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, name, first_name, last_name, picture, provider, provider_id, created_at, last_login_at, is_active FROM users WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn insert_user(
    db: &SqlitePool,
    req: CreateUserRequest,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO users
            (email, name, first_name, last_name, picture, provider, provider_id,
            created_at, last_login_at, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, 1)
        "#,
    )
    .bind(&req.email)
    .bind(&req.name)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.picture)
    .bind(&req.provider)
    .bind(&req.provider_id)
    .bind(now)
    .execute(db)
    .await
    .map_err(user_constraint_error)?;

    Ok(User {
        id: result.last_insert_rowid(),
        email: req.email,
        name: req.name,
        first_name: req.first_name,
        last_name: req.last_name,
        picture: req.picture,
        provider: req.provider,
        provider_id: req.provider_id,
        created_at: now,
        last_login_at: None,
        is_active: true,
    })
}

/// Restrict-on-delete: a user referenced by any task cannot be removed. The
/// reference count pre-check produces the semantic error; the foreign key
/// constraint still backstops the window between check and delete.
pub async fn delete_user(db: &SqlitePool, id: i64) -> Result<bool, AppError> {
    let referenced: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE created_by_id = ? OR assigned_to_id = ?",
    )
    .bind(id)
    .bind(id)
    .fetch_one(db)
    .await?;

    if referenced > 0 {
        return Err(AppError::ReferentialIntegrity(format!(
            "User {id} is referenced by {referenced} task(s) and cannot be deleted"
        )));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_foreign_key_violation() => AppError::ReferentialIntegrity(
                format!("User {id} is referenced by existing tasks and cannot be deleted"),
            ),
            _ => AppError::Database(e),
        })?;

    Ok(result.rows_affected() > 0)
}

/// Records a successful authentication. Returns false for an unknown id.
pub async fn touch_last_login(
    db: &SqlitePool,
    id: i64,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    async fn setup_test_db() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn task_request(title: &str, created_by: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: String::new(),
            due_date: None,
            status: None,
            created_by: created_by.to_string(),
            assigned_to: String::new(),
            created_by_id: None,
            assigned_to_id: None,
        }
    }

    fn user_request(email: &str, provider_id: Option<&str>) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            name: "Test User".to_string(),
            first_name: None,
            last_name: None,
            picture: None,
            provider: "Local".to_string(),
            provider_id: provider_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_task() {
        let pool = setup_test_db().await;

        let task = insert_task(&pool, task_request("Write docs", "Alice"), Utc::now())
            .await
            .expect("Failed to insert task");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.updated_at.is_none());

        let tasks = fetch_tasks(&pool).await.expect("Failed to fetch tasks");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, task.id);
        assert_eq!(tasks[0].title, "Write docs");
        assert_eq!(tasks[0].created_at, task.created_at);
    }

    #[tokio::test]
    async fn test_update_task_replaces_fields_and_sets_updated_at() {
        let pool = setup_test_db().await;

        let task = insert_task(&pool, task_request("Write docs", "Alice"), Utc::now())
            .await
            .expect("Failed to insert task");

        let req = UpdateTaskRequest {
            title: "Write better docs".to_string(),
            description: "with examples".to_string(),
            due_date: None,
            status: TaskStatus::Done,
            created_by: "Alice".to_string(),
            assigned_to: "Bob".to_string(),
            created_by_id: None,
            assigned_to_id: None,
        };
        let updated = update_task(&pool, task.id, req, Utc::now())
            .await
            .expect("Failed to update task")
            .expect("Task not found");

        assert_eq!(updated.title, "Write better docs");
        assert_eq!(updated.status, TaskStatus::Done);
        assert_eq!(updated.created_at, task.created_at);
        let updated_at = updated.updated_at.expect("updated_at should be set");
        assert!(updated_at >= updated.created_at);

        let reloaded = find_task_by_id(&pool, task.id)
            .await
            .expect("Failed to reload task")
            .expect("Task not found");
        assert_eq!(reloaded.status, TaskStatus::Done);
        assert_eq!(reloaded.assigned_to, "Bob");
        assert!(reloaded.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_unknown_task_creates_nothing() {
        let pool = setup_test_db().await;

        let req = UpdateTaskRequest {
            title: "Ghost".to_string(),
            description: String::new(),
            due_date: None,
            status: TaskStatus::Pending,
            created_by: "Nobody".to_string(),
            assigned_to: String::new(),
            created_by_id: None,
            assigned_to_id: None,
        };
        let result = update_task(&pool, 999, req, Utc::now())
            .await
            .expect("Update should not fail");
        assert!(result.is_none());
        assert_eq!(count_tasks(&pool).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_update_after_delete_returns_none() {
        let pool = setup_test_db().await;

        let task = insert_task(&pool, task_request("Short lived", "Alice"), Utc::now())
            .await
            .expect("Failed to insert task");
        assert!(delete_task(&pool, task.id).await.expect("delete"));

        let req = UpdateTaskRequest {
            title: "Stale".to_string(),
            description: String::new(),
            due_date: None,
            status: TaskStatus::Done,
            created_by: "Alice".to_string(),
            assigned_to: String::new(),
            created_by_id: None,
            assigned_to_id: None,
        };
        let result = update_task(&pool, task.id, req, Utc::now())
            .await
            .expect("Update should not fail");
        assert!(result.is_none());
        assert_eq!(count_tasks(&pool).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_delete_task() {
        let pool = setup_test_db().await;

        let task = insert_task(&pool, task_request("Temp", "Alice"), Utc::now())
            .await
            .expect("Failed to insert task");

        assert!(delete_task(&pool, task.id).await.expect("delete"));
        assert!(!delete_task(&pool, task.id).await.expect("second delete"));
        assert!(
            find_task_by_id(&pool, task.id)
                .await
                .expect("lookup")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_task_with_unknown_user_reference_rejected() {
        let pool = setup_test_db().await;

        let mut req = task_request("Linked", "Alice");
        req.created_by_id = Some(123);
        let err = insert_task(&pool, req, Utc::now())
            .await
            .expect_err("Insert should fail");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let pool = setup_test_db().await;

        insert_user(&pool, user_request("a@x.com", None), Utc::now())
            .await
            .expect("First insert should succeed");
        let err = insert_user(&pool, user_request("a@x.com", None), Utc::now())
            .await
            .expect_err("Second insert should conflict");
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_provider_identity_unique_only_when_present() {
        let pool = setup_test_db().await;

        // Two local users without provider ids are fine.
        insert_user(&pool, user_request("a@x.com", None), Utc::now())
            .await
            .expect("First local user");
        insert_user(&pool, user_request("b@x.com", None), Utc::now())
            .await
            .expect("Second local user");

        insert_user(&pool, user_request("c@x.com", Some("sub-1")), Utc::now())
            .await
            .expect("First provider identity");
        let err = insert_user(&pool, user_request("d@x.com", Some("sub-1")), Utc::now())
            .await
            .expect_err("Duplicate provider identity should conflict");
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_referenced_user_restricted() {
        let pool = setup_test_db().await;

        let user = insert_user(&pool, user_request("a@x.com", None), Utc::now())
            .await
            .expect("Failed to insert user");
        let mut req = task_request("Linked", "Alice");
        req.created_by_id = Some(user.id);
        let task = insert_task(&pool, req, Utc::now())
            .await
            .expect("Failed to insert task");

        let err = delete_user(&pool, user.id)
            .await
            .expect_err("Delete should be restricted");
        assert!(matches!(err, AppError::ReferentialIntegrity(_)));

        // Both rows unchanged.
        assert!(
            find_user_by_id(&pool, user.id)
                .await
                .expect("lookup")
                .is_some()
        );
        assert!(
            find_task_by_id(&pool, task.id)
                .await
                .expect("lookup")
                .is_some()
        );

        // Removing the reference unblocks the delete.
        assert!(delete_task(&pool, task.id).await.expect("delete task"));
        assert!(delete_user(&pool, user.id).await.expect("delete user"));
    }

    #[tokio::test]
    async fn test_touch_last_login() {
        let pool = setup_test_db().await;

        let user = insert_user(&pool, user_request("a@x.com", None), Utc::now())
            .await
            .expect("Failed to insert user");
        assert!(user.last_login_at.is_none());

        assert!(
            touch_last_login(&pool, user.id, Utc::now())
                .await
                .expect("touch")
        );
        let reloaded = find_user_by_id(&pool, user.id)
            .await
            .expect("lookup")
            .expect("User not found");
        assert!(reloaded.last_login_at.is_some());

        assert!(!touch_last_login(&pool, 999, Utc::now()).await.expect("touch unknown"));
    }
}
