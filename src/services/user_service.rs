use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{CreateUserRequest, User};

pub const EMAIL_MAX: usize = 100;
pub const NAME_MAX: usize = 100;
pub const PROVIDER_MAX: usize = 50;
pub const PROVIDER_ID_MAX: usize = 200;
pub const PICTURE_MAX: usize = 500;

fn validate_request(req: &CreateUserRequest) -> Result<(), AppError> {
    if req.email.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    if req.email.chars().count() > EMAIL_MAX {
        return Err(AppError::Validation(format!(
            "email must be at most {EMAIL_MAX} characters"
        )));
    }
    if req.name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if req.name.chars().count() > NAME_MAX {
        return Err(AppError::Validation(format!(
            "name must be at most {NAME_MAX} characters"
        )));
    }
    for (field, value, max) in [
        ("firstName", &req.first_name, NAME_MAX),
        ("lastName", &req.last_name, NAME_MAX),
        ("picture", &req.picture, PICTURE_MAX),
        ("providerId", &req.provider_id, PROVIDER_ID_MAX),
    ] {
        if let Some(value) = value {
            if value.chars().count() > max {
                return Err(AppError::Validation(format!(
                    "{field} must be at most {max} characters"
                )));
            }
        }
    }
    if req.provider.is_empty() {
        return Err(AppError::Validation("provider is required".to_string()));
    }
    if req.provider.chars().count() > PROVIDER_MAX {
        return Err(AppError::Validation(format!(
            "provider must be at most {PROVIDER_MAX} characters"
        )));
    }
    Ok(())
}

pub async fn list_users(db: &SqlitePool) -> Result<Vec<User>, AppError> {
    repository::fetch_users(db).await
}

pub async fn get_user(db: &SqlitePool, id: i64) -> Result<User, AppError> {
    repository::find_user_by_id(db, id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn create_user(db: &SqlitePool, req: CreateUserRequest) -> Result<User, AppError> {
    validate_request(&req)?;
    repository::insert_user(db, req, Utc::now()).await
}

pub async fn delete_user(db: &SqlitePool, id: i64) -> Result<(), AppError> {
    if repository::delete_user(db, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

/// Stamps `last_login_at` after a successful authentication. Token issuance
/// itself happens at the identity provider, outside this service.
pub async fn record_login(db: &SqlitePool, id: i64) -> Result<(), AppError> {
    if repository::touch_last_login(db, id, Utc::now()).await? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}
