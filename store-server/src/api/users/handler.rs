//! User Administration Handlers
//!
//! Admin-managed accounts plus the two self-service cases: an account owner
//! may view their own record and update their own name.

use axum::Json;
use axum::extract::{Path, State};
use validator::Validate;

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{UserCreate, UserResponse, UserUpdate};
use crate::db::repository::UserRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// List all users (admin)
pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<UserResponse>>>> {
    let repo = UserRepository::new(state.get_db());
    let users = repo.find_all().await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(ok(users))
}

/// Get user by id (admin or the account owner)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<UserResponse>>> {
    if !user.is_admin() && user.id != id {
        return Err(AppError::forbidden("You can only view your own account"));
    }

    let repo = UserRepository::new(state.get_db());
    let found = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", id)))?;

    Ok(ok(UserResponse::from(found)))
}

/// Create a new user (admin)
///
/// Admin-created accounts skip email verification entirely.
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(data): Json<UserCreate>,
) -> AppResult<Json<AppResponse<UserResponse>>> {
    data.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = UserRepository::new(state.get_db());
    let created = repo.create(data, None).await?;

    let id = created.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
    if let Err(e) = state.audit.record(
        AuditAction::UserCreated,
        user.email.clone(),
        id.clone(),
        format!(
            "Created {} account for '{}'",
            created.role.as_str(),
            created.email
        ),
    ) {
        tracing::warn!(error = %e, "Audit entry dropped");
    }

    tracing::info!(user_id = %id, email = %created.email, "User created by admin");

    Ok(ok(UserResponse::from(created)))
}

/// Update a user (admin: name and role; owner: name only)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(data): Json<UserUpdate>,
) -> AppResult<Json<AppResponse<UserResponse>>> {
    if !user.is_admin() {
        if user.id != id {
            return Err(AppError::forbidden("You can only update your own account"));
        }
        if data.role.is_some() {
            return Err(AppError::forbidden("Only admins can change roles"));
        }
    }

    data.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let mut changed: Vec<&str> = Vec::new();
    if data.name.is_some() {
        changed.push("name");
    }
    if data.role.is_some() {
        changed.push("role");
    }

    let repo = UserRepository::new(state.get_db());
    let updated = repo.update(&id, data).await?;

    if !changed.is_empty()
        && let Err(e) = state.audit.record(
            AuditAction::UserUpdated,
            user.email.clone(),
            id.clone(),
            format!("Updated {} of '{}'", changed.join(", "), updated.email),
        )
    {
        tracing::warn!(error = %e, "Audit entry dropped");
    }

    Ok(ok(UserResponse::from(updated)))
}

/// Delete a user (admin, never the acting account)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    // Deleting yourself is how the last admin gets locked out
    if user.id == id {
        return Err(AppError::forbidden("Cannot delete your own account"));
    }

    let repo = UserRepository::new(state.get_db());
    let deleted = repo.delete(&id).await?;

    if let Err(e) = state.audit.record(
        AuditAction::UserDeleted,
        user.email.clone(),
        id.clone(),
        "Deleted account".to_string(),
    ) {
        tracing::warn!(error = %e, "Audit entry dropped");
    }

    tracing::info!(user_id = %id, deleted_by = %user.email, "User deleted");

    Ok(ok(deleted))
}
