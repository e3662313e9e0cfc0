//! Authentication Handlers
//!
//! Registration with email verification, then a two-step login:
//! password check issues a one-time passcode, passcode check issues the JWT.

use std::time::Duration;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{UserCreate, UserResponse};
use crate::db::repository::UserRepository;
use crate::email::{otp_email, verification_email};
use crate::security_log;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// Fixed delay for authentication to slow down credential stuffing
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// Verification links die after this many hours
const VERIFICATION_TTL_HOURS: i64 = 1;

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub requires_otp: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub token: String,
    pub user: UserResponse,
    pub redirect_url: String,
}

/// Register handler
///
/// Creates an unverified account and emails a verification link.
/// No session is issued until the email is verified and OTP login completes.
pub async fn register(
    State(state): State<ServerState>,
    Json(mut data): Json<UserCreate>,
) -> AppResult<(StatusCode, Json<AppResponse<UserResponse>>)> {
    data.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    // Self-service accounts are always clients; roles are assigned by admins
    data.role = None;

    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now() + chrono::Duration::hours(VERIFICATION_TTL_HOURS);

    let repo = UserRepository::new(state.get_db());
    let user = repo.create(data, Some((token.clone(), expires_at))).await?;

    // Delivery failures stay server-side; the account exists either way and
    // the client response must not leak mailer state
    let mail = verification_email(&user.email, &state.config.public_base_url, &token);
    if let Err(e) = state.mailer.send(mail).await {
        tracing::warn!(email = %user.email, error = %e, "Failed to send verification email");
    }

    tracing::info!(email = %user.email, "User registered, verification pending");

    Ok((
        StatusCode::CREATED,
        ok_with_message(
            UserResponse::from(user),
            "Registration successful, check your email to verify the account",
        ),
    ))
}

/// Verify-email handler
///
/// Consumes the emailed token: marks the account verified and clears both
/// token fields, so a second visit with the same link fails.
pub async fn verify_email(
    State(state): State<ServerState>,
    Query(query): Query<VerifyEmailQuery>,
) -> AppResult<Json<AppResponse<UserResponse>>> {
    let repo = UserRepository::new(state.get_db());

    let user = repo
        .find_by_verification_token(&query.token)
        .await?
        .ok_or_else(|| AppError::invalid("Verification link is invalid or has expired"))?;

    // Expiry is checked lazily, when the token is presented
    if let Some(expires_at) = user.verification_expires_at
        && Utc::now() >= expires_at
    {
        security_log!("WARN", "verification_token_expired", email = user.email.clone());
        return Err(AppError::invalid(
            "Verification link is invalid or has expired",
        ));
    }

    let id = user.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
    let verified = repo.mark_verified(&id).await?;

    tracing::info!(email = %verified.email, "Email verified");

    Ok(ok_with_message(
        UserResponse::from(verified),
        "Email verified, you can now log in",
    ))
}

/// Login handler (step 1 of 2)
///
/// Checks credentials and, when the account is verified, issues a one-time
/// passcode by email. The session token is only issued by [`verify_otp`].
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AppResponse<LoginResponse>>> {
    let repo = UserRepository::new(state.get_db());
    let user = repo.find_by_email(&req.email).await?;

    // Fixed delay before acting on the lookup result
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let user = match user {
        Some(u) => u,
        None => {
            security_log!("WARN", "login_unknown_email", email = req.email.clone());
            return Err(AppError::not_found("Account"));
        }
    };

    let password_valid = user
        .verify_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

    if !password_valid {
        security_log!("WARN", "login_bad_password", email = req.email.clone());
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_verified {
        return Err(AppError::EmailNotVerified);
    }

    let code = state.otp.issue(&user.email)?;

    if let Err(e) = state.mailer.send(otp_email(&user.email, &code)).await {
        tracing::warn!(email = %user.email, error = %e, "Failed to send OTP email");
    }

    tracing::info!(email = %user.email, "Credentials accepted, OTP issued");

    Ok(ok_with_message(
        LoginResponse { requires_otp: true },
        "A one-time passcode has been sent to your email",
    ))
}

/// Verify-OTP handler (step 2 of 2)
///
/// Consumes the pending passcode and issues the signed session token plus a
/// role-based landing page hint.
pub async fn verify_otp(
    State(state): State<ServerState>,
    Json(req): Json<VerifyOtpRequest>,
) -> AppResult<Json<AppResponse<VerifyOtpResponse>>> {
    state.otp.verify(&req.email, &req.otp)?;

    let repo = UserRepository::new(state.get_db());
    let user = repo
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    let user_id = user.id.as_ref().map(|t| t.to_string()).unwrap_or_default();

    let token = state
        .get_jwt_service()
        .generate_token(&user_id, &user.name, &user.email, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    let redirect_url = user.role.redirect_url().to_string();

    tracing::info!(user_id = %user_id, email = %user.email, "User logged in");

    Ok(ok(VerifyOtpResponse {
        token,
        user: UserResponse::from(user),
        redirect_url,
    }))
}

/// Get current user info
///
/// Reads fresh account data so a role change or deletion takes effect
/// without waiting for token expiry.
pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<UserResponse>>> {
    let repo = UserRepository::new(state.get_db());
    let fresh = repo
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    Ok(ok(UserResponse::from(fresh)))
}
