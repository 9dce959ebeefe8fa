use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, LogoutResponse, PublicUser, RefreshRequest, RegisterRequest},
        extractors::AuthUser,
        repo_types::User,
        services::{
            hash_password, is_valid_username, normalize_username, verify_password, JwtKeys,
            MIN_PASSWORD_LEN,
        },
    },
    error::ApiError,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Opens a session for `user` and signs its token pair.
async fn start_session(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let session_id = state
        .store
        .create_session(user.id)
        .await
        .map_err(ApiError::internal("Database error while creating session"))?;

    let keys = JwtKeys::from_ref(state);
    let (access_token, refresh_token) = keys
        .sign_pair(user.id, session_id)
        .map_err(ApiError::internal("Could not issue tokens"))?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload?;
    let username = normalize_username(&payload.username);

    if !is_valid_username(&username) {
        warn!(%username, "invalid username");
        return Err(ApiError::validation(
            "Username must be 3-32 characters of letters, digits, '.', '_' or '-'.",
        ));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LEN
        )));
    }

    if let Some(confirm) = &payload.confirm_password {
        if confirm != &payload.password {
            return Err(ApiError::validation("Passwords do not match."));
        }
    }

    // Ensure username is not taken
    let existing = state
        .store
        .find_user_by_username(&username)
        .await
        .map_err(ApiError::internal("Database error during registration"))?;
    if existing.is_some() {
        warn!(%username, "username already registered");
        return Err(ApiError::Conflict("Username already exists.".into()));
    }

    let hash = hash_password(&payload.password)
        .map_err(ApiError::internal("Could not hash password"))?;

    let user = state
        .store
        .create_user(&username, &hash)
        .await
        .map_err(ApiError::internal("Database error during registration"))?
        .ok_or_else(|| ApiError::Conflict("Username already exists.".into()))?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    let body = start_session(&state, user).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;
    let username = normalize_username(&payload.username);

    let user = match state.store.find_user_by_username(&username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%username, "login unknown username");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
        Err(e) => return Err(ApiError::internal("Database error during login")(e)),
    };

    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(ApiError::internal("Could not verify password"))?;

    if !ok {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(start_session(&state, user).await?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let active = state
        .store
        .is_session_active(claims.sid, claims.sub)
        .await
        .map_err(ApiError::internal("Database error while checking session"))?;
    if !active {
        return Err(ApiError::unauthorized("Session has ended, please log in again"));
    }

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await
        .map_err(ApiError::internal("Database error while loading user"))?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    // Issue new pair for the same session
    let (access_token, refresh_token) = keys
        .sign_pair(user.id, claims.sid)
        .map_err(ApiError::internal("Could not issue tokens"))?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<LogoutResponse>, ApiError> {
    state
        .store
        .revoke_session(auth.session_id, auth.user_id)
        .await
        .map_err(ApiError::internal("Database error during logout"))?;

    info!(user_id = %auth.user_id, session_id = %auth.session_id, "user logged out");
    Ok(Json(LogoutResponse {
        message: "You have been logged out.".into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await
        .map_err(ApiError::internal("Database error while loading user"))?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn test_me_response_serialization() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            username: "barista".to_string(),
            currency_code: "EUR".to_string(),
            currency_symbol: "€".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("barista"));
        assert!(json.contains("currency_symbol"));
        assert!(!json.contains("password"));
    }
}
