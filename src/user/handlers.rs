//! Profile Handlers
//!
//! Read, partial update, and deletion of the authenticated account. Every
//! route here sits behind the session gate; the identity comes from the
//! [`CurrentUser`] extractor, never from request fields.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::middleware::{removal_cookie, CurrentUser};
use crate::auth::password;
use crate::avatar::{sniff_image, ImageKind};
use crate::error::AppError;
use crate::observability::SecurityEvent;
use crate::router::AppState;
use crate::security_event;
use crate::store::{AccountUpdate, StoreError};
use crate::validation::{validate_max_length, ValidationErrors};

/// Profile payload returned to the account owner.
///
/// The password hash never appears here.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// GET /api/user/profile - the authenticated account
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let account = state
        .store
        .find_by_id(user.0)
        .await
        .map_err(|e| AppError::internal(e.to_string()))?
        .ok_or_else(|| AppError::not_found("User not found."))?;

    Ok(Json(ProfileResponse {
        id: account.id,
        username: account.username,
        avatar: account.avatar,
        created_at: account.created_at,
        updated_at: account.updated_at,
    }))
}

/// PATCH /api/user/profile/update - partial update
///
/// Multipart form with `username`, `password`, and `avatar` fields, each
/// independently optional; empty text fields count as absent. The avatar is
/// sniffed by content before anything is stored, and a provided password is
/// re-hashed so the store only ever sees PHC strings.
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<StatusCode, AppError> {
    let mut username: Option<String> = None;
    let mut password_plain: Option<String> = None;
    let mut avatar_upload: Option<(ImageKind, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("Invalid request body."))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("username") => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Invalid request body."))?;
                if !value.is_empty() {
                    username = Some(value);
                }
            }
            Some("password") => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Invalid request body."))?;
                if !value.is_empty() {
                    password_plain = Some(value);
                }
            }
            Some("avatar") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::bad_request("Invalid request body."))?;
                if data.is_empty() {
                    continue;
                }
                let kind = sniff_image(&data).ok_or_else(|| {
                    AppError::unsupported("Only image file are allowed (jpeg/png).")
                })?;
                avatar_upload = Some((kind, data));
            }
            _ => {}
        }
    }

    let mut errors = ValidationErrors::new();
    if let Some(ref value) = username {
        errors.check(validate_max_length(value, 30, "username"));
    }
    if let Some(ref value) = password_plain {
        errors.check(validate_max_length(value, 100, "password"));
    }
    errors.into_result()?;

    let mut update = AccountUpdate {
        username,
        ..Default::default()
    };

    if let Some(plain) = password_plain {
        update.password_hash =
            Some(password::hash(&plain).map_err(|e| AppError::internal(e.to_string()))?);
    }

    if let Some((kind, data)) = avatar_upload {
        let url = state
            .avatars
            .store(user.0, kind, data)
            .await
            .map_err(|e| AppError::internal(e.to_string()))?;
        update.avatar = Some(url);
    }

    if !update.is_empty() {
        state.store.update(user.0, update).await.map_err(|e| match e {
            StoreError::NotFound => AppError::not_found("User not found."),
            StoreError::Conflict => AppError::conflict("Username already taken."),
            other => AppError::internal(other.to_string()),
        })?;

        security_event!(
            SecurityEvent::UserModified,
            user_id = %user.0,
            "Account updated"
        );
    }

    Ok(StatusCode::OK)
}

/// DELETE /api/user/profile/delete - remove the account and end the session
///
/// The cookie invalidation mirrors signout; the session token held by the
/// client keeps verifying until expiry, but its subject no longer resolves
/// to an account.
pub async fn delete_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AppError> {
    state.store.delete(user.0).await.map_err(|e| match e {
        StoreError::NotFound => AppError::not_found("User not found."),
        other => AppError::internal(other.to_string()),
    })?;

    security_event!(
        SecurityEvent::UserDeleted,
        user_id = %user.0,
        "Account deleted"
    );
    security_event!(
        SecurityEvent::SessionDestroyed,
        user_id = %user.0,
        "Session cookie cleared"
    );

    Ok((jar.add(removal_cookie(state.config.production)), StatusCode::OK))
}
