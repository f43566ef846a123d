//! 用户处理器

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use super::model::User;
use crate::app::AppState;
use crate::core::{error::CoreError, response::MessageResponse};

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, CoreError> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<User>, CoreError> {
    let user = state.user_service.get_user(&uuid).await?;
    Ok(Json(user))
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), CoreError> {
    let Json(body) = payload?;
    let user = state.user_service.create_user(&body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<User>, CoreError> {
    let Json(body) = payload?;
    let user = state.user_service.update_user(&uuid, &body).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<MessageResponse>, CoreError> {
    state.user_service.delete_user(&uuid).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}
