use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{
        ApiResponse, CreateUser, Empty, NewUser, Rol, UpdateUser, UserChanges, UserResponse,
        UserSession,
    },
    utils::hash_password,
    AppState,
};

const ADMIN: &[Rol] = &[Rol::Administrador];

fn usuario_no_encontrado() -> AppError {
    AppError::not_found("Usuario no encontrado")
}

pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<UserResponse>>>> {
    user.require(ADMIN)?;

    let users = state.store.list_users().await?;
    Ok(Json(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect(),
    )))
}

pub async fn get_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    user.require(ADMIN)?;

    let found = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(usuario_no_encontrado)?;
    Ok(Json(ApiResponse::ok(found.into())))
}

pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserSession>>)> {
    user.require(ADMIN)?;
    let Json(input) = payload?;
    let input = input.normalize()?;

    let password_hash = hash_password(&input.password, state.config.bcrypt_cost)?;
    let created = state
        .store
        .insert_user(NewUser {
            id: Uuid::new_v4(),
            nombre: input.nombre,
            email: input.email,
            password_hash,
            rol: input.rol.unwrap_or_default(),
            activo: input.activo.unwrap_or(true),
        })
        .await?;

    log::info!("User {} created by {}", created.email, user.email);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserSession::from(&created))),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateUser>, JsonRejection>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    user.require(ADMIN)?;
    let Json(input) = payload?;
    let input = input.normalize()?;

    let password_hash = input
        .password
        .as_deref()
        .map(|p| hash_password(p, state.config.bcrypt_cost))
        .transpose()?;

    let updated = state
        .store
        .update_user(id, UserChanges::new(input, password_hash))
        .await?
        .ok_or_else(usuario_no_encontrado)?;
    Ok(Json(ApiResponse::ok(updated.into())))
}

pub async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    user.require(ADMIN)?;

    if id == user.id {
        return Err(AppError::validation("No puedes eliminar tu propia cuenta"));
    }
    if !state.store.delete_user(id).await? {
        return Err(usuario_no_encontrado());
    }

    log::info!("User {} deleted by {}", id, user.email);
    Ok(Json(ApiResponse::ok(Empty {})))
}
