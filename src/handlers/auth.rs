use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{CreateUser, LoginRequest, LoginResponse, NewUser, RegisterRequest, Rol, User},
    utils::{create_token, hash_password, verify_password},
    AppState,
};

const CREDENCIALES_INVALIDAS: &str = "Credenciales inválidas";

fn session(state: &AppState, user: &User) -> AppResult<LoginResponse> {
    let token = create_token(
        user.id,
        user.rol,
        &state.config.jwt_secret,
        state.config.token_ttl_days,
    )?;

    Ok(LoginResponse {
        success: true,
        token,
        usuario: user.into(),
    })
}

// Handler to exchange credentials for a token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    let email = req.email.trim().to_lowercase();

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::unauthorized(CREDENCIALES_INVALIDAS))?;

    if !verify_password(&req.password, &user.password_hash)? {
        log::info!("Failed login for {}", email);
        return Err(AppError::unauthorized(CREDENCIALES_INVALIDAS));
    }
    if !user.activo {
        log::info!("Login attempt on inactive account {}", email);
        return Err(AppError::unauthorized(CREDENCIALES_INVALIDAS));
    }

    state.store.record_access(user.id, Utc::now()).await?;

    Ok(Json(session(&state, &user)?))
}

// Handler for self-registration; new accounts are always sellers
pub async fn registro(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    let Json(req) = payload?;
    let input = CreateUser::from(req).normalize()?;

    if state.store.find_user_by_email(&input.email).await?.is_some() {
        return Err(AppError::validation("El email ya está registrado"));
    }

    let password_hash = hash_password(&input.password, state.config.bcrypt_cost)?;
    let user = state
        .store
        .insert_user(NewUser {
            id: Uuid::new_v4(),
            nombre: input.nombre,
            email: input.email,
            password_hash,
            rol: Rol::Vendedor,
            activo: true,
        })
        .await?;

    log::info!("Registered seller {}", user.email);
    Ok((StatusCode::CREATED, Json(session(&state, &user)?)))
}
