use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Rol, User},
    utils::verify_token,
    AppState,
};

const NO_AUTORIZADO: &str = "No autorizado para acceder a esta ruta";

/// Authenticated caller, reloaded from the store on every request so role
/// and status changes apply without reissuing tokens.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub nombre: String,
    pub email: String,
    pub rol: Rol,
}

impl CurrentUser {
    /// Rejects the request with 403 unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Rol]) -> Result<(), AppError> {
        if roles.contains(&self.rol) {
            Ok(())
        } else {
            log::warn!("User {} ({:?}) denied, needs one of {:?}", self.id, self.rol, roles);
            Err(AppError::forbidden())
        }
    }

    pub fn is_admin(&self) -> bool {
        self.rol == Rol::Administrador
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nombre: user.nombre,
            email: user.email,
            rol: user.rol,
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| AppError::unauthorized(NO_AUTORIZADO))?;

        let claims = verify_token(token, &state.config.jwt_secret).map_err(|e| {
            log::debug!("Rejected token: {}", e);
            AppError::unauthorized("Token inválido")
        })?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| AppError::unauthorized("Token inválido"))?;

        match state.store.get_user(user_id).await? {
            Some(user) if user.activo => Ok(user.into()),
            _ => Err(AppError::unauthorized(NO_AUTORIZADO)),
        }
    }
}
