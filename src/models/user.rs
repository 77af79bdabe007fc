use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{bounded, max_monto, required};
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rol_usuario", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Administrador,
    #[default]
    Vendedor,
    Supervisor,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub nombre: String,
    pub email: String,
    pub password_hash: String,
    pub rol: Rol,
    pub activo: bool,
    pub ventas: i64,
    pub monto_total: Decimal,
    pub ultimo_acceso: Option<DateTime<Utc>>,
    pub fecha_creacion: DateTime<Utc>,
}

/// User as exposed over the API, without the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub nombre: String,
    pub email: String,
    pub rol: Rol,
    pub activo: bool,
    pub ventas: i64,
    pub monto_total: Decimal,
    pub ultimo_acceso: Option<DateTime<Utc>>,
    pub fecha_creacion: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nombre: user.nombre,
            email: user.email,
            rol: user.rol,
            activo: user.activo,
            ventas: user.ventas,
            monto_total: user.monto_total,
            ultimo_acceso: user.ultimo_acceso,
            fecha_creacion: user.fecha_creacion,
        }
    }
}

/// Short form returned by login, registration and user creation.
#[derive(Debug, Clone, Serialize)]
pub struct UserSession {
    pub id: Uuid,
    pub nombre: String,
    pub email: String,
    pub rol: Rol,
}

impl From<&User> for UserSession {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            nombre: user.nombre.clone(),
            email: user.email.clone(),
            rol: user.rol,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub nombre: String,
    pub email: String,
    pub password: String,
    pub rol: Option<Rol>,
    pub activo: Option<bool>,
}

impl CreateUser {
    /// Trims the name, lowercases the email and checks password length.
    pub fn normalize(self) -> AppResult<Self> {
        Ok(Self {
            nombre: required("nombre", &self.nombre)?,
            email: normalize_email(&self.email)?,
            password: check_password(self.password)?,
            rol: self.rol,
            activo: self.activo,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub nombre: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterRequest> for CreateUser {
    fn from(req: RegisterRequest) -> Self {
        // Self-registration always yields a seller account.
        Self {
            nombre: req.nombre,
            email: req.email,
            password: req.password,
            rol: Some(Rol::Vendedor),
            activo: Some(true),
        }
    }
}

/// Insert payload handed to the store once the password has been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub nombre: String,
    pub email: String,
    pub password_hash: String,
    pub rol: Rol,
    pub activo: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub rol: Option<Rol>,
    pub activo: Option<bool>,
    pub ventas: Option<i64>,
    pub monto_total: Option<Decimal>,
    pub ultimo_acceso: Option<DateTime<Utc>>,
    pub password: Option<String>,
}

impl UpdateUser {
    pub fn normalize(self) -> AppResult<Self> {
        let ventas = match self.ventas {
            Some(v) if v < 0 => {
                return Err(AppError::validation("El campo ventas no puede ser negativo"))
            }
            other => other,
        };

        Ok(Self {
            nombre: self.nombre.as_deref().map(|n| required("nombre", n)).transpose()?,
            email: self.email.as_deref().map(normalize_email).transpose()?,
            rol: self.rol,
            activo: self.activo,
            ventas,
            monto_total: self
                .monto_total
                .map(|m| bounded("montoTotal", m, max_monto()))
                .transpose()?,
            ultimo_acceso: self.ultimo_acceso,
            // An empty password field means "keep the current one".
            password: self
                .password
                .filter(|p| !p.is_empty())
                .map(check_password)
                .transpose()?,
        })
    }
}

/// Column updates applied by the store; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub rol: Option<Rol>,
    pub activo: Option<bool>,
    pub ventas: Option<i64>,
    pub monto_total: Option<Decimal>,
    pub ultimo_acceso: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn new(update: UpdateUser, password_hash: Option<String>) -> Self {
        Self {
            nombre: update.nombre,
            email: update.email,
            rol: update.rol,
            activo: update.activo,
            ventas: update.ventas,
            monto_total: update.monto_total,
            ultimo_acceso: update.ultimo_acceso,
            password_hash,
        }
    }

    pub fn apply(self, user: &mut User) {
        if let Some(nombre) = self.nombre {
            user.nombre = nombre;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(rol) = self.rol {
            user.rol = rol;
        }
        if let Some(activo) = self.activo {
            user.activo = activo;
        }
        if let Some(ventas) = self.ventas {
            user.ventas = ventas;
        }
        if let Some(monto_total) = self.monto_total {
            user.monto_total = monto_total;
        }
        if let Some(ultimo_acceso) = self.ultimo_acceso {
            user.ultimo_acceso = Some(ultimo_acceso);
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub usuario: UserSession,
}

pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(AppError::validation("Por favor ingrese un email válido"));
    }
    Ok(email)
}

fn check_password(password: String) -> AppResult<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"
        )));
    }
    Ok(password)
}
