pub mod category;
pub mod product;
pub mod report;
pub mod user;
pub mod venta;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::{AppError, AppResult};

pub use category::{CatalogProduct, Category, CreateCatalogProduct, CreateCategory};
pub use product::{CreateProduct, Product, ProductChanges, UpdateProduct};
pub use report::{Periodo, ResumenInventario, ResumenVentas, TopVendedor, VentasPorCategoria, VentasPorMes};
pub use user::{
    CreateUser, LoginRequest, LoginResponse, NewUser, RegisterRequest, Rol, UpdateUser, User,
    UserChanges, UserResponse, UserSession,
};
pub use venta::{
    CreateVenta, EstadoVenta, LineaVenta, NewVenta, UpdateVenta, VendedorInfo, Venta,
    VentaDetalle,
};

/// `{success: true, data}` envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Body returned by delete endpoints (`data: {}`).
#[derive(Debug, Serialize)]
pub struct Empty {}

pub(crate) fn required(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("El campo {field} es requerido")));
    }
    Ok(trimmed.to_string())
}

/// Largest price a `NUMERIC(12, 2)` column holds.
pub fn max_precio() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Largest accumulated amount a `NUMERIC(14, 2)` column holds.
pub fn max_monto() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// Price check: non-negative, within the column range, rounded to cents.
pub(crate) fn non_negative(field: &str, value: Decimal) -> AppResult<Decimal> {
    bounded(field, value, max_precio())
}

pub(crate) fn bounded(field: &str, value: Decimal, max: Decimal) -> AppResult<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::validation(format!("El campo {field} no puede ser negativo")));
    }
    if value > max {
        return Err(AppError::validation(format!(
            "El campo {field} excede el máximo permitido"
        )));
    }
    // Same half-up rounding PostgreSQL applies to NUMERIC(_, 2).
    Ok(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

pub(crate) fn non_negative_int(field: &str, value: i32) -> AppResult<i32> {
    if value < 0 {
        return Err(AppError::validation(format!("El campo {field} no puede ser negativo")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amounts_are_rounded_to_cents_half_up() {
        assert_eq!(non_negative("precio", dec!(2.345)).unwrap(), dec!(2.35));
        assert_eq!(non_negative("precio", dec!(10)).unwrap(), dec!(10));
        assert_eq!(non_negative("precio", Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn amounts_outside_the_column_range_are_rejected() {
        assert!(non_negative("precio", dec!(-0.01)).is_err());
        assert!(non_negative("precio", max_precio()).is_ok());

        let err = non_negative("precio", dec!(50000000000000000000000000000)).unwrap_err();
        assert_eq!(err.to_string(), "El campo precio excede el máximo permitido");
        assert!(bounded("montoTotal", dec!(10000000000000), max_monto()).is_err());
    }
}
