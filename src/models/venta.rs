use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use super::{max_monto, non_negative, required};
use crate::error::{AppError, AppResult};

pub const CLIENTE_POR_DEFECTO: &str = "No registrado";
const TOTAL_EXCEDE: &str = "El total de la venta excede el máximo permitido";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "estado_venta", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EstadoVenta {
    #[default]
    Completada,
    Pendiente,
    Cancelada,
}

/// One sold line. `producto` is the product name, resolved only when the sale is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineaVenta {
    pub producto: String,
    pub cantidad: i32,
    pub precio: Decimal,
}

impl LineaVenta {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.precio.checked_mul(Decimal::from(self.cantidad))
    }
}

/// Checked `Σ cantidad × precio`.
pub fn total_lineas(lineas: &[LineaVenta]) -> Option<Decimal> {
    lineas
        .iter()
        .try_fold(Decimal::ZERO, |acc, linea| acc.checked_add(linea.subtotal()?))
}

/// Seller's cumulative amount after crediting a sale of `total`.
pub fn acreditar_monto(actual: Decimal, total: Decimal) -> AppResult<Decimal> {
    actual
        .checked_add(total)
        .filter(|monto| *monto <= max_monto())
        .ok_or_else(|| {
            AppError::validation("El monto acumulado del vendedor excede el máximo permitido")
        })
}

#[derive(Debug, Clone, FromRow)]
pub struct Venta {
    pub id: Uuid,
    pub codigo: String,
    pub cliente: String,
    pub vendedor: Option<Uuid>,
    pub fecha: DateTime<Utc>,
    pub productos: Json<Vec<LineaVenta>>,
    pub total: Decimal,
    pub estado: EstadoVenta,
    pub creado_en: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VendedorInfo {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub nombre: String,
    pub email: String,
}

/// Venta with its seller populated, as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VentaDetalle {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub codigo: String,
    pub cliente: String,
    pub vendedor: Option<VendedorInfo>,
    pub fecha: DateTime<Utc>,
    pub productos: Vec<LineaVenta>,
    pub total: Decimal,
    pub estado: EstadoVenta,
    pub creado_en: DateTime<Utc>,
}

impl VentaDetalle {
    pub fn new(venta: Venta, vendedor: Option<VendedorInfo>) -> Self {
        Self {
            id: venta.id,
            codigo: venta.codigo,
            cliente: venta.cliente,
            vendedor,
            fecha: venta.fecha,
            productos: venta.productos.0,
            total: venta.total,
            estado: venta.estado,
            creado_en: venta.creado_en,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateVenta {
    pub cliente: Option<String>,
    pub vendedor: Option<Uuid>,
    pub productos: Vec<LineaVenta>,
    pub estado: Option<EstadoVenta>,
}

/// Validated sale ready for the store: seller resolved and total computed.
#[derive(Debug, Clone)]
pub struct NewVenta {
    pub id: Uuid,
    pub cliente: String,
    pub vendedor: Uuid,
    pub productos: Vec<LineaVenta>,
    pub total: Decimal,
    pub estado: EstadoVenta,
}

impl CreateVenta {
    /// Validates the lines and computes the total; `vendedor` defaults to the caller.
    pub fn into_new_venta(self, caller: Uuid) -> AppResult<NewVenta> {
        if self.productos.is_empty() {
            return Err(AppError::validation("La venta debe incluir al menos un producto"));
        }

        let mut productos = Vec::with_capacity(self.productos.len());
        for linea in self.productos {
            if linea.cantidad < 1 {
                return Err(AppError::validation(format!(
                    "La cantidad de {} debe ser al menos 1",
                    linea.producto
                )));
            }
            productos.push(LineaVenta {
                producto: required("producto", &linea.producto)?,
                cantidad: linea.cantidad,
                precio: non_negative("precio", linea.precio)?,
            });
        }

        let total = total_lineas(&productos)
            .filter(|total| *total <= max_monto())
            .ok_or_else(|| AppError::validation(TOTAL_EXCEDE))?;
        let cliente = self
            .cliente
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| CLIENTE_POR_DEFECTO.to_string());

        Ok(NewVenta {
            id: Uuid::new_v4(),
            cliente,
            vendedor: self.vendedor.unwrap_or(caller),
            productos,
            total,
            estado: self.estado.unwrap_or_default(),
        })
    }
}

/// Only the client name and status can change once a sale is recorded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVenta {
    pub cliente: Option<String>,
    pub estado: Option<EstadoVenta>,
}

impl UpdateVenta {
    pub fn normalize(self) -> Self {
        Self {
            cliente: self.cliente.map(|c| {
                let c = c.trim();
                if c.is_empty() {
                    CLIENTE_POR_DEFECTO.to_string()
                } else {
                    c.to_string()
                }
            }),
            estado: self.estado,
        }
    }
}

pub fn format_codigo(seq: i64) -> String {
    format!("VT-{:03}", seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn linea(producto: &str, cantidad: i32, precio: Decimal) -> LineaVenta {
        LineaVenta {
            producto: producto.to_string(),
            cantidad,
            precio,
        }
    }

    #[test]
    fn total_is_sum_of_lines_and_seller_defaults_to_caller() {
        let caller = Uuid::new_v4();
        let venta = CreateVenta {
            cliente: None,
            vendedor: None,
            productos: vec![linea("Café", 2, dec!(4.50)), linea("Té", 3, dec!(1.25))],
            estado: None,
        }
        .into_new_venta(caller)
        .unwrap();

        assert_eq!(venta.total, dec!(12.75));
        assert_eq!(venta.vendedor, caller);
        assert_eq!(venta.cliente, CLIENTE_POR_DEFECTO);
        assert_eq!(venta.estado, EstadoVenta::Completada);
    }

    #[test]
    fn empty_and_zero_quantity_sales_are_rejected() {
        let empty = CreateVenta {
            cliente: None,
            vendedor: None,
            productos: vec![],
            estado: None,
        };
        assert!(empty.into_new_venta(Uuid::new_v4()).is_err());

        let zero = CreateVenta {
            cliente: Some("Marta".to_string()),
            vendedor: None,
            productos: vec![linea("Café", 0, dec!(4.50))],
            estado: None,
        };
        assert!(zero.into_new_venta(Uuid::new_v4()).is_err());
    }

    #[test]
    fn oversized_totals_are_validation_errors() {
        let huge = CreateVenta {
            cliente: None,
            vendedor: None,
            productos: vec![linea("Café", 3, dec!(50000000000000000000000000000))],
            estado: None,
        };
        assert!(matches!(
            huge.into_new_venta(Uuid::new_v4()),
            Err(AppError::Validation(_))
        ));

        let many = CreateVenta {
            cliente: None,
            vendedor: None,
            productos: vec![linea("Café", 100_000, dec!(9999999999))],
            estado: None,
        };
        let err = many.into_new_venta(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.to_string(), TOTAL_EXCEDE);

        let overflow = linea("Café", i32::MAX, Decimal::MAX);
        assert_eq!(overflow.subtotal(), None);
        assert_eq!(total_lineas(&[overflow]), None);
    }

    #[test]
    fn seller_credit_is_capped_at_column_range() {
        assert_eq!(acreditar_monto(dec!(10), dec!(5.5)).unwrap(), dec!(15.5));
        assert!(acreditar_monto(max_monto(), dec!(0.01)).is_err());
    }

    #[test]
    fn codigo_is_zero_padded() {
        assert_eq!(format_codigo(7), "VT-007");
        assert_eq!(format_codigo(1234), "VT-1234");
    }
}
