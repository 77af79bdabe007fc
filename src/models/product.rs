use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{non_negative, non_negative_int, required};
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub nombre: String,
    pub sku: String,
    pub categoria: String,
    pub precio: Decimal,
    pub stock: i32,
    pub stock_minimo: i32,
    pub proveedor: String,
    pub creado_en: DateTime<Utc>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.stock_minimo
    }

    pub fn stock_value(&self) -> Decimal {
        self.precio.saturating_mul(Decimal::from(self.stock))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub nombre: String,
    pub sku: String,
    pub categoria: String,
    pub precio: Decimal,
    pub stock: i32,
    pub stock_minimo: i32,
    pub proveedor: String,
}

impl CreateProduct {
    pub fn normalize(self) -> AppResult<Self> {
        Ok(Self {
            nombre: required("nombre", &self.nombre)?,
            sku: required("sku", &self.sku)?.to_uppercase(),
            categoria: required("categoria", &self.categoria)?,
            precio: non_negative("precio", self.precio)?,
            stock: non_negative_int("stock", self.stock)?,
            stock_minimo: non_negative_int("stockMinimo", self.stock_minimo)?,
            proveedor: required("proveedor", &self.proveedor)?,
        })
    }

    pub fn into_product(self, id: Uuid, creado_en: DateTime<Utc>) -> Product {
        Product {
            id,
            nombre: self.nombre,
            sku: self.sku,
            categoria: self.categoria,
            precio: self.precio,
            stock: self.stock,
            stock_minimo: self.stock_minimo,
            proveedor: self.proveedor,
            creado_en,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub nombre: Option<String>,
    pub sku: Option<String>,
    pub categoria: Option<String>,
    pub precio: Option<Decimal>,
    pub stock: Option<i32>,
    pub stock_minimo: Option<i32>,
    pub proveedor: Option<String>,
}

/// Validated column updates; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub nombre: Option<String>,
    pub sku: Option<String>,
    pub categoria: Option<String>,
    pub precio: Option<Decimal>,
    pub stock: Option<i32>,
    pub stock_minimo: Option<i32>,
    pub proveedor: Option<String>,
}

impl UpdateProduct {
    pub fn normalize(self) -> AppResult<ProductChanges> {
        Ok(ProductChanges {
            nombre: self.nombre.as_deref().map(|v| required("nombre", v)).transpose()?,
            sku: self
                .sku
                .as_deref()
                .map(|v| required("sku", v).map(|s| s.to_uppercase()))
                .transpose()?,
            categoria: self
                .categoria
                .as_deref()
                .map(|v| required("categoria", v))
                .transpose()?,
            precio: self.precio.map(|v| non_negative("precio", v)).transpose()?,
            stock: self.stock.map(|v| non_negative_int("stock", v)).transpose()?,
            stock_minimo: self
                .stock_minimo
                .map(|v| non_negative_int("stockMinimo", v))
                .transpose()?,
            proveedor: self
                .proveedor
                .as_deref()
                .map(|v| required("proveedor", v))
                .transpose()?,
        })
    }
}

impl ProductChanges {
    pub fn apply(self, product: &mut Product) {
        if let Some(nombre) = self.nombre {
            product.nombre = nombre;
        }
        if let Some(sku) = self.sku {
            product.sku = sku;
        }
        if let Some(categoria) = self.categoria {
            product.categoria = categoria;
        }
        if let Some(precio) = self.precio {
            product.precio = precio;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(stock_minimo) = self.stock_minimo {
            product.stock_minimo = stock_minimo;
        }
        if let Some(proveedor) = self.proveedor {
            product.proveedor = proveedor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use rust_decimal_macros::dec;

    fn sample() -> CreateProduct {
        CreateProduct {
            nombre: "  Café molido ".to_string(),
            sku: "caf-01".to_string(),
            categoria: "bebidas".to_string(),
            precio: dec!(4.50),
            stock: 10,
            stock_minimo: 2,
            proveedor: "Tostadores SA".to_string(),
        }
    }

    #[test]
    fn sku_is_uppercased_and_name_trimmed() {
        let product = sample().normalize().unwrap();
        assert_eq!(product.sku, "CAF-01");
        assert_eq!(product.nombre, "Café molido");
    }

    #[test]
    fn negative_stock_is_rejected() {
        let mut input = sample();
        input.stock = -1;
        assert!(matches!(input.normalize(), Err(AppError::Validation(_))));
    }

    #[test]
    fn partial_update_only_touches_given_fields() {
        let mut product = sample().normalize().unwrap().into_product(Uuid::new_v4(), Utc::now());
        let changes = UpdateProduct {
            stock: Some(1),
            sku: Some("nuevo".to_string()),
            ..Default::default()
        }
        .normalize()
        .unwrap();
        changes.apply(&mut product);

        assert_eq!(product.stock, 1);
        assert_eq!(product.sku, "NUEVO");
        assert_eq!(product.precio, dec!(4.50));
        assert!(product.is_low_stock());
    }
}
