use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{non_negative, required};
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub nombre: String,
}

/// Entry of a category's own product catalog.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CatalogProduct {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub nombre: String,
    pub precio: Decimal,
    pub proveedor: String,
    pub sku: String,
    pub categoria: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub nombre: String,
}

impl CreateCategory {
    pub fn normalize(self) -> AppResult<Self> {
        Ok(Self {
            nombre: required("nombre", &self.nombre)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCatalogProduct {
    pub nombre: String,
    pub precio: Decimal,
    pub proveedor: String,
}

impl CreateCatalogProduct {
    pub fn normalize(self) -> AppResult<Self> {
        Ok(Self {
            nombre: required("nombre", &self.nombre)?,
            precio: non_negative("precio", self.precio)?,
            proveedor: required("proveedor", &self.proveedor)?,
        })
    }
}

/// SKU for the `seq`-th catalog entry of a category: `BEB-001`.
pub fn catalog_sku(category_name: &str, seq: i32) -> String {
    let prefix: String = category_name.trim().chars().take(3).collect();
    format!("{}-{:03}", prefix.to_uppercase(), seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_uses_three_letter_prefix() {
        assert_eq!(catalog_sku("Bebidas", 1), "BEB-001");
        assert_eq!(catalog_sku("lácteos", 12), "LÁC-012");
        assert_eq!(catalog_sku("TV", 1000), "TV-1000");
    }
}
