//! Persistence seam. Handlers only talk to [`Store`]; `PgStore` backs production
//! and `MemoryStore` backs tests and database-less runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        CatalogProduct, Category, CreateCatalogProduct, NewUser, NewVenta, Product,
        ProductChanges, ResumenVentas, UpdateVenta, User, UserChanges, Venta, VentaDetalle,
        VentasPorCategoria, VentasPorMes,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn list_users(&self) -> AppResult<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> AppResult<User>;
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;
    async fn record_access(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    // Products
    async fn list_products(&self) -> AppResult<Vec<Product>>;
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>>;
    /// Fails with `Conflict` when the SKU is taken.
    async fn insert_product(&self, product: Product) -> AppResult<Product>;
    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> AppResult<bool>;

    // Categories and their catalog
    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn insert_category(&self, nombre: String) -> AppResult<Category>;
    /// Removes the category together with its catalog entries.
    async fn delete_category(&self, id: Uuid) -> AppResult<bool>;
    /// Returns `None` when the category does not exist. The SKU is generated here.
    async fn add_catalog_product(
        &self,
        category_id: Uuid,
        product: CreateCatalogProduct,
    ) -> AppResult<Option<CatalogProduct>>;
    async fn list_catalog(&self, category_id: Uuid) -> AppResult<Vec<CatalogProduct>>;
    async fn delete_catalog_product(&self, category_id: Uuid, product_id: Uuid) -> AppResult<bool>;

    // Ventas
    async fn list_ventas(&self) -> AppResult<Vec<VentaDetalle>>;
    async fn get_venta(&self, id: Uuid) -> AppResult<Option<VentaDetalle>>;
    /// Decrements stock for every line, records the sale and credits the seller,
    /// all or nothing.
    async fn create_venta(&self, venta: NewVenta) -> AppResult<Venta>;
    async fn update_venta(&self, id: Uuid, changes: UpdateVenta) -> AppResult<Option<Venta>>;
    /// Deletes the sale and debits the seller's counters. Stock is not restored.
    async fn delete_venta(&self, id: Uuid) -> AppResult<Option<Venta>>;

    // Reports
    async fn ventas_por_mes(&self) -> AppResult<Vec<VentasPorMes>>;
    async fn ventas_por_categoria(&self) -> AppResult<Vec<VentasPorCategoria>>;
    async fn resumen_ventas(&self, dia: NaiveDate) -> AppResult<ResumenVentas>;
}
