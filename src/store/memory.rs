use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::{
    error::{AppError, AppResult},
    models::{
        category::catalog_sku,
        venta::{acreditar_monto, format_codigo}, CatalogProduct, Category,
        CreateCatalogProduct, NewUser, NewVenta, Product, ProductChanges, ResumenVentas,
        UpdateVenta, User, UserChanges, VendedorInfo, Venta, VentaDetalle, VentasPorCategoria,
        VentasPorMes,
    },
    reports,
};

#[derive(Default)]
struct Data {
    users: Vec<User>,
    products: Vec<Product>,
    categories: Vec<(Category, i32)>,
    catalog: Vec<CatalogProduct>,
    ventas: Vec<Venta>,
    venta_seq: i64,
}

impl Data {
    fn detalle(&self, venta: &Venta) -> VentaDetalle {
        let vendedor = venta
            .vendedor
            .and_then(|id| self.users.iter().find(|u| u.id == id))
            .map(|u| VendedorInfo {
                id: u.id,
                nombre: u.nombre.clone(),
                email: u.email.clone(),
            });
        VentaDetalle::new(venta.clone(), vendedor)
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn sku_taken(&self, sku: &str, except: Option<Uuid>) -> bool {
        self.products
            .iter()
            .any(|p| p.sku == sku && Some(p.id) != except)
    }
}

/// Process-local store guarded by one lock. Used by the test-suite and when no
/// `DATABASE_URL` is configured; data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Data>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict(what: &str) -> AppError {
    AppError::Conflict(format!("{what} ya está registrado"))
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.data.read().await.users.clone())
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut data = self.data.write().await;
        if data.email_taken(&user.email, None) {
            return Err(conflict("El email"));
        }

        let user = User {
            id: user.id,
            nombre: user.nombre,
            email: user.email,
            password_hash: user.password_hash,
            rol: user.rol,
            activo: user.activo,
            ventas: 0,
            monto_total: Decimal::ZERO,
            ultimo_acceso: None,
            fecha_creacion: Utc::now(),
        };
        data.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>> {
        let mut data = self.data.write().await;
        if let Some(email) = &changes.email {
            if data.email_taken(email, Some(id)) {
                return Err(conflict("El email"));
            }
        }

        Ok(data.users.iter_mut().find(|u| u.id == id).map(|user| {
            changes.apply(user);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut data = self.data.write().await;
        let before = data.users.len();
        data.users.retain(|u| u.id != id);
        if data.users.len() == before {
            return Ok(false);
        }

        for venta in data.ventas.iter_mut().filter(|v| v.vendedor == Some(id)) {
            venta.vendedor = None;
        }
        Ok(true)
    }

    async fn record_access(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let mut data = self.data.write().await;
        if let Some(user) = data.users.iter_mut().find(|u| u.id == id) {
            user.ultimo_acceso = Some(at);
        }
        Ok(())
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        Ok(self.data.read().await.products.clone())
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let data = self.data.read().await;
        Ok(data.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, product: Product) -> AppResult<Product> {
        let mut data = self.data.write().await;
        if data.sku_taken(&product.sku, None) {
            return Err(conflict("El SKU"));
        }
        data.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>> {
        let mut data = self.data.write().await;
        if let Some(sku) = &changes.sku {
            if data.sku_taken(sku, Some(id)) {
                return Err(conflict("El SKU"));
            }
        }

        Ok(data.products.iter_mut().find(|p| p.id == id).map(|product| {
            changes.apply(product);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let mut data = self.data.write().await;
        let before = data.products.len();
        data.products.retain(|p| p.id != id);
        Ok(data.products.len() != before)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let data = self.data.read().await;
        let mut categories: Vec<Category> = data.categories.iter().map(|(c, _)| c.clone()).collect();
        categories.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        Ok(categories)
    }

    async fn insert_category(&self, nombre: String) -> AppResult<Category> {
        let mut data = self.data.write().await;
        if data.categories.iter().any(|(c, _)| c.nombre == nombre) {
            return Err(AppError::Conflict(format!("La categoría {nombre} ya existe")));
        }

        let category = Category {
            id: Uuid::new_v4(),
            nombre,
        };
        data.categories.push((category.clone(), 0));
        Ok(category)
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<bool> {
        let mut data = self.data.write().await;
        let before = data.categories.len();
        data.categories.retain(|(c, _)| c.id != id);
        if data.categories.len() == before {
            return Ok(false);
        }
        data.catalog.retain(|p| p.categoria != id);
        Ok(true)
    }

    async fn add_catalog_product(
        &self,
        category_id: Uuid,
        product: CreateCatalogProduct,
    ) -> AppResult<Option<CatalogProduct>> {
        let mut data = self.data.write().await;
        let Some((category, seq)) = data.categories.iter_mut().find(|(c, _)| c.id == category_id)
        else {
            return Ok(None);
        };
        *seq += 1;
        let sku = catalog_sku(&category.nombre, *seq);

        let entry = CatalogProduct {
            id: Uuid::new_v4(),
            nombre: product.nombre,
            precio: product.precio,
            proveedor: product.proveedor,
            sku,
            categoria: category_id,
        };
        data.catalog.push(entry.clone());
        Ok(Some(entry))
    }

    async fn list_catalog(&self, category_id: Uuid) -> AppResult<Vec<CatalogProduct>> {
        let data = self.data.read().await;
        Ok(data
            .catalog
            .iter()
            .filter(|p| p.categoria == category_id)
            .cloned()
            .collect())
    }

    async fn delete_catalog_product(&self, category_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let mut data = self.data.write().await;
        let before = data.catalog.len();
        data.catalog
            .retain(|p| !(p.id == product_id && p.categoria == category_id));
        Ok(data.catalog.len() != before)
    }

    async fn list_ventas(&self) -> AppResult<Vec<VentaDetalle>> {
        let data = self.data.read().await;
        Ok(data.ventas.iter().map(|v| data.detalle(v)).collect())
    }

    async fn get_venta(&self, id: Uuid) -> AppResult<Option<VentaDetalle>> {
        let data = self.data.read().await;
        Ok(data.ventas.iter().find(|v| v.id == id).map(|v| data.detalle(v)))
    }

    async fn create_venta(&self, venta: NewVenta) -> AppResult<Venta> {
        let mut data = self.data.write().await;

        let monto_vendedor = match data.users.iter().find(|u| u.id == venta.vendedor) {
            Some(seller) => acreditar_monto(seller.monto_total, venta.total)?,
            None => return Err(AppError::validation("Vendedor no encontrado")),
        };

        // Work on a copy of the stock levels so a failing line changes nothing.
        let mut stock: Vec<i32> = data.products.iter().map(|p| p.stock).collect();
        for linea in &venta.productos {
            let index = data
                .products
                .iter()
                .enumerate()
                .filter(|(_, p)| p.nombre == linea.producto)
                .min_by_key(|(_, p)| p.creado_en)
                .map(|(i, _)| i)
                .ok_or_else(|| AppError::ProductNotFound(linea.producto.clone()))?;

            if stock[index] < linea.cantidad {
                return Err(AppError::InsufficientStock(linea.producto.clone()));
            }
            stock[index] -= linea.cantidad;
        }

        for (product, nuevo) in data.products.iter_mut().zip(stock) {
            product.stock = nuevo;
        }

        data.venta_seq += 1;
        let now = Utc::now();
        let record = Venta {
            id: venta.id,
            codigo: format_codigo(data.venta_seq),
            cliente: venta.cliente,
            vendedor: Some(venta.vendedor),
            fecha: now,
            productos: Json(venta.productos),
            total: venta.total,
            estado: venta.estado,
            creado_en: now,
        };
        data.ventas.push(record.clone());

        if let Some(seller) = data.users.iter_mut().find(|u| u.id == venta.vendedor) {
            seller.ventas += 1;
            seller.monto_total = monto_vendedor;
        }
        Ok(record)
    }

    async fn update_venta(&self, id: Uuid, changes: UpdateVenta) -> AppResult<Option<Venta>> {
        let mut data = self.data.write().await;
        Ok(data.ventas.iter_mut().find(|v| v.id == id).map(|venta| {
            if let Some(cliente) = changes.cliente {
                venta.cliente = cliente;
            }
            if let Some(estado) = changes.estado {
                venta.estado = estado;
            }
            venta.clone()
        }))
    }

    async fn delete_venta(&self, id: Uuid) -> AppResult<Option<Venta>> {
        let mut data = self.data.write().await;
        let Some(index) = data.ventas.iter().position(|v| v.id == id) else {
            return Ok(None);
        };
        let venta = data.ventas.remove(index);

        if let Some(vendedor) = venta.vendedor {
            if let Some(seller) = data.users.iter_mut().find(|u| u.id == vendedor) {
                seller.ventas -= 1;
                seller.monto_total -= venta.total;
            }
        }
        Ok(Some(venta))
    }

    async fn ventas_por_mes(&self) -> AppResult<Vec<VentasPorMes>> {
        let data = self.data.read().await;
        Ok(reports::ventas_por_mes(&data.ventas))
    }

    async fn ventas_por_categoria(&self) -> AppResult<Vec<VentasPorCategoria>> {
        let data = self.data.read().await;
        let categories: Vec<Category> = data.categories.iter().map(|(c, _)| c.clone()).collect();
        Ok(reports::ventas_por_categoria(
            &data.ventas,
            &data.products,
            &categories,
        ))
    }

    async fn resumen_ventas(&self, dia: NaiveDate) -> AppResult<ResumenVentas> {
        let data = self.data.read().await;
        Ok(reports::resumen_ventas(&data.ventas, &data.users, dia))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineaVenta, Rol};
    use rust_decimal_macros::dec;

    async fn seller(store: &MemoryStore) -> User {
        store
            .insert_user(NewUser {
                id: Uuid::new_v4(),
                nombre: "Vendedor Juan".to_string(),
                email: "juan@tienda.com".to_string(),
                password_hash: "x".to_string(),
                rol: Rol::Vendedor,
                activo: true,
            })
            .await
            .unwrap()
    }

    async fn product(store: &MemoryStore, nombre: &str, stock: i32) -> Product {
        store
            .insert_product(Product {
                id: Uuid::new_v4(),
                nombre: nombre.to_string(),
                sku: nombre.to_uppercase(),
                categoria: "general".to_string(),
                precio: dec!(10),
                stock,
                stock_minimo: 1,
                proveedor: "Proveedor".to_string(),
                creado_en: Utc::now(),
            })
            .await
            .unwrap()
    }

    fn nueva(vendedor: Uuid, lineas: &[(&str, i32)]) -> NewVenta {
        let productos: Vec<LineaVenta> = lineas
            .iter()
            .map(|(producto, cantidad)| LineaVenta {
                producto: producto.to_string(),
                cantidad: *cantidad,
                precio: dec!(10),
            })
            .collect();
        let total = crate::models::venta::total_lineas(&productos).unwrap();
        NewVenta {
            id: Uuid::new_v4(),
            cliente: "No registrado".to_string(),
            vendedor,
            productos,
            total,
            estado: Default::default(),
        }
    }

    #[tokio::test]
    async fn failing_line_leaves_every_stock_untouched() {
        let store = MemoryStore::new();
        let juan = seller(&store).await;
        let cafe = product(&store, "Café", 5).await;
        let te = product(&store, "Té", 1).await;

        let err = store
            .create_venta(nueva(juan.id, &[("Café", 2), ("Té", 3)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(name) if name == "Té"));

        assert_eq!(store.get_product(cafe.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(store.get_product(te.id).await.unwrap().unwrap().stock, 1);
        assert!(store.list_ventas().await.unwrap().is_empty());
        assert_eq!(store.get_user(juan.id).await.unwrap().unwrap().ventas, 0);
    }

    #[tokio::test]
    async fn repeated_lines_share_the_same_stock() {
        let store = MemoryStore::new();
        let juan = seller(&store).await;
        product(&store, "Café", 3).await;

        let err = store
            .create_venta(nueva(juan.id, &[("Café", 2), ("Café", 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));
    }

    #[tokio::test]
    async fn seller_amount_overflow_rejects_the_whole_sale() {
        let store = MemoryStore::new();
        let juan = seller(&store).await;
        let cafe = product(&store, "Café", 5).await;
        store
            .update_user(
                juan.id,
                UserChanges {
                    monto_total: Some(crate::models::max_monto()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = store
            .create_venta(nueva(juan.id, &[("Café", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.get_product(cafe.id).await.unwrap().unwrap().stock, 5);
        assert!(store.list_ventas().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn codes_keep_increasing_after_deletes() {
        let store = MemoryStore::new();
        let juan = seller(&store).await;
        product(&store, "Café", 10).await;

        let first = store.create_venta(nueva(juan.id, &[("Café", 1)])).await.unwrap();
        store.delete_venta(first.id).await.unwrap();
        let second = store.create_venta(nueva(juan.id, &[("Café", 1)])).await.unwrap();

        assert_eq!(first.codigo, "VT-001");
        assert_eq!(second.codigo, "VT-002");
    }

    #[tokio::test]
    async fn catalog_skus_follow_category_sequence() {
        let store = MemoryStore::new();
        let bebidas = store.insert_category("Bebidas".to_string()).await.unwrap();
        let entry = |nombre: &str| CreateCatalogProduct {
            nombre: nombre.to_string(),
            precio: dec!(1.5),
            proveedor: "Proveedor".to_string(),
        };

        let agua = store.add_catalog_product(bebidas.id, entry("Agua")).await.unwrap().unwrap();
        let jugo = store.add_catalog_product(bebidas.id, entry("Jugo")).await.unwrap().unwrap();
        assert_eq!(agua.sku, "BEB-001");
        assert_eq!(jugo.sku, "BEB-002");

        assert!(store
            .add_catalog_product(Uuid::new_v4(), entry("Nada"))
            .await
            .unwrap()
            .is_none());

        assert!(store.delete_category(bebidas.id).await.unwrap());
        assert!(store.list_catalog(bebidas.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        seller(&store).await;
        let err = store
            .insert_user(NewUser {
                id: Uuid::new_v4(),
                nombre: "Otro".to_string(),
                email: "juan@tienda.com".to_string(),
                password_hash: "x".to_string(),
                rol: Rol::Vendedor,
                activo: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
