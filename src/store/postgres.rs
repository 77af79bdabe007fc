use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use super::Store;
use crate::{
    database::Database,
    error::{AppError, AppResult},
    models::{
        category::catalog_sku,
        venta::{acreditar_monto, format_codigo}, CatalogProduct, Category,
        CreateCatalogProduct, NewUser, NewVenta, Periodo, Product, ProductChanges, ResumenVentas,
        TopVendedor, UpdateVenta, User, UserChanges, VendedorInfo, Venta, VentaDetalle,
        VentasPorCategoria, VentasPorMes,
    },
    reports::{day_bounds, promedio},
};

const VENTA_CON_VENDEDOR: &str = r#"
    SELECT v.*, u.nombre AS vendedor_nombre, u.email AS vendedor_email
    FROM ventas v
    LEFT JOIN users u ON u.id = v.vendedor
"#;

#[derive(FromRow)]
struct VentaRow {
    #[sqlx(flatten)]
    venta: Venta,
    vendedor_nombre: Option<String>,
    vendedor_email: Option<String>,
}

impl From<VentaRow> for VentaDetalle {
    fn from(row: VentaRow) -> Self {
        let vendedor = match (row.venta.vendedor, row.vendedor_nombre, row.vendedor_email) {
            (Some(id), Some(nombre), Some(email)) => Some(VendedorInfo { id, nombre, email }),
            _ => None,
        };
        VentaDetalle::new(row.venta, vendedor)
    }
}

#[derive(FromRow)]
struct MesRow {
    anio: i32,
    mes: i32,
    total_ingresos: Decimal,
    total_ventas: i64,
}

#[derive(FromRow)]
struct CategoriaRow {
    id: String,
    categoria: String,
    total_ventas: i64,
    ingresos: Decimal,
}

#[derive(Clone)]
pub struct PgStore {
    pool: Database,
}

impl PgStore {
    pub fn new(pool: Database) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY fecha_creacion")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, nombre, email, password_hash, rol, activo)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.nombre)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.rol)
        .bind(user.activo)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                nombre = COALESCE($1, nombre),
                email = COALESCE($2, email),
                rol = COALESCE($3, rol),
                activo = COALESCE($4, activo),
                ventas = COALESCE($5, ventas),
                monto_total = COALESCE($6, monto_total),
                ultimo_acceso = COALESCE($7, ultimo_acceso),
                password_hash = COALESCE($8, password_hash)
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(changes.nombre)
        .bind(changes.email)
        .bind(changes.rol)
        .bind(changes.activo)
        .bind(changes.ventas)
        .bind(changes.monto_total)
        .bind(changes.ultimo_acceso)
        .bind(changes.password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_access(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET ultimo_acceso = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY creado_en")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn insert_product(&self, product: Product) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, nombre, sku, categoria, precio, stock, stock_minimo, proveedor, creado_en)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(&product.nombre)
        .bind(&product.sku)
        .bind(&product.categoria)
        .bind(product.precio)
        .bind(product.stock)
        .bind(product.stock_minimo)
        .bind(&product.proveedor)
        .bind(product.creado_en)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                nombre = COALESCE($1, nombre),
                sku = COALESCE($2, sku),
                categoria = COALESCE($3, categoria),
                precio = COALESCE($4, precio),
                stock = COALESCE($5, stock),
                stock_minimo = COALESCE($6, stock_minimo),
                proveedor = COALESCE($7, proveedor)
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(changes.nombre)
        .bind(changes.sku)
        .bind(changes.categoria)
        .bind(changes.precio)
        .bind(changes.stock)
        .bind(changes.stock_minimo)
        .bind(changes.proveedor)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, nombre FROM categories ORDER BY nombre")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn insert_category(&self, nombre: String) -> AppResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, nombre) VALUES ($1, $2) RETURNING id, nombre",
        )
        .bind(Uuid::new_v4())
        .bind(&nombre)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<bool> {
        // product_catalog rows go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_catalog_product(
        &self,
        category_id: Uuid,
        product: CreateCatalogProduct,
    ) -> AppResult<Option<CatalogProduct>> {
        let mut tx = self.pool.begin().await?;

        let category: Option<(String, i32)> = sqlx::query_as(
            r#"
            UPDATE categories SET catalogo_seq = catalogo_seq + 1
            WHERE id = $1
            RETURNING nombre, catalogo_seq
            "#,
        )
        .bind(category_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((nombre, seq)) = category else {
            return Ok(None);
        };

        let entry = sqlx::query_as::<_, CatalogProduct>(
            r#"
            INSERT INTO product_catalog (id, nombre, precio, proveedor, sku, categoria)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&product.nombre)
        .bind(product.precio)
        .bind(&product.proveedor)
        .bind(catalog_sku(&nombre, seq))
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(entry))
    }

    async fn list_catalog(&self, category_id: Uuid) -> AppResult<Vec<CatalogProduct>> {
        let entries = sqlx::query_as::<_, CatalogProduct>(
            "SELECT * FROM product_catalog WHERE categoria = $1 ORDER BY sku",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn delete_catalog_product(&self, category_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM product_catalog WHERE id = $1 AND categoria = $2")
            .bind(product_id)
            .bind(category_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_ventas(&self) -> AppResult<Vec<VentaDetalle>> {
        let rows = sqlx::query_as::<_, VentaRow>(&format!("{VENTA_CON_VENDEDOR} ORDER BY v.fecha"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(VentaDetalle::from).collect())
    }

    async fn get_venta(&self, id: Uuid) -> AppResult<Option<VentaDetalle>> {
        let row = sqlx::query_as::<_, VentaRow>(&format!("{VENTA_CON_VENDEDOR} WHERE v.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(VentaDetalle::from))
    }

    async fn create_venta(&self, venta: NewVenta) -> AppResult<Venta> {
        let mut tx = self.pool.begin().await?;

        let monto_actual: Option<Decimal> =
            sqlx::query_scalar("SELECT monto_total FROM users WHERE id = $1 FOR UPDATE")
                .bind(venta.vendedor)
                .fetch_optional(&mut *tx)
                .await?;
        let monto_vendedor = match monto_actual {
            Some(monto) => acreditar_monto(monto, venta.total)?,
            None => return Err(AppError::validation("Vendedor no encontrado")),
        };

        // Row locks keep concurrent sales from selling the same units twice.
        for linea in &venta.productos {
            let product: Option<(Uuid, i32)> = sqlx::query_as(
                r#"
                SELECT id, stock FROM products
                WHERE nombre = $1
                ORDER BY creado_en
                LIMIT 1
                FOR UPDATE
                "#,
            )
            .bind(&linea.producto)
            .fetch_optional(&mut *tx)
            .await?;

            let (product_id, stock) =
                product.ok_or_else(|| AppError::ProductNotFound(linea.producto.clone()))?;
            if stock < linea.cantidad {
                return Err(AppError::InsufficientStock(linea.producto.clone()));
            }

            sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
                .bind(linea.cantidad)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        }

        let seq: i64 = sqlx::query_scalar("SELECT nextval('venta_codigo_seq')")
            .fetch_one(&mut *tx)
            .await?;

        let record = sqlx::query_as::<_, Venta>(
            r#"
            INSERT INTO ventas (id, codigo, cliente, vendedor, productos, total, estado)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(venta.id)
        .bind(format_codigo(seq))
        .bind(&venta.cliente)
        .bind(venta.vendedor)
        .bind(Json(&venta.productos))
        .bind(venta.total)
        .bind(venta.estado)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET ventas = ventas + 1, monto_total = $1 WHERE id = $2")
        .bind(monto_vendedor)
        .bind(venta.vendedor)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn update_venta(&self, id: Uuid, changes: UpdateVenta) -> AppResult<Option<Venta>> {
        let venta = sqlx::query_as::<_, Venta>(
            r#"
            UPDATE ventas SET
                cliente = COALESCE($1, cliente),
                estado = COALESCE($2, estado)
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(changes.cliente)
        .bind(changes.estado)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(venta)
    }

    async fn delete_venta(&self, id: Uuid) -> AppResult<Option<Venta>> {
        let mut tx = self.pool.begin().await?;

        let venta = sqlx::query_as::<_, Venta>("DELETE FROM ventas WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(venta) = &venta {
            sqlx::query(
                "UPDATE users SET ventas = ventas - 1, monto_total = monto_total - $1 WHERE id = $2",
            )
            .bind(venta.total)
            .bind(venta.vendedor)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(venta)
    }

    async fn ventas_por_mes(&self) -> AppResult<Vec<VentasPorMes>> {
        let rows = sqlx::query_as::<_, MesRow>(
            r#"
            SELECT
                EXTRACT(YEAR FROM fecha AT TIME ZONE 'UTC')::INT AS anio,
                EXTRACT(MONTH FROM fecha AT TIME ZONE 'UTC')::INT AS mes,
                SUM(total) AS total_ingresos,
                COUNT(*) AS total_ventas
            FROM ventas
            GROUP BY anio, mes
            ORDER BY anio, mes
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| VentasPorMes {
                periodo: Periodo {
                    anio: row.anio,
                    mes: row.mes,
                },
                total_ingresos: row.total_ingresos,
                total_ventas: row.total_ventas,
            })
            .collect())
    }

    async fn ventas_por_categoria(&self) -> AppResult<Vec<VentasPorCategoria>> {
        let rows = sqlx::query_as::<_, CategoriaRow>(
            r#"
            SELECT
                p.categoria AS id,
                COALESCE(c.nombre, p.categoria) AS categoria,
                SUM(l.cantidad)::BIGINT AS total_ventas,
                SUM(l.cantidad * l.precio) AS ingresos
            FROM ventas v
            CROSS JOIN LATERAL jsonb_to_recordset(v.productos)
                AS l(producto TEXT, cantidad INT, precio NUMERIC)
            JOIN LATERAL (
                SELECT categoria FROM products
                WHERE nombre = l.producto
                ORDER BY creado_en
                LIMIT 1
            ) p ON TRUE
            LEFT JOIN categories c ON c.id::TEXT = p.categoria
            GROUP BY p.categoria, c.nombre
            ORDER BY ingresos DESC, categoria
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| VentasPorCategoria {
                id: row.id,
                categoria: row.categoria,
                total_ventas: row.total_ventas,
                ingresos: row.ingresos,
            })
            .collect())
    }

    async fn resumen_ventas(&self, dia: NaiveDate) -> AppResult<ResumenVentas> {
        let (inicio, fin) = day_bounds(dia);
        let (ventas_hoy, transacciones_hoy): (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total), 0) AS ventas_hoy, COUNT(*) AS transacciones_hoy
            FROM ventas
            WHERE fecha >= $1 AND fecha < $2
            "#,
        )
        .bind(inicio)
        .bind(fin)
        .fetch_one(&self.pool)
        .await?;

        let top: Option<(String, Decimal)> = sqlx::query_as(
            r#"
            SELECT nombre, monto_total FROM users
            WHERE rol = 'vendedor' AND monto_total > 0
            ORDER BY monto_total DESC, fecha_creacion
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(ResumenVentas {
            ventas_hoy,
            transacciones_hoy,
            promedio: promedio(ventas_hoy, transacciones_hoy),
            top_vendedor: top.map(|(nombre, monto)| TopVendedor { nombre, monto }),
        })
    }
}
