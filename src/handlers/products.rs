use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{ApiResponse, CreateProduct, Empty, Product, ResumenInventario, Rol, UpdateProduct},
    reports,
    AppState,
};

const LECTURA: &[Rol] = &[Rol::Administrador, Rol::Vendedor];
const ESCRITURA: &[Rol] = &[Rol::Administrador];

fn producto_no_encontrado() -> AppError {
    AppError::not_found("Producto no encontrado")
}

pub async fn list_products(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    user.require(LECTURA)?;

    let products = state.store.list_products().await?;
    Ok(Json(ApiResponse::ok(products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    user.require(LECTURA)?;

    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(producto_no_encontrado)?;
    Ok(Json(ApiResponse::ok(product)))
}

// Inventory totals: product count, stock value, low-stock count, distinct categories
pub async fn resumen(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<ResumenInventario>>> {
    user.require(LECTURA)?;

    let products = state.store.list_products().await?;
    Ok(Json(ApiResponse::ok(reports::resumen_inventario(&products))))
}

pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateProduct>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    user.require(ESCRITURA)?;
    let Json(input) = payload?;

    let product = input.normalize()?.into_product(Uuid::new_v4(), Utc::now());
    let product = state.store.insert_product(product).await?;

    log::info!("Product {} ({}) created", product.nombre, product.sku);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(product))))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateProduct>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Product>>> {
    user.require(ESCRITURA)?;
    let Json(input) = payload?;

    let product = state
        .store
        .update_product(id, input.normalize()?)
        .await?
        .ok_or_else(producto_no_encontrado)?;
    Ok(Json(ApiResponse::ok(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    user.require(ESCRITURA)?;

    if !state.store.delete_product(id).await? {
        return Err(producto_no_encontrado());
    }
    Ok(Json(ApiResponse::ok(Empty {})))
}
