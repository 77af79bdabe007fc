use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{
        ApiResponse, CatalogProduct, Category, CreateCatalogProduct, CreateCategory, Empty, Rol,
    },
    AppState,
};

// Categories and their catalogs are administrator-only.
const ADMIN: &[Rol] = &[Rol::Administrador];

fn categoria_no_encontrada() -> AppError {
    AppError::not_found("Categoría no encontrada")
}

pub async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateCategory>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    user.require(ADMIN)?;
    let Json(input) = payload?;

    let category = state
        .store
        .insert_category(input.normalize()?.nombre)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(category))))
}

pub async fn list_categories(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    user.require(ADMIN)?;

    let categories = state.store.list_categories().await?;
    Ok(Json(ApiResponse::ok(categories)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    user.require(ADMIN)?;

    if !state.store.delete_category(id).await? {
        return Err(categoria_no_encontrada());
    }
    Ok(Json(ApiResponse::ok(Empty {})))
}

pub async fn add_catalog_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<CreateCatalogProduct>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<CatalogProduct>>)> {
    user.require(ADMIN)?;
    let Json(input) = payload?;

    let entry = state
        .store
        .add_catalog_product(id, input.normalize()?)
        .await?
        .ok_or_else(categoria_no_encontrada)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(entry))))
}

pub async fn list_catalog(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<CatalogProduct>>>> {
    user.require(ADMIN)?;

    let entries = state.store.list_catalog(id).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

pub async fn delete_catalog_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    user.require(ADMIN)?;

    if !state.store.delete_catalog_product(id, product_id).await? {
        return Err(AppError::not_found("Producto no encontrado"));
    }
    Ok(Json(ApiResponse::ok(Empty {})))
}
