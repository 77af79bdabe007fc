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
    models::{
        ApiResponse, CreateVenta, Empty, ResumenVentas, Rol, UpdateVenta, Venta, VentaDetalle,
        VentasPorCategoria, VentasPorMes,
    },
    AppState,
};

const VENTAS: &[Rol] = &[Rol::Administrador, Rol::Vendedor];

fn venta_no_encontrada() -> AppError {
    AppError::not_found("Venta no encontrada")
}

/// Reloads a sale with its seller populated, as every read endpoint returns it.
async fn detalle(state: &AppState, venta: Venta) -> AppResult<VentaDetalle> {
    state
        .store
        .get_venta(venta.id)
        .await?
        .ok_or_else(venta_no_encontrada)
}

pub async fn list_ventas(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<VentaDetalle>>>> {
    user.require(VENTAS)?;

    let ventas = state.store.list_ventas().await?;
    Ok(Json(ApiResponse::ok(ventas)))
}

pub async fn get_venta(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VentaDetalle>>> {
    user.require(VENTAS)?;

    let venta = state
        .store
        .get_venta(id)
        .await?
        .ok_or_else(venta_no_encontrada)?;
    Ok(Json(ApiResponse::ok(venta)))
}

// Handler to record a sale; stock and seller counters move with it
pub async fn create_venta(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateVenta>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<VentaDetalle>>)> {
    user.require(VENTAS)?;
    let Json(input) = payload?;

    let nueva = input.into_new_venta(user.id)?;
    let venta = state.store.create_venta(nueva).await?;
    log::info!(
        "Venta {} recorded by {} for {}",
        venta.codigo,
        user.email,
        venta.total
    );

    let venta = detalle(&state, venta).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(venta))))
}

pub async fn update_venta(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateVenta>, JsonRejection>,
) -> AppResult<Json<ApiResponse<VentaDetalle>>> {
    user.require(VENTAS)?;
    let Json(input) = payload?;

    let venta = state
        .store
        .update_venta(id, input.normalize())
        .await?
        .ok_or_else(venta_no_encontrada)?;
    Ok(Json(ApiResponse::ok(detalle(&state, venta).await?)))
}

pub async fn delete_venta(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    user.require(VENTAS)?;

    let venta = state
        .store
        .delete_venta(id)
        .await?
        .ok_or_else(venta_no_encontrada)?;
    log::info!("Venta {} deleted by {}", venta.codigo, user.email);
    Ok(Json(ApiResponse::ok(Empty {})))
}

// Today's revenue, transaction count, average ticket and top seller
pub async fn resumen(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<ResumenVentas>>> {
    user.require(VENTAS)?;

    let hoy = Utc::now().date_naive();
    let resumen = state.store.resumen_ventas(hoy).await?;
    Ok(Json(ApiResponse::ok(resumen)))
}

pub async fn por_mes(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<VentasPorMes>>>> {
    user.require(VENTAS)?;

    let meses = state.store.ventas_por_mes().await?;
    Ok(Json(ApiResponse::ok(meses)))
}

pub async fn por_categoria(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<VentasPorCategoria>>>> {
    user.require(VENTAS)?;

    let categorias = state.store.ventas_por_categoria().await?;
    Ok(Json(ApiResponse::ok(categorias)))
}
