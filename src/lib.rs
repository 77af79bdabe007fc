pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod reports;
pub mod seed;
pub mod store;
pub mod utils;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::Config;
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Public routes
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/registro", post(handlers::auth::registro))

        // Users
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )

        // Products
        .route(
            "/api/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route("/api/products/resumen", get(handlers::products::resumen))
        .route(
            "/api/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )

        // Categories and catalog
        .route(
            "/api/categories",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route("/api/categories/:id", delete(handlers::categories::delete_category))
        .route(
            "/api/categories/:id/productos",
            get(handlers::categories::list_catalog).post(handlers::categories::add_catalog_product),
        )
        .route(
            "/api/categories/:id/productos/:product_id",
            delete(handlers::categories::delete_catalog_product),
        )

        // Ventas
        .route(
            "/api/ventas",
            get(handlers::ventas::list_ventas).post(handlers::ventas::create_venta),
        )
        .route("/api/ventas/resumen", get(handlers::ventas::resumen))
        .route("/api/ventas/por-mes", get(handlers::ventas::por_mes))
        .route("/api/ventas/por-categoria", get(handlers::ventas::por_categoria))
        .route(
            "/api/ventas/:id",
            get(handlers::ventas::get_venta)
                .put(handlers::ventas::update_venta)
                .delete(handlers::ventas::delete_venta),
        )

        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
