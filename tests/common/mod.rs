//! Shared harness: the full router over an in-memory store with a seeded
//! administrator and seller.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use sellsync::{
    config::Config,
    create_router,
    models::{NewUser, Rol},
    seed::{ensure_admin_user, ADMIN_EMAIL, ADMIN_PASSWORD},
    store::{MemoryStore, Store},
    utils::{create_token, hash_password},
    AppState,
};

pub const TEST_SECRET: &str = "test-secret";
pub const SELLER_EMAIL: &str = "vendedor@tienda.com";
pub const SELLER_PASSWORD: &str = "vendedor123";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
    pub admin_id: Uuid,
    pub admin_token: String,
    pub seller_id: Uuid,
    pub seller_token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = Config::for_testing(TEST_SECRET);
        let store = Arc::new(MemoryStore::new());

        ensure_admin_user(&*store, &config).await.unwrap();
        let admin = store
            .find_user_by_email(ADMIN_EMAIL)
            .await
            .unwrap()
            .expect("admin seeded");

        let seller = store
            .insert_user(NewUser {
                id: Uuid::new_v4(),
                nombre: "Vera Vendedora".to_string(),
                email: SELLER_EMAIL.to_string(),
                password_hash: hash_password(SELLER_PASSWORD, config.bcrypt_cost).unwrap(),
                rol: Rol::Vendedor,
                activo: true,
            })
            .await
            .unwrap();

        let admin_token = create_token(admin.id, admin.rol, TEST_SECRET, 30).unwrap();
        let seller_token = create_token(seller.id, seller.rol, TEST_SECRET, 30).unwrap();

        let state = AppState::new(store.clone(), config.clone());
        Self {
            router: create_router(state),
            store,
            config,
            admin_id: admin.id,
            admin_token,
            seller_id: seller.id,
            seller_token,
        }
    }

    /// Adds an active user with `rol` straight to the store and returns a token for it.
    pub async fn token_for(&self, email: &str, rol: Rol) -> String {
        let user = self
            .store
            .insert_user(NewUser {
                id: Uuid::new_v4(),
                nombre: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password_hash: hash_password("secreto123", self.config.bcrypt_cost).unwrap(),
                rol,
                activo: true,
            })
            .await
            .unwrap();
        create_token(user.id, user.rol, TEST_SECRET, 30).unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Creates a product through the API as administrator and returns its id.
    pub async fn create_product(&self, nombre: &str, categoria: &str, precio: f64, stock: i32) -> String {
        let (status, body) = self
            .post(
                "/api/products",
                &self.admin_token,
                serde_json::json!({
                    "nombre": nombre,
                    "sku": format!("sku-{}", nombre.to_lowercase()),
                    "categoria": categoria,
                    "precio": precio,
                    "stock": stock,
                    "stockMinimo": 2,
                    "proveedor": "Distribuidora Sur"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["_id"].as_str().unwrap().to_string()
    }

    pub async fn stock_of(&self, product_id: &str) -> i64 {
        let (_, body) = self
            .get(&format!("/api/products/{product_id}"), &self.admin_token)
            .await;
        body["data"]["stock"].as_i64().unwrap()
    }

    pub async fn seller_counters(&self) -> (i64, f64) {
        let (_, body) = self
            .get(&format!("/api/users/{}", self.seller_id), &self.admin_token)
            .await;
        (
            body["data"]["ventas"].as_i64().unwrap(),
            body["data"]["montoTotal"].as_f64().unwrap(),
        )
    }
}

pub fn admin_credentials() -> (&'static str, &'static str) {
    (ADMIN_EMAIL, ADMIN_PASSWORD)
}
