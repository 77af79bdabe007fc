use std::sync::Arc;

use dotenvy::dotenv;

use sellsync::{
    config::Config,
    create_router,
    database::create_database_pool,
    seed::ensure_admin_user,
    store::{MemoryStore, PgStore, Store},
    AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = Config::from_env();

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let db = create_database_pool(url)
                .await
                .expect("Failed to connect to database");
            Arc::new(PgStore::new(db))
        }
        None => {
            log::warn!("DATABASE_URL not set, data will only live in memory");
            Arc::new(MemoryStore::new())
        }
    };

    ensure_admin_user(&*store, &config)
        .await
        .expect("Failed to provision the default administrator");

    let addr = format!("0.0.0.0:{}", config.port);
    let app = create_router(AppState::new(store, config));

    log::info!("SellSync server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
