use std::sync::Arc;

use practice_router::{
    AppState, FsViewSource, ViewLoader,
    config::{AppConfig, Env},
    create_router, routes,
    views::ViewSourceState,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, compiles the route table, warms the
/// bound views and serves the navigation host.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging. RUST_LOG wins over the defaults.
    // Local runs get human-readable output; production emits one JSON object per line.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "practice_router=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Navigation host starting in {:?} mode", config.env);

    // 3. Route table. A malformed table is a programming error; refuse to start.
    let table = routes::app_routes().expect("FATAL: route table failed validation");
    tracing::info!(routes = table.route_count(), "route table ready");

    // 4. Views. Layouts are bound and loaded now; pages load on first visit.
    let source = Arc::new(FsViewSource::new(config.views_dir.clone())) as ViewSourceState;
    let views = ViewLoader::new(source);
    let preloaded = views
        .preload_bound(&table)
        .await
        .expect("FATAL: bound views must exist in VIEWS_DIR");
    tracing::info!(preloaded, views_dir = %config.views_dir.display(), "bound views loaded");

    // 5. Serve. Config moves into the shared state; keep a copy of the address.
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(table, views, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind APP_ADDR");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API documentation available at /swagger-ui");

    axum::serve(listener, app).await.expect("server error");
}
