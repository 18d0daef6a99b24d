use std::sync::Arc;

use hubadmin::config::AppConfig;
use hubadmin::routes;
use hubadmin::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");
    let port = config.port;
    tracing::info!(
        api_base_url = %config.api_base_url,
        bootstrap = ?config.bootstrap,
        "configuration loaded"
    );

    let app = routes::app(AppState::new(Arc::new(config)));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "hubadmin listening");
    axum::serve(listener, app).await.expect("server failed");
}
