use rustytcx::build_app;
use rustytcx::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rustytcx=debug,tower_http=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("invalid configuration");
    let app = build_app(&config);
    tracing::info!(
        max_upload_bytes = config.max_upload_bytes,
        max_hr = config.zones.max_hr,
        "listening on {}",
        config.addr
    );

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("server crashed");
}
