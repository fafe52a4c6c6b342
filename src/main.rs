use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use spabook::config::AppConfig;
use spabook::db;
use spabook::services::scheduling::staff_picker_from_name;
use spabook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;

    let staff_picker = staff_picker_from_name(&config.staff_selection).ok_or_else(|| {
        anyhow::anyhow!(
            "STAFF_SELECTION must be `random` or `lowest_id`, got {:?}",
            config.staff_selection
        )
    })?;

    let conn = db::init_db(&config.database_url)?;

    tracing::info!(
        open = %config.open_time,
        close = %config.close_time,
        default_duration_minutes = config.default_duration_minutes,
        staff_selection = %config.staff_selection,
        "scheduling configured"
    );

    let state = Arc::new(AppState::new(conn, config.clone(), staff_picker));

    let app = spabook::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
