use lexiparty_backend::config;
use lexiparty_backend::http::{self, AppState};
use lexiparty_backend::room::registry::RoomRegistry;
use lexiparty_backend::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let state = AppState {
        rooms: RoomRegistry::new(config::room_log_path()),
    };
    let app = http::router(state);

    let addr = config::server_addr();
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
