mod authority;
mod config;
mod socket;

use std::path::Path;

use axum::Router;
use axum::routing::get;
use log::info;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use authority::{Authority, AuthorityHandle, Command, Outbox};
pub use config::ServerConfig;

/// `/ws` is the game socket, everything else comes from `public_dir`.
pub fn router(authority: AuthorityHandle, public_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/ws", get(socket::ws_handler))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(authority)
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.addr()).await?;
    info!("App running on port {}", config.port);
    serve_on(listener, &config.public_dir).await?;
    Ok(())
}

/// Runs a fresh game on an already bound listener.
pub async fn serve_on(listener: TcpListener, public_dir: impl AsRef<Path>) -> std::io::Result<()> {
    let authority = Authority::new().spawn();
    axum::serve(listener, router(authority, public_dir)).await
}
