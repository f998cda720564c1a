use axum::{
    Router,
    routing::{get, post},
};
use dotenvy::dotenv;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use multiauth::AuthOrchestrator;

mod error;
mod handlers;
mod pages;
mod state;

use crate::{
    handlers::{
        index, logout, oauth_callback, oauth_start, password_login, protected, two_factor_page,
        two_factor_submit,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,multiauth=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let orchestrator = AuthOrchestrator::from_env().await.map_err(|e| e.log())?;
    tracing::info!("Configured providers: {:?}", orchestrator.providers());

    let state = Arc::new(AppState::new(orchestrator));

    let app = Router::new()
        .route("/", get(index))
        .route("/protected", get(protected))
        .route("/logout", get(logout))
        .route("/auth/callback", get(oauth_callback))
        .route("/auth/password", post(password_login))
        .route("/auth/2fa", get(two_factor_page).post(two_factor_submit))
        .route("/auth/{provider}", get(oauth_start))
        .with_state(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::debug!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
