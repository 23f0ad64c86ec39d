use std::sync::Arc;

use formguard_axum::PipelineState;
use formguard_axum::formguard::{InMemoryUserStore, SessionManager};

mod app;
mod handlers;
mod pages;
mod server;
mod snippets;

use crate::{
    app::{AppState, routes},
    server::{
        Ports, TlsFiles, check_transport, init_tracing, spawn_http_server, spawn_https_server,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install default CryptoProvider for rustls
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install default CryptoProvider")?;

    dotenvy::dotenv().ok();
    init_tracing(env!("CARGO_CRATE_NAME"));

    let users = Arc::new(InMemoryUserStore::new());
    let sessions = Arc::new(SessionManager::from_env().await?);
    let pipeline = PipelineState::new(sessions, users.clone());
    let app = routes(AppState::new(users), pipeline);

    let tls = TlsFiles::from_env();
    check_transport(tls.as_ref(), !cfg!(debug_assertions))?;

    let ports = Ports::from_env();
    let mut servers = vec![spawn_http_server(ports.http, app.clone())];
    if let Some(tls) = &tls {
        servers.push(spawn_https_server(ports.https, app, tls).await?);
    }

    for server in servers {
        server.await?;
    }
    Ok(())
}
