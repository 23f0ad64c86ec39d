use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub(crate) struct Ports {
    pub(crate) http: u16,
    pub(crate) https: u16,
}

impl Ports {
    pub(crate) fn from_env() -> Self {
        let port = |name: &str, default: u16| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            http: port("HTTP_PORT", 4000),
            https: port("HTTPS_PORT", 4443),
        }
    }
}

/// PEM certificate and key named by `TLS_CERT_FILE` and `TLS_KEY_FILE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TlsFiles {
    pub(crate) cert: String,
    pub(crate) key: String,
}

impl TlsFiles {
    pub(crate) fn from_env() -> Option<Self> {
        Some(Self {
            cert: std::env::var("TLS_CERT_FILE").ok()?,
            key: std::env::var("TLS_KEY_FILE").ok()?,
        })
    }
}

/// Session and CSRF cookies carry `Secure`, so browsers only return them over
/// HTTPS or to localhost. Plain HTTP alone is refused in release builds.
pub(crate) fn check_transport(tls: Option<&TlsFiles>, release: bool) -> Result<(), &'static str> {
    match (tls, release) {
        (Some(_), _) => Ok(()),
        (None, false) => {
            tracing::warn!(
                "TLS_CERT_FILE/TLS_KEY_FILE not set: serving plain HTTP only, \
                 cookies will be dropped by browsers not talking to localhost"
            );
            Ok(())
        }
        (None, true) => Err("TLS_CERT_FILE and TLS_KEY_FILE must be set in release builds"),
    }
}

pub(crate) fn spawn_http_server(port: u16, app: Router) -> JoinHandle<()> {
    tokio::spawn(async move {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        tracing::info!("HTTP server listening on {}", addr);
        if let Err(e) = axum_server::bind(addr)
            .serve(app.into_make_service())
            .await
        {
            tracing::error!("HTTP server stopped: {e}");
        }
    })
}

pub(crate) async fn spawn_https_server(
    port: u16,
    app: Router,
    tls: &TlsFiles,
) -> Result<JoinHandle<()>, std::io::Error> {
    let config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTPS server listening on {}", addr);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum_server::bind_rustls(addr, config)
            .serve(app.into_make_service())
            .await
        {
            tracing::error!("HTTPS server stopped: {e}");
        }
    }))
}

pub(crate) fn init_tracing(app_name: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        {
            format!("formguard_axum=debug,formguard=debug,{app_name}=trace,tower_http=info,info")
                .into()
        }

        #[cfg(not(debug_assertions))]
        {
            "info".into()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    #[cfg(debug_assertions)]
    tracing::info!("Debug build: detailed logging enabled by default");
    tracing::info!("Set RUST_LOG to change verbosity, e.g. RUST_LOG=debug ./demo-snippetbox");
}
