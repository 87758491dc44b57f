//! Development server over the generated output directory.

mod middleware;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use axum::{Router, middleware as axum_middleware, routing::get};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    config::{ServerSettings, TlsSettings},
    infra::{assets, error::InfraError},
};

use self::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    root: Arc<PathBuf>,
}

impl HttpState {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(assets::serve_root))
        .route("/{*path}", get(assets::serve_path))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
        .with_state(state)
}

/// Load the PEM certificate chain and key named by `tls`.
pub async fn tls_config(tls: &TlsSettings) -> Result<RustlsConfig, InfraError> {
    RustlsConfig::from_pem_file(&tls.cert, &tls.key)
        .await
        .map_err(|err| {
            InfraError::server(format!(
                "failed to load TLS certificate `{}` and key `{}`: {err}",
                tls.cert.display(),
                tls.key.display()
            ))
        })
}

/// How a running listener is told to stop accepting connections.
enum Shutdown {
    Plain(oneshot::Sender<()>),
    Tls(Handle),
}

impl Shutdown {
    fn trigger(self, grace: Duration) {
        match self {
            Self::Plain(sender) => {
                let _ = sender.send(());
            }
            Self::Tls(handle) => handle.graceful_shutdown(Some(grace)),
        }
    }
}

/// Serve `state` until Ctrl-C, then give in-flight requests up to
/// `graceful_shutdown` to finish. `background` is aborted on the way out.
/// With `settings.tls` set the listener speaks HTTPS.
pub async fn serve(
    settings: &ServerSettings,
    state: HttpState,
    background: Option<JoinHandle<()>>,
) -> Result<(), InfraError> {
    let root = state.root().display().to_string();
    let app = build_router(state).into_make_service();

    let (mut server, shutdown) = match settings.tls.as_ref() {
        None => {
            let listener = TcpListener::bind(settings.addr).await?;
            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let task = tokio::spawn(async move { server.await });
            (task, Shutdown::Plain(shutdown_tx))
        }
        Some(tls) => {
            let config = tls_config(tls).await?;
            let handle = Handle::new();
            let server = axum_server::bind_rustls(settings.addr, config)
                .handle(handle.clone())
                .serve(app);
            let task = tokio::spawn(async move { server.await });
            (task, Shutdown::Tls(handle))
        }
    };
    info!(
        target = "stipple::http",
        addr = %settings.addr,
        root = %root,
        tls = settings.tls.is_some(),
        "Serving output directory"
    );

    let result = tokio::select! {
        joined = &mut server => Some(flatten(joined)),
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|err| InfraError::server(format!("failed to listen for Ctrl-C: {err}")))?;
            info!(target = "stipple::http", "Shutdown requested");
            None
        }
    };

    let result = match result {
        Some(result) => result,
        None => {
            shutdown.trigger(settings.graceful_shutdown);
            drain(server, settings.graceful_shutdown).await
        }
    };

    if let Some(handle) = background {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn drain(
    server: JoinHandle<std::io::Result<()>>,
    grace: Duration,
) -> Result<(), InfraError> {
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            warn!(
                target = "stipple::http",
                grace_ms = grace.as_millis() as u64,
                "Graceful shutdown timed out"
            );
            Ok(())
        }
    }
}

fn flatten(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), InfraError> {
    match joined {
        Ok(result) => result.map_err(|err| InfraError::server(err.to_string())),
        Err(err) => Err(InfraError::task(err.to_string())),
    }
}
