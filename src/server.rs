//! HTTP server initialization and lifecycle.
//!
//! Selects the storage backend, spawns the delete worker, serves the router
//! over HTTP or HTTPS, and drains everything on shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig as TlsServerConfig;
use tower::Service;

use crate::application::services::UrlService;
use crate::config::Config;
use crate::domain::delete_worker::DeleteWorker;
use crate::domain::repositories::UrlRepository;
use crate::infrastructure::persistence::{
    FileUrlRepository, MemoryUrlRepository, PgUrlRepository,
};
use crate::routes::app_router;
use crate::state::AppState;

/// Runs the service with the given configuration until `shutdown`
/// resolves.
///
/// Backend selection: a database DSN wins over a file storage path, which
/// wins over the in-memory default. The Postgres path runs pending
/// migrations before serving.
///
/// # Shutdown
///
/// The shutdown future is owned by the caller (the binary wires it to
/// process signals). When it resolves the server stops accepting
/// connections and drains in-flight requests; afterwards the delete worker
/// flushes its queue and the store closes, bounded by the
/// graceful-shutdown budget.
pub async fn run(
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let repository: Arc<dyn UrlRepository> = if !config.database_dsn.is_empty() {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_conns)
            .min_connections(config.database_min_conns)
            .max_lifetime(Duration::from_secs(config.database_conn_max_lifetime))
            .idle_timeout(Duration::from_secs(config.database_conn_max_idle_time))
            .connect(&config.database_dsn)
            .await
            .context("failed to connect to database")?;
        tracing::info!("connected to database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;

        Arc::new(PgUrlRepository::new(Arc::new(pool)))
    } else if !config.file_storage_path.is_empty() {
        Arc::new(
            FileUrlRepository::new(&config.file_storage_path, config.file_repository_config())
                .await
                .context("failed to open file storage")?,
        )
    } else {
        Arc::new(MemoryUrlRepository::new())
    };

    let worker = Arc::new(DeleteWorker::new(
        repository.clone(),
        config.delete_worker_config(),
    ));
    tracing::info!("delete worker started");

    let url_service = Arc::new(UrlService::new(repository, Some(worker)));

    let state = AppState {
        url_service: url_service.clone(),
        base_url: config.base_url.trim_end_matches('/').to_string(),
        auth_secret: config.auth_secret.clone(),
        trusted_subnet: config.trusted_network(),
    };

    let app = app_router(state);

    let listener = TcpListener::bind(&config.http_server_address)
        .await
        .with_context(|| format!("failed to bind {}", config.http_server_address))?;
    let scheme = if config.enable_https { "https" } else { "http" };
    tracing::info!("listening on {}://{}", scheme, config.http_server_address);

    let shutdown_budget = Duration::from_secs(config.graceful_shutdown_timeout);
    if config.enable_https {
        serve_tls(listener, app, &config, shutdown_budget, shutdown).await?;
    } else {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;
    }

    tracing::info!("HTTP server stopped, draining delete queue");
    match tokio::time::timeout(shutdown_budget, url_service.shutdown()).await {
        Ok(Ok(())) => tracing::info!("shutdown complete"),
        Ok(Err(e)) => tracing::error!(error = %e, "error while closing storage"),
        Err(_) => tracing::warn!("graceful shutdown budget exceeded, exiting anyway"),
    }

    Ok(())
}

/// Serves the router over TLS.
///
/// Accepted connections are handed to hyper individually; on shutdown the
/// accept loop stops and in-flight connections get the remaining budget to
/// finish.
async fn serve_tls(
    listener: TcpListener,
    app: Router,
    config: &Config,
    shutdown_budget: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let tls_config = load_tls_config(&config.tls_cert_path, &config.tls_key_path)?;
    let acceptor = TlsAcceptor::from(Arc::new(tls_config));

    let mut make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    let mut connections: JoinSet<()> = JoinSet::new();
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => {
                let (stream, remote_addr) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                // Reap finished connection tasks so the set stays small.
                while connections.try_join_next().is_some() {}

                let service = make_service
                    .call(remote_addr)
                    .await
                    .expect("infallible make service");
                let acceptor = acceptor.clone();

                connections.spawn(async move {
                    let stream = match acceptor.accept(stream).await {
                        Ok(stream) => stream,
                        Err(e) => {
                            tracing::warn!(error = %e, "TLS handshake failed");
                            return;
                        }
                    };

                    let stream = hyper_util::rt::TokioIo::new(stream);
                    let hyper_service =
                        hyper::service::service_fn(move |request| {
                            tower::ServiceExt::oneshot(service.clone(), request)
                        });

                    if let Err(e) = hyper_util::server::conn::auto::Builder::new(
                        hyper_util::rt::TokioExecutor::new(),
                    )
                    .serve_connection_with_upgrades(stream, hyper_service)
                    .await
                    {
                        tracing::debug!(error = %e, "error serving TLS connection");
                    }
                });
            }
        }
    }

    tracing::info!("draining in-flight TLS connections");
    let drain = async {
        while connections.join_next().await.is_some() {}
    };
    if tokio::time::timeout(shutdown_budget, drain).await.is_err() {
        tracing::warn!("connection drain exceeded shutdown budget");
        connections.abort_all();
    }

    Ok(())
}

fn load_tls_config(cert_path: &str, key_path: &str) -> Result<TlsServerConfig> {
    let certs = rustls_pemfile::certs(&mut std::io::BufReader::new(
        std::fs::File::open(cert_path)
            .with_context(|| format!("failed to open TLS certificate {cert_path}"))?,
    ))
    .collect::<std::result::Result<Vec<_>, _>>()
    .context("failed to parse TLS certificate")?;

    let key = rustls_pemfile::private_key(&mut std::io::BufReader::new(
        std::fs::File::open(key_path)
            .with_context(|| format!("failed to open TLS key {key_path}"))?,
    ))
    .context("failed to parse TLS key")?
    .context("no private key found in TLS key file")?;

    let mut tls_config = TlsServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("invalid TLS certificate/key pair")?;
    tls_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(tls_config)
}
