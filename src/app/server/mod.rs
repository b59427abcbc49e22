//! HTTP server
//!
//! Serves the cached schedule, sponsor data and static assets. Handlers only
//! ever read the cache; fetch and decode failures never reach them.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /schedule` | Current snapshot in the wire format |
//! | `GET /healthz` | Status, version, session count, last refresh |
//! | `GET /sponsors/{diamond,platinum,gold}` | Configured tier image names |
//! | `GET /sponsors/all` | Every image in the sponsor directory |
//! | `GET /sponsors/images/*` | Sponsor image files |
//! | anything else | Frontend static files |

pub mod config;
pub mod routes;
pub mod sponsors;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::app::cache::ScheduleCache;
use crate::errors::ServerError;

pub use config::{AssetConfig, ServerConfig};
pub use routes::{router, HealthStatus};
pub use sponsors::{SponsorCatalog, SponsorTier};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub cache: Arc<ScheduleCache>,
    pub sponsors: Arc<SponsorCatalog>,
}

impl AppState {
    pub fn new(cache: Arc<ScheduleCache>, assets: &AssetConfig) -> Self {
        Self {
            cache,
            sponsors: Arc::new(SponsorCatalog::from_config(assets)),
        }
    }
}

/// A bound listener paired with its router
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl HttpServer {
    /// Bind the listener without serving yet
    ///
    /// Binding early lets startup fail fast on a taken port before the
    /// refresh scheduler is started.
    pub async fn bind(config: &ServerConfig, router: Router) -> Result<Self, ServerError> {
        let addr = config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        info!("Listening on {}", local_addr);
        Ok(Self {
            listener,
            router,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    ///
    /// The drain itself is unbounded here; callers bound it with a timeout
    /// around the returned future.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_bind_conflict() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: taken.local_addr().unwrap().port(),
            ..ServerConfig::default()
        };

        let result = HttpServer::bind(&config, Router::new()).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_graceful_shutdown() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let server = HttpServer::bind(&config, Router::new()).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(async move {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
