//! Listener process: bind, serve, shut down

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use urlblock_core::EventLog;

use crate::api;
use crate::config::ListenerConfig;
use crate::error::{ListenerError, ListenerResult};

/// The report listener, owning its event log
pub struct ListenerServer {
    config: ListenerConfig,
    log: Arc<EventLog>,
}

impl ListenerServer {
    /// Create a listener with an empty log sized from the configuration
    pub fn new(config: ListenerConfig) -> Self {
        let log = Arc::new(EventLog::new(config.max_requests));
        Self { config, log }
    }

    /// Handle to the event log served by this listener
    pub fn log(&self) -> Arc<EventLog> {
        Arc::clone(&self.log)
    }

    /// Effective configuration
    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Bind the listen socket
    pub async fn bind(self) -> ListenerResult<BoundListener> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::Bind { addr, source })?;

        Ok(BoundListener {
            listener,
            local_addr,
            router: api::router(Arc::clone(&self.log)),
            capacity: self.log.capacity(),
        })
    }
}

/// A listener whose socket is bound but not yet serving
pub struct BoundListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
    capacity: usize,
}

impl BoundListener {
    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until Ctrl-C
    pub async fn serve(self) -> ListenerResult<()> {
        self.serve_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `signal` resolves, then finish in-flight requests
    pub async fn serve_with_shutdown<F>(self, signal: F) -> ListenerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.local_addr, max_requests = self.capacity, "URL blocker listener running");
        if !self.local_addr.ip().is_loopback() {
            warn!(addr = %self.local_addr, "listening on a non-loopback interface; reports are unauthenticated");
        }
        info!("endpoints: POST / | GET / (?latest=true) | GET /ping | DELETE /cleanup");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
            .map_err(ListenerError::Serve)?;

        info!("URL blocker listener stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let config = ListenerConfig::default()
            .with_port(0)
            .with_max_requests(NonZeroUsize::new(4).unwrap());
        let server = ListenerServer::new(config);
        assert_eq!(server.log().capacity(), 4);

        let bound = server.bind().await.unwrap();
        assert!(bound.local_addr().ip().is_loopback());
        assert_ne!(bound.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let first = ListenerServer::new(ListenerConfig::default().with_port(0))
            .bind()
            .await
            .unwrap();
        let taken = first.local_addr().port();

        let err = ListenerServer::new(ListenerConfig::default().with_port(taken))
            .bind()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_graceful_shutdown() {
        let bound = ListenerServer::new(ListenerConfig::default().with_port(0))
            .bind()
            .await
            .unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(bound.serve_with_shutdown(async {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
