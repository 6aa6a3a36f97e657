//! ServerBuilder for fluent API to build HTTP servers

use super::entity_registry::{EntityDescriptor, EntityRegistry};
use anyhow::Result;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Builder for the storefront HTTP application
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .register(resources::products(stores.clone(), pages, auth.clone()))
///     .with_custom_routes(auth::routes(accounts))
///     .build();
/// ```
pub struct ServerBuilder {
    entity_registry: EntityRegistry,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            entity_registry: EntityRegistry::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Register a resource's routes
    pub fn register(mut self, descriptor: impl EntityDescriptor + 'static) -> Self {
        self.entity_registry.register(Box::new(descriptor));
        self
    }

    /// Add routes that don't fit the resource pattern, such as login
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    pub fn resources(&self) -> Vec<&str> {
        self.entity_registry.resources()
    }

    /// Build the final router: health check, resources, custom routes
    pub fn build(self) -> Router {
        let mut app = health_routes().merge(self.entity_registry.build_routes());
        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }
        app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "storefront"
    }))
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;

    struct Static(&'static str);

    impl EntityDescriptor for Static {
        fn entity_type(&self) -> &str {
            self.0
        }

        fn plural(&self) -> &str {
            self.0
        }

        fn build_routes(&self) -> Router {
            Router::new().route(&format!("/{}", self.0), get(|| async { "listed" }))
        }
    }

    #[test]
    fn test_register_collects_resources() {
        let builder = ServerBuilder::new().register(Static("things"));
        assert_eq!(builder.resources(), vec!["things"]);
    }

    #[tokio::test]
    async fn test_build_serves_health_resources_and_custom_routes() {
        let custom = Router::new().route("/custom", get(|| async { "ok" }));
        let app = ServerBuilder::default()
            .register(Static("things"))
            .with_custom_routes(custom)
            .build();
        let server = TestServer::try_new(app).unwrap();

        let health = server.get("/health").await;
        health.assert_status_ok();
        health.assert_json(&json!({"status": "ok", "service": "storefront"}));

        server.get("/things").await.assert_text("listed");
        server.get("/custom").await.assert_text("ok");
        server.get("/missing").await.assert_status_not_found();
    }
}
