use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::agenda::agenda_router;
use super::auth::auth_router;
use super::billing::billing_router;
use super::me::me_router;
use super::superadmin::superadmin_router;
use super::uploads::serve_upload;
use crate::billing::StripeClient;
use crate::config::{Integrations, ServerConfig};
use crate::mail::Mailer;
use crate::oauth::OAuthProviders;
use crate::store::Store;

/// Request bodies above this are rejected before reaching a handler.
/// Restore uploads are the largest legitimate payload.
const MAX_BODY_BYTES: usize = 512 * 1024 * 1024;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub http: reqwest::Client,
    pub oauth: OAuthProviders,
    pub stripe: Option<StripeClient>,
    pub data_dir: PathBuf,
    /// Base for links in mail and OAuth redirects, without a trailing slash.
    pub public_base_url: String,
    pub session_ttl: chrono::Duration,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        config: &ServerConfig,
        integrations: &Integrations,
    ) -> Self {
        let http = reqwest::Client::new();
        let stripe = integrations
            .stripe
            .clone()
            .map(|settings| StripeClient::new(http.clone(), settings));

        Self {
            store,
            mailer,
            oauth: OAuthProviders::from_integrations(integrations),
            stripe,
            http,
            data_dir: config.data_dir.clone(),
            public_base_url: config.public_base_url(),
            session_ttl: chrono::Duration::hours(config.session_ttl_hours),
        }
    }

    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    #[must_use]
    pub fn backups_dir(&self) -> PathBuf {
        crate::backup::backups_dir(&self.data_dir)
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/uploads/{kind}/{file}", get(serve_upload))
        .nest("/api/v1/auth", auth_router())
        .nest("/api/v1/me", me_router())
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1/superadmin", superadmin_router())
        .nest("/api/v1", agenda_router().merge(billing_router()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::mail::MemoryMailer;
    use crate::store::SqliteStore;

    fn app() -> (TempDir, Router) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        let config = ServerConfig {
            data_dir: temp.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let state = AppState::new(
            Arc::new(store),
            Arc::new(MemoryMailer::new()),
            &config,
            &Integrations::default(),
        );
        (temp, create_router(Arc::new(state)))
    }

    #[tokio::test]
    async fn test_health() {
        let (_temp, app) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_tenant_routes_require_session() {
        let (_temp, app) = app();
        let response = app
            .oneshot(Request::get("/api/v1/resources").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("www-authenticate"));
    }

    #[tokio::test]
    async fn test_unconfigured_oauth_provider_is_not_found() {
        let (_temp, app) = app();
        let response = app
            .oneshot(
                Request::get("/api/v1/auth/oauth/google/start")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
