use std::sync::Arc;

use agenda::cli::{SuperadminSeed, seed};
use agenda::config::{Integrations, ServerConfig};
use agenda::mail::{MemoryMailer, extract_token};
use agenda::server::{AppState, create_router};
use agenda::store::{SqliteStore, Store};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const SUPERADMIN_EMAIL: &str = "root@agenda.test";
pub const PASSWORD: &str = "segredo123";

pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub store: Arc<dyn Store>,
    pub mailer: Arc<MemoryMailer>,
    client: Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(Integrations::default(), |_| {}).await
    }

    /// Starts a server whose state can be adjusted before it begins serving.
    pub async fn start_with<F>(integrations: Integrations, configure: F) -> Self
    where
        F: FnOnce(&mut AppState),
    {
        let temp_dir = TempDir::new().expect("create temp dir");

        let store = SqliteStore::new(temp_dir.path().join("agenda.db")).expect("open store");
        store.initialize().expect("initialize store");
        seed(
            &store,
            &SuperadminSeed {
                email: SUPERADMIN_EMAIL.to_string(),
                password: Some(PASSWORD.to_string()),
            },
        )
        .expect("seed store");
        let store: Arc<dyn Store> = Arc::new(store);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{addr}");

        let config = ServerConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            data_dir: temp_dir.path().to_path_buf(),
            public_base_url: Some(base_url.clone()),
            ..ServerConfig::default()
        };

        let mailer = Arc::new(MemoryMailer::new());
        let mut state = AppState::new(store.clone(), mailer.clone(), &config, &integrations);
        configure(&mut state);

        let app = create_router(Arc::new(state));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url,
            store,
            mailer,
            client: Client::new(),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Sends a JSON request and returns the status with the decoded body.
    ///
    /// Empty or non-JSON bodies decode to `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.expect("send request");
        let status = response.status();
        let text = response.text().await.expect("read body");
        (status, serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    pub async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, path, Some(token), None).await
    }

    pub async fn post_public(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, None, Some(body)).await
    }

    /// Uploads `content` as the multipart field `field`.
    pub async fn upload(
        &self,
        path: &str,
        token: &str,
        field: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> (StatusCode, Value) {
        let part = Part::bytes(content).file_name(filename.to_string());
        let form = Form::new().part(field.to_string(), part);

        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("send upload");
        let status = response.status();
        let text = response.text().await.expect("read body");
        (status, serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    /// Points the session at `escola_id`.
    pub async fn select_school(&self, token: &str, escola_id: &str) {
        let (status, body) = self
            .post("/api/v1/me/escola", token, json!({ "escola_id": escola_id }))
            .await;
        assert_eq!(status, StatusCode::OK, "select school failed: {body}");
    }

    /// Token carried by the most recent mail sent to `email`.
    pub fn mail_token(&self, email: &str) -> String {
        let message = self
            .mailer
            .last_to(email)
            .unwrap_or_else(|| panic!("no mail sent to {email}"));
        extract_token(&message.body).expect("token in mail body")
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_public(
            "/api/v1/auth/login",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn login_token(&self, email: &str, password: &str) -> String {
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"]
            .as_str()
            .expect("session token")
            .to_string()
    }

    pub async fn superadmin_token(&self) -> String {
        self.login_token(SUPERADMIN_EMAIL, PASSWORD).await
    }

    /// Registers a school, confirms its admin and returns `(token, escola_id)`.
    pub async fn register_school(&self, escola_nome: &str, nome: &str, email: &str) -> (String, String) {
        let (status, body) = self
            .post_public(
                "/api/v1/auth/register",
                json!({
                    "escola_nome": escola_nome,
                    "nome": nome,
                    "email": email,
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let escola_id = body["data"]["escola"]["id"]
            .as_str()
            .expect("escola id")
            .to_string();

        let token = self.mail_token(email);
        let (status, body) = self
            .post_public("/api/v1/auth/confirm", json!({ "token": token }))
            .await;
        assert_eq!(status, StatusCode::OK, "confirm failed: {body}");

        (self.login_token(email, PASSWORD).await, escola_id)
    }

    /// Creates a resource with a morning template and returns its id.
    pub async fn create_resource(&self, token: &str, name: &str, min_agendamento_dias: i64) -> String {
        let (status, body) = self
            .post(
                "/api/v1/admin/resources",
                token,
                json!({ "name": name, "min_agendamento_dias": min_agendamento_dias }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create resource failed: {body}");
        let id = body["data"]["id"].as_str().expect("resource id").to_string();

        let (status, body) = self
            .put(
                &format!("/api/v1/admin/resources/{id}/schedules/matutino"),
                token,
                json!({
                    "slots": [
                        { "name": "1ª aula" },
                        { "name": "Intervalo", "type": "intervalo" },
                        { "name": "2ª aula" },
                    ]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "schedule failed: {body}");

        id
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
