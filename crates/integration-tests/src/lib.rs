//! End-to-end tests for Cartwheel.
//!
//! Each test spawns the full router (middleware chain included) on an
//! ephemeral port, backed by the in-memory store, and talks to it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartwheel-integration-tests
//! ```

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};

use cartwheel_server::config::{MEMORY_DATABASE_URL, ServerConfig};
use cartwheel_server::db::{MemoryStore, Store};
use cartwheel_server::state::AppState;

/// Email of the catalog administrator in every test server.
pub const ADMIN_EMAIL: &str = "admin@shop.test";

/// Password used by [`TestServer::login_as`].
pub const PASSWORD: &str = "secret";

const TOKEN_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

/// A running server and a client pointed at it.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub config: ServerConfig,
}

impl TestServer {
    /// Spawn a server with the default test configuration.
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    /// Spawn a server with `config`.
    pub async fn spawn_with(config: ServerConfig) -> Self {
        Self::spawn_on(config, Arc::new(MemoryStore::new())).await
    }

    /// Spawn a server with `config` over `store`.
    pub async fn spawn_on(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        let state = AppState::new(config.clone(), store);
        let app = cartwheel_server::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            config,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.client.patch(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// `POST /account`.
    pub async fn sign_up(&self, username: &str, email: &str, password: &str) -> Response {
        self.post("/account")
            .json(&json!({
                "username": username,
                "firstname": "Test",
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to send sign-up request")
    }

    /// `POST /token`.
    pub async fn request_token(&self, email: &str, password: &str) -> Response {
        self.post("/token")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to send token request")
    }

    /// Sign up `username` / `email` and return a bearer token for it.
    pub async fn login_as(&self, username: &str, email: &str) -> String {
        let resp = self.sign_up(username, email, PASSWORD).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "sign-up of {email}");

        let resp = self.request_token(email, PASSWORD).await;
        assert_eq!(resp.status(), StatusCode::OK, "token for {email}");
        token_from(resp).await
    }

    /// Bearer token for the catalog administrator, signing the admin up on
    /// first use.
    pub async fn admin_token(&self) -> String {
        let resp = self.request_token(ADMIN_EMAIL, PASSWORD).await;
        if resp.status() == StatusCode::OK {
            return token_from(resp).await;
        }
        // A concurrent test on a shared database may win the sign-up.
        self.sign_up("admin", ADMIN_EMAIL, PASSWORD).await;

        let resp = self.request_token(ADMIN_EMAIL, PASSWORD).await;
        assert_eq!(resp.status(), StatusCode::OK, "token for {ADMIN_EMAIL}");
        token_from(resp).await
    }

    /// Create a product as `admin_token` and return its id.
    pub async fn create_product(&self, admin_token: &str, product: &Value) -> i64 {
        let resp = self
            .post("/products")
            .bearer_auth(admin_token)
            .json(product)
            .send()
            .await
            .expect("Failed to send product request");
        assert_eq!(resp.status(), StatusCode::CREATED, "create product");

        let body: Value = resp.json().await.expect("Failed to parse product body");
        body["data"]["id"].as_i64().expect("product id missing")
    }
}

/// Server configuration used by [`TestServer::spawn`].
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig::new(
        SecretString::from(MEMORY_DATABASE_URL),
        SecretString::from(TOKEN_SECRET),
        ADMIN_EMAIL,
    )
}

async fn token_from(resp: Response) -> String {
    let body: Value = resp.json().await.expect("Failed to parse token body");
    body["token"]
        .as_str()
        .expect("token field missing")
        .to_owned()
}

/// Read a response body as JSON.
pub async fn json_body(resp: Response) -> Value {
    resp.json().await.expect("Failed to parse response body")
}
