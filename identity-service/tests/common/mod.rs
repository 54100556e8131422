use std::sync::Arc;

use auth::Authenticator;
use auth::ManualClock;
use auth::PasswordHasher;
use auth::SigningKey;
use auth::TokenService;
use chrono::Duration;
use chrono::Utc;
use identity_service::domain::user::service::AuthGate;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryUserStore;
use serde_json::json;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub clock: Arc<ManualClock>,
    pub authenticator: Arc<Authenticator>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let clock = Arc::new(ManualClock::new(Utc::now()));
        let token_service = TokenService::new(
            SigningKey::from_secret(TEST_SECRET).expect("Failed to create signing key"),
        )
        .with_clock(clock.clone())
        .with_validity(Duration::hours(TokenService::DEFAULT_VALIDITY_HOURS));

        // Lowest bcrypt cost keeps the suite fast
        let password_hasher =
            PasswordHasher::with_cost(PasswordHasher::MIN_COST).expect("Invalid bcrypt cost");
        let authenticator = Arc::new(Authenticator::new(password_hasher, token_service));

        let auth_gate = Arc::new(AuthGate::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::clone(&authenticator),
        ));

        let router = create_router(auth_gate);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            clock,
            authenticator,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to register a user
    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/api/register")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/api/login")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register then log in, returning the issued token
    pub async fn register_and_login(&self, username: &str, password: &str) -> String {
        let response = self.register(username, password).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let response = self.login(username, password).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }
}
