use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use credential_service::auth::{CredentialService, TokenCodec};
use credential_service::configuration::JwtSettings;
use credential_service::startup::run;
use credential_service::store::{InMemoryTokenStateStore, InMemoryUserStore};

#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub tokens: InMemoryTokenStateStore,
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let tokens = InMemoryTokenStateStore::new();
    let codec = TokenCodec::new(&JwtSettings {
        secret: "http-test-secret-key".to_string(),
    });
    let service = CredentialService::new(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(tokens.clone()),
        codec,
        Duration::from_secs(5),
    );

    let server = run(listener, service).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp { address, tokens }
}
