//! Shared helpers for pipeline tests against a mock platform

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use glctl_core::{ApiClient, Endpoints, PollingPolicy, RunOptions, SessionContext};
use serde_json::{Value, json};
use wiremock::MockServer;
use wiremock::Request;

pub const REGION: &str = "eu-central";

/// A mock server standing in for both API families
pub struct MockPlatform {
    pub server: MockServer,
    previews: Arc<Mutex<Vec<String>>>,
}

impl MockPlatform {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            previews: Arc::default(),
        }
    }

    /// Session against the mock with fast, bounded polling
    pub fn session(&self) -> SessionContext {
        let previews = self.previews.clone();
        let client = ApiClient::builder()
            .token("test-token")
            .preview_sink(Arc::new(move |text: &str| {
                previews.lock().unwrap().push(text.to_string())
            }))
            .build()
            .unwrap();

        SessionContext::new(client, Endpoints::new(self.server.uri(), self.server.uri()))
            .with_polling(PollingPolicy::uniform(10, Duration::from_millis(5)))
    }

    /// Dry-run previews rendered so far
    pub fn previews(&self) -> Vec<String> {
        self.previews.lock().unwrap().clone()
    }

    /// Received requests with the given method
    pub async fn requests(&self, method: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == method)
            .collect()
    }

    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .len()
    }
}

/// `{"items": [...], "count": n}`
pub fn items(values: Vec<Value>) -> Value {
    let count = values.len();
    json!({ "items": values, "count": count })
}

pub fn run() -> RunOptions {
    RunOptions::default()
}

pub fn dry_run() -> RunOptions {
    RunOptions {
        dry_run: true,
        force: false,
    }
}

pub fn forced() -> RunOptions {
    RunOptions {
        dry_run: false,
        force: true,
    }
}

pub fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
