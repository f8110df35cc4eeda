#![allow(dead_code)]

use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use villa_api::core::{AppState, StoreError};
use villa_api::entities::Villa;
use villa_api::repositories::{
    Entity, EntityStore, Filter, InMemoryStore, InMemoryTransaction,
};

/// Crea un AppState per i test sopra lo store fornito
pub fn create_test_state<S: EntityStore<Villa>>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}

/// Crea un TestServer per i test
///
/// # Arguments
/// * `state` - AppState da utilizzare per il server
///
/// # Returns
/// TestServer configurato e pronto per eseguire richieste
pub fn create_test_server<S: EntityStore<Villa>>(state: Arc<AppState<S>>) -> TestServer {
    let app = villa_api::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Server in memoria con uno store che conta le chiamate
pub fn recording_server() -> (TestServer, Arc<AppState<RecordingStore<Villa>>>) {
    let state = create_test_state(RecordingStore::new());
    (create_test_server(state.clone()), state)
}

/// Crea una villa via POST e restituisce il suo id
pub async fn create_villa(server: &TestServer, name: &str, rate: f64) -> i32 {
    let response = server
        .post("/villa")
        .json(&json!({
            "name": name,
            "detail": "Vista mare",
            "imageUrl": "https://img.example/villa.png",
            "occupancy": 4,
            "rate": rate,
            "area": 120,
            "amenities": "Piscina"
        }))
        .await;
    let body: Value = response.json();
    body["result"]["id"]
        .as_i64()
        .expect("created villa must carry an id") as i32
}

/// Legge una villa via GET e restituisce il campo `result` dell'envelope
pub async fn fetch_villa(server: &TestServer, id: i32) -> Value {
    let response = server.get(&format!("/villa/{}", id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["result"].clone()
}

/// Store in memoria che conta ogni accesso (letture e transazioni)
pub struct RecordingStore<T> {
    inner: InMemoryStore<T>,
    calls: AtomicUsize,
}

impl<T> RecordingStore<T> {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T: Entity> EntityStore<T> for RecordingStore<T> {
    type Transaction = InMemoryTransaction<T>;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.begin().await
    }

    async fn find_first(&self, filter: Option<&Filter<T::Column>>) -> Result<Option<T>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_first(filter).await
    }

    async fn find_all(&self, filter: Option<&Filter<T::Column>>) -> Result<Vec<T>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_all(filter).await
    }
}

/// Store in memoria con letture lente, come un database remoto.
/// Le transazioni non vengono rallentate.
pub struct SlowReadStore {
    inner: InMemoryStore<Villa>,
    delay: Duration,
}

impl SlowReadStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryStore::new(),
            delay,
        }
    }
}

impl EntityStore<Villa> for SlowReadStore {
    type Transaction = InMemoryTransaction<Villa>;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        self.inner.begin().await
    }

    async fn find_first(
        &self,
        filter: Option<&Filter<<Villa as Entity>::Column>>,
    ) -> Result<Option<Villa>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_first(filter).await
    }

    async fn find_all(
        &self,
        filter: Option<&Filter<<Villa as Entity>::Column>>,
    ) -> Result<Vec<Villa>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_all(filter).await
    }
}

/// Store che fallisce sempre, come un database irraggiungibile
pub struct FailingStore;

impl EntityStore<Villa> for FailingStore {
    type Transaction = InMemoryTransaction<Villa>;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        Err(Self::unavailable())
    }

    async fn find_first(
        &self,
        _filter: Option<&Filter<<Villa as Entity>::Column>>,
    ) -> Result<Option<Villa>, StoreError> {
        Err(Self::unavailable())
    }

    async fn find_all(
        &self,
        _filter: Option<&Filter<<Villa as Entity>::Column>>,
    ) -> Result<Vec<Villa>, StoreError> {
        Err(Self::unavailable())
    }
}

impl FailingStore {
    fn unavailable() -> StoreError {
        StoreError::Unavailable("connection refused".to_string())
    }
}
