use std::{net::SocketAddr, sync::Arc};

use bson::Document;
use memberdir_api::{build_router, state::AppState};
use memberdir_config::{RuntimeEnv, Settings};
use memberdir_db::{connect, indexes::ensure_indexes};
use memberdir_services::{MemberBulkStore, MemberDao, MemberStore, MemoryMemberStore};
use mongodb::Database;
use serde_json::Value;
use tokio::net::TcpListener;

use super::seed::sample_members;

/// A running test server in front of a member store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub settings: Settings,
    pub client: reqwest::Client,
    /// Set when the server talks to a real MongoDB database.
    pub db: Option<Database>,
}

impl TestApp {
    /// Spawn a server over the in-memory sample members.
    pub async fn spawn() -> Self {
        Self::spawn_with_store(Arc::new(MemoryMemberStore::with_documents(sample_members()))).await
    }

    pub async fn spawn_with_store(store: Arc<dyn MemberStore>) -> Self {
        Self::spawn_with(store, |_| {}).await
    }

    /// Spawn with customized settings.
    ///
    /// The `mutator` closure receives a `&mut Settings` after test defaults
    /// are applied.
    pub async fn spawn_with(
        store: Arc<dyn MemberStore>,
        mutator: impl FnOnce(&mut Settings),
    ) -> Self {
        let mut settings = test_settings();
        mutator(&mut settings);
        Self::serve(AppState::new(store, settings.clone()), settings, None).await
    }

    /// Spawn against a real MongoDB seeded with `docs`.
    ///
    /// Requires a running MongoDB at localhost:27017.
    /// Set MEMBERDIR__DATABASE__URL env var to override the connection string.
    /// Each test gets a unique database name for isolation.
    pub async fn spawn_mongo(docs: Vec<Document>) -> Self {
        let mut settings = test_settings();
        if let Ok(url) = std::env::var("MEMBERDIR__DATABASE__URL") {
            settings.database.url = url;
        }
        settings.database.name = format!("memberdir_test_{}", uuid::Uuid::new_v4().simple());

        let db = connect(&settings).await.expect("Failed to connect to MongoDB");
        ensure_indexes(&db, &settings.members.collection)
            .await
            .expect("Failed to create indexes");

        let dao = MemberDao::new(&db, &settings.members.collection);
        dao.insert_batch(docs).await.expect("Failed to seed members");

        let state = AppState::from_database(&db, settings.clone());
        Self::serve(state, settings, Some(db)).await
    }

    async fn serve(state: AppState, settings: Settings, db: Option<Database>) -> Self {
        let app = build_router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            addr,
            base_url: format!("http://{}", addr),
            settings,
            client: reqwest::Client::new(),
            db,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and return the status with the parsed JSON body.
    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    /// Ids of the members returned for `path`, in response order.
    pub async fn member_ids(&self, path: &str) -> Vec<String> {
        let (status, body) = self.get_json(path).await;
        assert_eq!(status, 200, "unexpected body: {body}");
        body["data"]["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap().to_string())
            .collect()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            // Best effort cleanup: drop the test database
            tokio::spawn(async move {
                let _ = db.drop().await;
            });
        }
    }
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.app.host = "127.0.0.1".to_string();
    settings.app.port = 0;
    settings.app.environment = RuntimeEnv::Test;
    settings.rate_limit.enabled = false;
    settings
}
