//! Server test utilities.

use sitegate_core::config::{AppConfig, EntityConfig};
use sitegate_core::{Domain, DomainFilter};
use sitegate_metadata::{DomainRepo, DomainRow, MetadataStore, SqliteStore};
use sitegate_server::bootstrap::build_registry;
use sitegate_server::{AppState, create_router};
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    store: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server seeded with `domains`.
    pub async fn new(domains: &[Domain]) -> Self {
        Self::with_config(domains, |_| {}).await
    }

    /// Create a test server with custom config modifications.
    ///
    /// A `pages` table (auto domain id) is always created and declared.
    pub async fn with_config<F>(domains: &[Domain], modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let mut config = AppConfig::for_testing(temp_dir.path());
        config.entities = vec![EntityConfig {
            kind: "page".to_string(),
            table: "pages".to_string(),
            filter: DomainFilter::new(true, false),
        }];
        modifier(&mut config);

        let store = Arc::new(
            SqliteStore::new(temp_dir.path().join("sitegate.db"), None)
                .await
                .expect("Failed to create metadata store"),
        );
        sqlx::query("CREATE TABLE pages (id TEXT PRIMARY KEY, domain_id TEXT)")
            .execute(store.pool())
            .await
            .expect("Failed to create pages table");

        for domain in domains {
            store
                .create_domain(&DomainRow::from(domain))
                .await
                .expect("Failed to seed domain");
        }

        let registry = build_registry(store.as_ref(), &config)
            .await
            .expect("Failed to build registry");
        let metadata: Arc<dyn MetadataStore> = store.clone();
        let state = AppState::new(config, metadata, registry);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Insert page rows, optionally already attached to a domain.
    pub async fn insert_pages(&self, pages: &[(&str, Option<&str>)]) {
        for (id, domain_id) in pages {
            sqlx::query("INSERT INTO pages (id, domain_id) VALUES (?, ?)")
                .bind(*id)
                .bind(*domain_id)
                .execute(self.store.pool())
                .await
                .expect("Failed to insert page");
        }
    }

    /// Domain identifier stored on a page row.
    pub async fn page_domain_id(&self, id: &str) -> Option<String> {
        sqlx::query_scalar::<_, Option<String>>("SELECT domain_id FROM pages WHERE id = ?")
            .bind(id)
            .fetch_one(self.store.pool())
            .await
            .expect("Failed to read page")
    }
}
