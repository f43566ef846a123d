use std::sync::Arc;

use axum_test::TestServer;
use crud_service::infrastructure::memory::MemoryStore;
use crud_service::{create_routes, AppState};

pub fn test_server() -> (TestServer, MemoryStore) {
    let store = MemoryStore::new();
    let app = create_routes(AppState::from_store(Arc::new(store.clone())));
    let server = TestServer::new(app).unwrap();
    (server, store)
}
