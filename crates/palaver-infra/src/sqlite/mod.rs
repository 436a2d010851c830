//! SQLite persistence: pool setup, chat rows and local API keys.

pub mod api_keys;
pub mod chat;
pub mod pool;

#[cfg(test)]
pub(crate) async fn test_pool() -> pool::DatabasePool {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    // Keep the directory alive for the test's duration.
    std::mem::forget(dir);
    pool::DatabasePool::new(&url).await.unwrap()
}
