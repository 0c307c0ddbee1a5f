use sqlx::SqlitePool;

use taskboard::adapters::sqlite::create_migrated_test_pool;

/// Fresh in-memory database with migrations applied. Each call is isolated.
pub async fn setup_test_db() -> SqlitePool {
    create_migrated_test_pool()
        .await
        .expect("failed to create test database")
}

pub async fn teardown_test_db(pool: SqlitePool) {
    pool.close().await;
}
