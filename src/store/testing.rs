use rusqlite::params;
use tempfile::TempDir;

use crate::db;
use crate::db::models::UserId;
use crate::store::{GraphStore, NewUser, SqliteGraphStore};

pub fn test_store() -> (SqliteGraphStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let pool = db::create_pool(&db_path).unwrap();
    db::run_migrations(&pool).unwrap();

    (SqliteGraphStore::new(pool), temp_dir)
}

/// Insert a normal user whose name and account are both `account`.
pub async fn add_user(store: &SqliteGraphStore, account: &str) -> UserId {
    store
        .insert_user(&NewUser {
            account: account.to_string(),
            email: format!("{account}@example.com"),
            name: account.to_string(),
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .unwrap()
        .unwrap()
}

pub fn make_admin(store: &SqliteGraphStore, id: UserId) {
    let conn = store.pool().get().unwrap();
    conn.execute(
        "UPDATE users SET role = 'admin' WHERE id = ?1",
        params![id],
    )
    .unwrap();
}
