//! Database tests

use super::*;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

#[tokio::test]
async fn test_database_connection() {
    let (db, _temp_dir) = create_test_db().await;
    assert_eq!(db.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_user_insert_and_get() {
    let (db, _temp_dir) = create_test_db().await;

    let mut user = UserRecord::new("alice");
    user.public_key_pem = "test_public_key".to_string();
    user.private_key_pem = "test_private_key".to_string();

    assert!(db.insert_user(&user).await.unwrap());

    let retrieved = db.get_user("alice").await.unwrap().unwrap();
    assert_eq!(retrieved.id, user.id);
    assert_eq!(retrieved.public_key_pem, "test_public_key");
    assert_eq!(retrieved.private_key_pem, "test_private_key");

    assert!(db.get_user("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_user_keeps_existing_row() {
    let (db, _temp_dir) = create_test_db().await;

    let first = UserRecord::new("alice");
    assert!(db.insert_user(&first).await.unwrap());

    let second = UserRecord::new("alice");
    assert!(!db.insert_user(&second).await.unwrap());

    let retrieved = db.get_user("alice").await.unwrap().unwrap();
    assert_eq!(retrieved.id, first.id);
    assert_eq!(db.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_set_key_pair_only_fills_missing_keys() {
    let (db, _temp_dir) = create_test_db().await;
    db.insert_user(&UserRecord::new("alice")).await.unwrap();

    assert!(db.set_key_pair("alice", "public-1", "private-1").await.unwrap());
    assert!(!db.set_key_pair("alice", "public-2", "private-2").await.unwrap());
    assert!(!db.set_key_pair("nobody", "public", "private").await.unwrap());

    let retrieved = db.get_user("alice").await.unwrap().unwrap();
    assert_eq!(retrieved.public_key_pem, "public-1");
    assert_eq!(retrieved.private_key_pem, "private-1");
}

#[tokio::test]
async fn test_directory_view_hides_private_key() {
    let (db, _temp_dir) = create_test_db().await;

    let mut user = UserRecord::new("alice");
    user.public_key_pem = "public".to_string();
    user.private_key_pem = "private".to_string();
    db.insert_user(&user).await.unwrap();
    db.insert_user(&UserRecord::new("bob")).await.unwrap();

    let identity = db.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(identity, ActorIdentity::new("alice", "public"));

    let unkeyed = db.find_by_username("bob").await.unwrap().unwrap();
    assert_eq!(unkeyed.public_key_pem, "");

    assert_eq!(UserDirectory::count(&db).await.unwrap(), 2);
    assert_eq!(db.list_usernames().await.unwrap(), vec!["alice", "bob"]);
}
