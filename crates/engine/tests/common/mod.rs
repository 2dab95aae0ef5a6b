#![allow(dead_code)]

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::Engine;
use migration::MigratorTrait;

/// Fresh in-memory database with users `alice`, `bob`, `carol` and `mallory`,
/// and group `g1` (JPY) whose members are alice, bob and carol.
pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    for user in ["alice", "bob", "carol", "mallory"] {
        exec(
            &db,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![user.into(), "password".into()],
        )
        .await;
    }
    group(&db, "g1", "JPY", &["alice", "bob", "carol"]).await;

    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<sea_orm::Value>) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(backend, sql, values))
        .await
        .unwrap();
}

pub async fn group(db: &DatabaseConnection, id: &str, currency: &str, members: &[&str]) {
    exec(
        db,
        "INSERT INTO purchase_groups (id, name, currency) VALUES (?, ?, ?)",
        vec![id.into(), format!("group {id}").into(), currency.into()],
    )
    .await;
    for member in members {
        exec(
            db,
            "INSERT INTO group_members (group_id, user_id) VALUES (?, ?)",
            vec![id.into(), (*member).into()],
        )
        .await;
    }
}

/// Inserts a purchase; `seq` orders purchases in time.
pub async fn purchase(
    db: &DatabaseConnection,
    id: &str,
    group_id: &str,
    purchased_by: &str,
    total_minor: i64,
    currency: &str,
    seq: i64,
) {
    let purchased_at = Utc::now() - Duration::minutes(60 - seq);
    exec(
        db,
        "INSERT INTO purchases (id, group_id, purchased_by, total_amount_minor, currency, purchased_at) VALUES (?, ?, ?, ?, ?, ?)",
        vec![
            id.into(),
            group_id.into(),
            purchased_by.into(),
            total_minor.into(),
            currency.into(),
            purchased_at.into(),
        ],
    )
    .await;
}

pub async fn item(db: &DatabaseConnection, id: &str, purchase_id: &str, quantity: i64) {
    exec(
        db,
        "INSERT INTO purchase_items (id, purchase_id, name, quantity) VALUES (?, ?, ?, ?)",
        vec![
            id.into(),
            purchase_id.into(),
            format!("item {id}").into(),
            quantity.into(),
        ],
    )
    .await;
}
