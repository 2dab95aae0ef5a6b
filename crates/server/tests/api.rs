use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use axum_extra::headers::{Authorization, HeaderMapExt};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, Value};
use serde_json::{Value as Json, json};
use std::sync::Arc;
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerState, router};

async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<Value>) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(backend, sql, values))
        .await
        .unwrap();
}

/// Group `g1` (EUR) with alice, bob and carol; mallory exists but is not a
/// member. Alice bought `p1` for 30.00 and bob bought `p2` for 12.00.
async fn app() -> Router {
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
    exec(
        &db,
        "INSERT INTO purchase_groups (id, name, currency) VALUES (?, ?, ?)",
        vec!["g1".into(), "flat".into(), "EUR".into()],
    )
    .await;
    for member in ["alice", "bob", "carol"] {
        exec(
            &db,
            "INSERT INTO group_members (group_id, user_id) VALUES (?, ?)",
            vec!["g1".into(), member.into()],
        )
        .await;
    }
    for (id, buyer, total) in [("p1", "alice", 3000_i64), ("p2", "bob", 1200)] {
        exec(
            &db,
            "INSERT INTO purchases (id, group_id, purchased_by, total_amount_minor, currency, purchased_at) VALUES (?, ?, ?, ?, ?, ?)",
            vec![
                id.into(),
                "g1".into(),
                buyer.into(),
                total.into(),
                "EUR".into(),
                Utc::now().into(),
            ],
        )
        .await;
    }

    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

fn request(method: &str, uri: &str, user: Option<(&str, &str)>, body: Option<Json>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let mut request = builder.body(body).unwrap();
    if let Some((username, password)) = user {
        request
            .headers_mut()
            .typed_insert(Authorization::basic(username, password));
    }
    request
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Json) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

const ALICE: Option<(&str, &str)> = Some(("alice", "password"));

fn equal_everyone() -> Json {
    json!({ "rule": "equal", "participant_ids": ["alice", "bob", "carol"] })
}

#[tokio::test]
async fn missing_or_wrong_credentials_are_unauthorized() {
    let app = app().await;

    let (status, _) = send(&app, request("GET", "/splits/purchases/p1", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request("GET", "/splits/purchases/p1", Some(("alice", "wrong")), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn calculate_previews_without_storing() {
    let app = app().await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/splits/purchases/p1/calculate",
            ALICE,
            Some(json!({ "rule": "equal", "participant_ids": ["bob", "alice"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "EUR");
    assert_eq!(body["rule"], "equal");
    assert_eq!(body["total_amount"], "30.00");
    assert_eq!(body["splits"][0]["user_id"], "alice");
    assert_eq!(body["splits"][0]["share_amount"], "15.00");
    assert_eq!(body["splits"][1]["user_id"], "bob");

    let (status, body) = send(&app, request("GET", "/splits/purchases/p1", ALICE, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn confirm_then_get_returns_stored_split() {
    let app = app().await;

    let (status, stored) = send(
        &app,
        request(
            "POST",
            "/splits/purchases/p1",
            ALICE,
            Some(json!({
                "rule": "custom",
                "custom_splits": [
                    { "user_id": "alice", "percentage": "33.3333" },
                    { "user_id": "bob", "percentage": "33.3333" },
                    { "user_id": "carol", "percentage": 33.3334 }
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["splits"][0]["share_amount"], "10.00");

    let (status, read) = send(
        &app,
        request("GET", "/splits/purchases/p1", Some(("carol", "password")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read, stored);
}

#[tokio::test]
async fn validation_failures_map_to_422() {
    let app = app().await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/splits/purchases/p1/calculate",
            ALICE,
            Some(json!({
                "rule": "custom",
                "custom_splits": [
                    { "user_id": "alice", "percentage": "50" },
                    { "user_id": "bob", "percentage": "40" }
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/splits/purchases/p1/calculate",
            ALICE,
            Some(json!({ "rule": "equal", "participant_ids": ["alice", "mallory"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn out_of_range_percentage_is_rejected() {
    let app = app().await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/splits/purchases/p1/calculate",
            ALICE,
            Some(json!({
                "rule": "custom",
                "custom_splits": [
                    { "user_id": "alice", "percentage": "79228162514264337593543950335" }
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = app().await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/splits/purchases/p1/calculate",
            ALICE,
            Some(json!({ "rule": "weighted", "participant_ids": ["alice"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn non_member_is_forbidden() {
    let app = app().await;
    let mallory = Some(("mallory", "password"));

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/splits/purchases/p1",
            mallory,
            Some(equal_everyone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request("GET", "/splits/groups/g1/settlement", mallory, None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_purchase_is_not_found() {
    let app = app().await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/splits/purchases/nope/calculate",
            ALICE,
            Some(equal_everyone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn settlement_nets_group_history() {
    let app = app().await;
    for purchase in ["p1", "p2"] {
        let (status, _) = send(
            &app,
            request(
                "POST",
                &format!("/splits/purchases/{purchase}"),
                ALICE,
                Some(equal_everyone()),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        request("GET", "/splits/groups/g1/settlement", ALICE, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_spend"], "42.00");
    assert_eq!(body["average_per_person"], "14.00");
    assert_eq!(body["member_count"], 3);
    assert_eq!(
        body["settlements"],
        json!([
            { "debtor_id": "carol", "creditor_id": "alice", "amount": "14.00" },
            { "debtor_id": "bob", "creditor_id": "alice", "amount": "2.00" }
        ])
    );
    assert_eq!(body["balances"][0]["user_id"], "alice");
    assert_eq!(body["balances"][0]["net"], "16.00");
}
