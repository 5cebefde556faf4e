use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use bluemarket_engine::{
    db_types::Role,
    test_utils::prepare_env::{drop_database, new_test_db},
    AccountApi,
    MarketplaceDatabase,
    SqliteDatabase,
};
use serde_json::json;

use super::helpers::{get, issue_token, issuer, json, post, send};
use crate::{
    middleware::JwtMiddlewareFactory,
    routes::{CheckTokenRoute, LoginRoute, ProfileRoute, RegisterRoute},
};

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = AccountApi::new(db);
        cfg.app_data(web::Data::new(api))
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(
                web::scope("/api")
                    .wrap(JwtMiddlewareFactory::new(issuer()))
                    .service(CheckTokenRoute::new())
                    .service(ProfileRoute::<SqliteDatabase>::new()),
            );
    }
}

async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    let _ = db.close().await;
    drop_database(&url).await;
}

#[actix_web::test]
async fn register_log_in_and_view_profile() {
    let db = new_test_db(5).await;
    let registration = json!({
        "email": "Alice@Example.com",
        "password": "correct horse",
        "kind": "customer",
        "name": "Alice",
    });
    let (status, body) = send(post("/register", "", &registration), configure(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let registered = json(&body);
    assert_eq!(registered["account"]["email"], "alice@example.com");
    assert!(registered["account"].get("password_hash").is_none());

    let login = json!({ "email": "alice@example.com", "password": "correct horse" });
    let (status, body) = send(post("/login", "", &login), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let session = json(&body);
    assert_eq!(session["role"]["role"], "customer");
    let token = session["token"].as_str().expect("No token in login response").to_string();

    let (status, body) = send(get("/api/profile", &token), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let profile = json(&body);
    assert_eq!(profile["kind"], "customer");
    assert_eq!(profile["profile"]["name"], "Alice");
    assert_eq!(profile["orders"].as_array().map(|o| o.len()), Some(0));

    let (status, body) = send(get("/api/check_token", &token), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["account_id"], registered["account"]["id"]);
    tear_down(db).await;
}

#[actix_web::test]
async fn one_profile_per_email() {
    let db = new_test_db(5).await;
    let vendor = json!({ "email": "bob@example.com", "password": "hunter2hunter2", "kind": "vendor", "name": "Bob" });
    let (status, _) = send(post("/register", "", &vendor), configure(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(post("/register", "", &vendor), configure(db.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("log in"), "{body}");

    let customer = json!({ "email": "bob@example.com", "password": "hunter2hunter2", "kind": "customer", "name": "B" });
    let (status, body) = send(post("/register", "", &customer), configure(db.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("vendor"), "{body}");

    let login = json!({ "email": "bob@example.com", "password": "hunter2hunter2", "role": "customer" });
    let (status, _) = send(post("/login", "", &login), configure(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    tear_down(db).await;
}

#[actix_web::test]
async fn bad_credentials() {
    let db = new_test_db(5).await;
    let login = json!({ "email": "nobody@example.com", "password": "whatever123" });
    let (status, body) = send(post("/login", "", &login), configure(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Not allowed: Invalid email or password"}"#);

    let (status, _) = send(post("/register", "", &json!({ "email": "x@y.z" })), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    tear_down(db).await;
}

#[actix_web::test]
async fn access_tokens() {
    let db = new_test_db(1).await;
    let (status, _) = send(get("/api/profile", ""), configure(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(get("/api/profile", "not-a-jwt"), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::get().uri("/api/profile").insert_header(("Authorization", "Basic abc"));
    let (status, _) = send(req, configure(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A well-formed token for a profile that does not exist
    let token = issue_token(42, Role::Vendor(42));
    let (status, _) = send(get("/api/profile", &token), configure(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    tear_down(db).await;
}
