//! Integration tests for the JSON REST API.

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use reviewware::api;
use reviewware::auth;
use reviewware::db::Database;

async fn new_db() -> Arc<Mutex<Database>> {
    let db = Database::new(":memory:").unwrap();
    db.create_schema().await.unwrap();
    Arc::new(Mutex::new(db))
}

/// Seeds an account straight through the data layer and returns its id
/// and API token.
async fn seed_user(db: &Arc<Mutex<Database>>, username: &str, staff: bool) -> (i64, String) {
    let db = db.lock().await;
    let hash = auth::hash_password("password123").unwrap();
    let user = db.create_user(username, &hash, staff).await.unwrap();
    let token = db.get_or_create_token(user.id).await.unwrap();
    (user.id, token)
}

macro_rules! init_app {
    ($db:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($db.clone()))
                .configure(api::configure),
        )
        .await
    };
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

#[actix_web::test]
async fn products_are_publicly_readable() {
    let db = new_db().await;
    let app = init_app!(db);

    let req = test::TestRequest::get().uri("/api/products").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn product_writes_require_a_staff_token() {
    let db = new_db().await;
    let (_, regular_token) = seed_user(&db, "alice", false).await;
    let app = init_app!(db);
    let payload = json!({"name": "Keyboard", "description": "Clacky", "price": 80.0});

    // Anonymous: 401
    let req = test::TestRequest::post()
        .uri("/api/products")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Garbage token: 401
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer("nope"))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Regular user: 403
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&regular_token))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn product_crud_roundtrip() {
    let db = new_db().await;
    let (_, staff_token) = seed_user(&db, "admin", true).await;
    let app = init_app!(db);

    // Create
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&staff_token))
        .set_json(json!({"name": "Monitor", "description": "27 inch", "price": 250.0}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["average_rating"], Value::Null);
    assert_eq!(created["review_count"], json!(0));

    // Read
    let req = test::TestRequest::get()
        .uri(&format!("/api/products/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Update
    let req = test::TestRequest::put()
        .uri(&format!("/api/products/{}", id))
        .insert_header(bearer(&staff_token))
        .set_json(json!({"name": "Monitor XL", "description": "32 inch", "price": 400.0}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["name"], json!("Monitor XL"));

    // Delete
    let req = test::TestRequest::delete()
        .uri(&format!("/api/products/{}", id))
        .insert_header(bearer(&staff_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Gone
    let req = test::TestRequest::get()
        .uri(&format!("/api/products/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn product_validation_errors() {
    let db = new_db().await;
    let (_, staff_token) = seed_user(&db, "admin", true).await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&staff_token))
        .set_json(json!({"name": "  ", "description": "x", "price": 1.0}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("name").is_some());

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&staff_token))
        .set_json(json!({"name": "Cable", "description": "x", "price": -2.0}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("price").is_some());
}

#[actix_web::test]
async fn one_review_per_user_per_product() {
    let db = new_db().await;
    let (_, staff_token) = seed_user(&db, "admin", true).await;
    let (_, user_token) = seed_user(&db, "bob", false).await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&staff_token))
        .set_json(json!({"name": "Chair", "description": "Comfy", "price": 120.0}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let product_id = created["id"].as_i64().unwrap();

    let payload = json!({"product": product_id, "rating": 4, "feedback": "Solid chair"});
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&user_token))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Second attempt by the same user is rejected
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&user_token))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["non_field_errors"][0],
        json!("You have already reviewed this product.")
    );
}

#[actix_web::test]
async fn review_field_validation() {
    let db = new_db().await;
    let (_, staff_token) = seed_user(&db, "admin", true).await;
    let (_, user_token) = seed_user(&db, "carol", false).await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&staff_token))
        .set_json(json!({"name": "Table", "description": "Wood", "price": 90.0}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let product_id = created["id"].as_i64().unwrap();

    // Ratings outside [1, 5] are rejected
    for rating in [0, 6, -1] {
        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .insert_header(bearer(&user_token))
            .set_json(json!({"product": product_id, "rating": rating, "feedback": "hm"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "rating {}", rating);
    }

    // Blank feedback is rejected
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&user_token))
        .set_json(json!({"product": product_id, "rating": 3, "feedback": "   "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Missing product field
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&user_token))
        .set_json(json!({"rating": 3, "feedback": "fine"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Unknown product id
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&user_token))
        .set_json(json!({"product": 4242, "rating": 3, "feedback": "fine"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn staff_cannot_submit_reviews() {
    let db = new_db().await;
    let (_, staff_token) = seed_user(&db, "admin", true).await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&staff_token))
        .set_json(json!({"name": "Stand", "description": "Steel", "price": 45.0}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let product_id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&staff_token))
        .set_json(json!({"product": product_id, "rating": 5, "feedback": "mine"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn reviews_can_be_filtered_by_product() {
    let db = new_db().await;
    let (_, staff_token) = seed_user(&db, "admin", true).await;
    let (_, token_a) = seed_user(&db, "dana", false).await;
    let (_, token_b) = seed_user(&db, "evan", false).await;
    let app = init_app!(db);

    let mut product_ids = Vec::new();
    for name in ["First", "Second"] {
        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(bearer(&staff_token))
            .set_json(json!({"name": name, "description": "d", "price": 10.0}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        product_ids.push(created["id"].as_i64().unwrap());
    }

    for (token, product_id) in [(&token_a, product_ids[0]), (&token_b, product_ids[1])] {
        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .insert_header(bearer(token))
            .set_json(json!({"product": product_id, "rating": 4, "feedback": "ok"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get().uri("/api/reviews").to_request();
    let all: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri(&format!("/api/reviews?product={}", product_ids[0]))
        .to_request();
    let filtered: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    assert_eq!(filtered[0]["product"], json!(product_ids[0]));
}

#[actix_web::test]
async fn average_rating_appears_in_product_payload() {
    let db = new_db().await;
    let (_, staff_token) = seed_user(&db, "admin", true).await;
    let (_, token_a) = seed_user(&db, "fred", false).await;
    let (_, token_b) = seed_user(&db, "gina", false).await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&staff_token))
        .set_json(json!({"name": "Speaker", "description": "Loud", "price": 60.0}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let product_id = created["id"].as_i64().unwrap();

    for (token, rating) in [(&token_a, 4), (&token_b, 5)] {
        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .insert_header(bearer(token))
            .set_json(json!({"product": product_id, "rating": rating, "feedback": "loud"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/products/{}", product_id))
        .to_request();
    let product: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(product["average_rating"], json!(4.5));
    assert_eq!(product["review_count"], json!(2));
}

#[actix_web::test]
async fn register_creates_a_user_and_mints_a_token() {
    let db = new_db().await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({"username": "newuser", "password": "longenough"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["username"], json!("newuser"));
    assert_eq!(body["user"]["is_staff"], json!(false));
    let token = body["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    // The token works against a protected endpoint (wrong role, so 403
    // rather than 401)
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&token))
        .set_json(json!({"name": "X", "description": "d", "price": 1.0}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn register_validation_rules() {
    let db = new_db().await;
    let app = init_app!(db);

    // GET is answered with a hint, not a page
    let req = test::TestRequest::get().uri("/api/register").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    // Short password
    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({"username": "shorty", "password": "seven77"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["password"][0],
        json!("Password must be at least 8 characters long")
    );

    // Duplicate username
    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({"username": "taken", "password": "longenough"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({"username": "taken", "password": "longenough"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["username"][0],
        json!("A user with that username already exists.")
    );
}

#[actix_web::test]
async fn token_endpoint_exchanges_credentials() {
    let db = new_db().await;
    let (_, token) = seed_user(&db, "henry", false).await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/token")
        .set_json(json!({"username": "henry", "password": "password123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token"], json!(token));

    // Wrong password
    let req = test::TestRequest::post()
        .uri("/api/token")
        .set_json(json!({"username": "henry", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn per_product_review_endpoint() {
    let db = new_db().await;
    let (_, staff_token) = seed_user(&db, "admin", true).await;
    let (_, user_token) = seed_user(&db, "iris", false).await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&staff_token))
        .set_json(json!({"name": "Router", "description": "WiFi", "price": 75.0}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let product_id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/{}/review", product_id))
        .insert_header(bearer(&user_token))
        .set_json(json!({"rating": 5, "feedback": "Fast"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let review: Value = test::read_body_json(resp).await;
    assert_eq!(review["product"], json!(product_id));
    assert_eq!(review["rating"], json!(5));

    // Unknown product yields 404
    let req = test::TestRequest::post()
        .uri("/api/999/review")
        .insert_header(bearer(&user_token))
        .set_json(json!({"rating": 5, "feedback": "Fast"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn only_the_author_can_change_a_review() {
    let db = new_db().await;
    let (_, staff_token) = seed_user(&db, "admin", true).await;
    let (_, author_token) = seed_user(&db, "jane", false).await;
    let (_, other_token) = seed_user(&db, "kyle", false).await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&staff_token))
        .set_json(json!({"name": "Kettle", "description": "1.7L", "price": 35.0}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let product_id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&author_token))
        .set_json(json!({"product": product_id, "rating": 2, "feedback": "Slow to boil"}))
        .to_request();
    let review: Value = test::call_and_read_body_json(&app, req).await;
    let review_id = review["id"].as_i64().unwrap();

    // Someone else may not touch it
    let req = test::TestRequest::put()
        .uri(&format!("/api/reviews/{}", review_id))
        .insert_header(bearer(&other_token))
        .set_json(json!({"rating": 5, "feedback": "actually great"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The author may
    let req = test::TestRequest::put()
        .uri(&format!("/api/reviews/{}", review_id))
        .insert_header(bearer(&author_token))
        .set_json(json!({"rating": 3, "feedback": "Better after descaling"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["rating"], json!(3));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/reviews/{}", review_id))
        .insert_header(bearer(&other_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/reviews/{}", review_id))
        .insert_header(bearer(&author_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
