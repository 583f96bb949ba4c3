use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::auth;
use crate::db::{is_unique_violation, Database};
use crate::error::ApiError;

#[derive(Serialize, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    pub price: f64,
}

#[derive(Serialize, Deserialize)]
pub struct ReviewPayload {
    pub product: Option<i64>,
    pub rating: i64,
    pub feedback: String,
}

#[derive(Serialize, Deserialize)]
pub struct ReviewFieldsPayload {
    pub rating: i64,
    pub feedback: String,
}

#[derive(Serialize, Deserialize)]
pub struct CredentialsPayload {
    pub username: String,
    pub password: String,
}

/// Register the REST surface under /api. Every route lives here so the
/// integration tests can mount the same tree the server does.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/products")
                    .route(web::get().to(list_products))
                    .route(web::post().to(create_product)),
            )
            .service(
                web::resource("/products/{id}")
                    .route(web::get().to(get_product))
                    .route(web::put().to(update_product))
                    .route(web::delete().to(delete_product)),
            )
            .service(
                web::resource("/reviews")
                    .route(web::get().to(list_reviews))
                    .route(web::post().to(create_review)),
            )
            .service(
                web::resource("/reviews/{id}")
                    .route(web::get().to(get_review))
                    .route(web::put().to(update_review))
                    .route(web::delete().to(delete_review)),
            )
            .service(
                web::resource("/register")
                    .route(web::get().to(register_info))
                    .route(web::post().to(register)),
            )
            .service(web::resource("/token").route(web::post().to(obtain_token)))
            .service(web::resource("/{id}/review").route(web::post().to(add_product_review))),
    );
}

fn validate_product(payload: &ProductPayload) -> Result<(), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::field("name", "This field may not be blank."));
    }
    if payload.price < 0.0 {
        return Err(ApiError::field(
            "price",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    Ok(())
}

fn validate_review_fields(rating: i64, feedback: &str) -> Result<u8, ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::field("rating", "Rating must be between 1 and 5."));
    }
    if feedback.trim().is_empty() {
        return Err(ApiError::field("feedback", "This field may not be blank."));
    }
    Ok(rating as u8)
}

// ---- products ----

pub async fn list_products(
    db: web::Data<Arc<Mutex<Database>>>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let products = db.list_products_with_ratings().await?;
    Ok(HttpResponse::Ok().json(products))
}

pub async fn create_product(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    payload: web::Json<ProductPayload>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    auth::require_staff(&db, &req).await?;
    validate_product(&payload)?;

    let product = db
        .insert_product(payload.name.trim(), &payload.description, payload.price)
        .await?;
    let created = db
        .get_product_with_rating(product.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_product(
    db: web::Data<Arc<Mutex<Database>>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let product = db
        .get_product_with_rating(path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn update_product(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Json<ProductPayload>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    auth::require_staff(&db, &req).await?;
    validate_product(&payload)?;

    let id = path.into_inner();
    if !db
        .update_product(id, payload.name.trim(), &payload.description, payload.price)
        .await?
    {
        return Err(ApiError::NotFound);
    }
    let updated = db
        .get_product_with_rating(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_product(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    auth::require_staff(&db, &req).await?;

    if !db.delete_product(path.into_inner()).await? {
        return Err(ApiError::NotFound);
    }
    Ok(HttpResponse::NoContent().finish())
}

// ---- reviews ----

pub async fn list_reviews(
    db: web::Data<Arc<Mutex<Database>>>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ApiError> {
    // Optional ?product=<id> filter
    let product_id = match query.get("product") {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| ApiError::field("product", "A valid integer is required."))?,
        ),
        None => None,
    };

    let db = db.lock().await;
    let reviews = db.list_reviews(product_id).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

pub async fn create_review(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    payload: web::Json<ReviewPayload>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let user = auth::require_regular_user(&db, &req).await?;

    let product_id = payload.product.ok_or(ApiError::field(
        "product",
        "Product is required for review submission",
    ))?;
    if db.get_product(product_id).await?.is_none() {
        return Err(ApiError::field("product", "Invalid product."));
    }
    let rating = validate_review_fields(payload.rating, &payload.feedback)?;
    if db.user_has_reviewed(product_id, user.id).await? {
        return Err(ApiError::NonField(
            "You have already reviewed this product.".into(),
        ));
    }

    let review = db
        .insert_review(product_id, user.id, rating, payload.feedback.trim())
        .await
        .map_err(|e| {
            // Two concurrent submissions race to the UNIQUE constraint
            if is_unique_violation(&e) {
                ApiError::NonField("You have already reviewed this product.".into())
            } else {
                e.into()
            }
        })?;
    Ok(HttpResponse::Created().json(review))
}

pub async fn get_review(
    db: web::Data<Arc<Mutex<Database>>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let review = db
        .get_review(path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(review))
}

pub async fn update_review(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Json<ReviewFieldsPayload>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let user = auth::require_user(&db, &req).await?;

    let id = path.into_inner();
    let review = db.get_review(id).await?.ok_or(ApiError::NotFound)?;
    if review.user != user.id {
        return Err(ApiError::Forbidden(
            "You do not have permission to perform this action.",
        ));
    }
    let rating = validate_review_fields(payload.rating, &payload.feedback)?;

    db.update_review(id, rating, payload.feedback.trim()).await?;
    let updated = db.get_review(id).await?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_review(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let user = auth::require_user(&db, &req).await?;

    let id = path.into_inner();
    let review = db.get_review(id).await?.ok_or(ApiError::NotFound)?;
    if review.user != user.id {
        return Err(ApiError::Forbidden(
            "You do not have permission to perform this action.",
        ));
    }

    db.delete_review(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---- registration and tokens ----

pub async fn register_info() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed(
        "Send a POST request with username and password to register.",
    ))
}

pub async fn register(
    db: web::Data<Arc<Mutex<Database>>>,
    payload: web::Json<CredentialsPayload>,
) -> Result<HttpResponse, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::field("username", "This field may not be blank."));
    }
    if payload.password.chars().count() < auth::MIN_PASSWORD_LEN {
        return Err(ApiError::field(
            "password",
            "Password must be at least 8 characters long",
        ));
    }

    let password_hash = auth::hash_password(&payload.password)
        .map_err(|_| ApiError::NonField("Unable to process the password.".into()))?;

    let db = db.lock().await;
    let user = db
        .create_user(username, &password_hash, false)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::field("username", "A user with that username already exists.")
            } else {
                e.into()
            }
        })?;
    let token = db.get_or_create_token(user.id).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "user": user,
        "token": token,
    })))
}

pub async fn obtain_token(
    db: web::Data<Arc<Mutex<Database>>>,
    payload: web::Json<CredentialsPayload>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let found = db.find_user_by_username(payload.username.trim()).await?;
    let user = match found {
        Some((user, stored_hash)) if auth::verify_password(&payload.password, &stored_hash) => user,
        _ => {
            return Err(ApiError::NonField(
                "Unable to log in with provided credentials.".into(),
            ))
        }
    };

    let token = db.get_or_create_token(user.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "token": token })))
}

/// POST /api/{id}/review: review the product named by the path as the
/// authenticated user.
pub async fn add_product_review(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Json<ReviewFieldsPayload>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let user = auth::require_regular_user(&db, &req).await?;

    let product_id = path.into_inner();
    if db.get_product(product_id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let rating = validate_review_fields(payload.rating, &payload.feedback)?;
    if db.user_has_reviewed(product_id, user.id).await? {
        return Err(ApiError::NonField(
            "You have already reviewed this product.".into(),
        ));
    }

    let review = db
        .insert_review(product_id, user.id, rating, payload.feedback.trim())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::NonField("You have already reviewed this product.".into())
            } else {
                e.into()
            }
        })?;
    Ok(HttpResponse::Created().json(review))
}
