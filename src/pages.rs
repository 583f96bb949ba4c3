//! Form handlers behind the server-rendered pages. The GET side of each
//! page is a Leptos route; these POST handlers validate, touch the
//! database and redirect, carrying any validation message back to the
//! form as an `?error=` query parameter.

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{guard, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::auth;
use crate::auth::SESSION_COOKIE;
use crate::db::{is_unique_violation, Database};
use crate::error::ApiError;
use crate::models::user::User;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
}

#[derive(Deserialize)]
pub struct ReviewForm {
    pub rating: String,
    pub feedback: String,
}

/// Register the HTML-side routes. The POST resources carry a method
/// guard so that GET requests for the same paths skip them and fall
/// through to the Leptos routes registered afterwards.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(
            web::resource("/login")
                .guard(guard::Post())
                .route(web::post().to(login_submit)),
        )
        .service(web::resource("/logout").route(web::get().to(logout)))
        .service(
            web::resource("/register")
                .guard(guard::Post())
                .route(web::post().to(register_submit)),
        )
        .service(
            web::resource("/products/add")
                .guard(guard::Post())
                .route(web::post().to(product_add_submit)),
        )
        .service(
            web::resource("/products/{id}/edit")
                .guard(guard::Post())
                .route(web::post().to(product_edit_submit)),
        )
        .service(
            web::resource("/products/{id}/delete")
                .guard(guard::Post())
                .route(web::post().to(product_delete_submit)),
        )
        .service(
            web::resource("/products/{id}/review")
                .guard(guard::Post())
                .route(web::post().to(review_submit)),
        );
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn back_with_error(path: &str, message: &str) -> HttpResponse {
    see_other(&format!("{}?error={}", path, urlencoding::encode(message)))
}

async fn current_user(db: &Database, req: &HttpRequest) -> Result<Option<User>, ApiError> {
    auth::session_user(db, req).await
}

// GET / just forwards to the login page
pub async fn root() -> HttpResponse {
    see_other("/login")
}

pub async fn login_submit(
    db: web::Data<Arc<Mutex<Database>>>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let found = db.find_user_by_username(form.username.trim()).await?;
    let user = match found {
        Some((user, stored_hash)) if auth::verify_password(&form.password, &stored_hash) => user,
        _ => return Ok(back_with_error("/login", "Invalid username or password")),
    };

    let session_id = db.create_session(user.id).await?;
    let cookie = Cookie::build(SESSION_COOKIE, session_id)
        .path("/")
        .http_only(true)
        .finish();
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/products"))
        .cookie(cookie)
        .finish())
}

pub async fn logout(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        db.delete_session(cookie.value()).await?;
    }

    // Expire the cookie on the way out
    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.set_max_age(actix_web::cookie::time::Duration::seconds(0));
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/login"))
        .cookie(removal)
        .finish())
}

pub async fn register_submit(
    db: web::Data<Arc<Mutex<Database>>>,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, ApiError> {
    let username = form.username.trim();
    if username.is_empty() {
        return Ok(back_with_error("/register", "Please enter a username"));
    }
    if form.password1 != form.password2 {
        return Ok(back_with_error(
            "/register",
            "The two password fields didn't match",
        ));
    }
    if form.password1.chars().count() < auth::MIN_PASSWORD_LEN {
        return Ok(back_with_error(
            "/register",
            "Password must be at least 8 characters long",
        ));
    }

    let password_hash = auth::hash_password(&form.password1)
        .map_err(|_| ApiError::NonField("Unable to process the password.".into()))?;

    let db = db.lock().await;
    match db.create_user(username, &password_hash, false).await {
        Ok(_) => Ok(see_other("/login")),
        Err(e) if is_unique_violation(&e) => {
            Ok(back_with_error("/register", "Username already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn product_add_submit(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    form: web::Form<ProductForm>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let user = match current_user(&db, &req).await? {
        Some(user) => user,
        None => return Ok(see_other("/login")),
    };
    if !user.is_staff {
        return Ok(see_other("/products"));
    }

    let name = form.name.trim();
    if name.is_empty() {
        return Ok(back_with_error("/products/add", "Please enter a name"));
    }
    let price = match form.price.trim().parse::<f64>() {
        Ok(price) if price >= 0.0 => price,
        _ => return Ok(back_with_error("/products/add", "Invalid price")),
    };

    db.insert_product(name, &form.description, price).await?;
    Ok(see_other("/products"))
}

pub async fn product_edit_submit(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    path: web::Path<i64>,
    form: web::Form<ProductForm>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let user = match current_user(&db, &req).await? {
        Some(user) => user,
        None => return Ok(see_other("/login")),
    };
    if !user.is_staff {
        return Ok(see_other("/products"));
    }

    let id = path.into_inner();
    let edit_path = format!("/products/{}/edit", id);
    let name = form.name.trim();
    if name.is_empty() {
        return Ok(back_with_error(&edit_path, "Please enter a name"));
    }
    let price = match form.price.trim().parse::<f64>() {
        Ok(price) if price >= 0.0 => price,
        _ => return Ok(back_with_error(&edit_path, "Invalid price")),
    };

    if !db.update_product(id, name, &form.description, price).await? {
        return Ok(HttpResponse::NotFound().body("Product not found."));
    }
    Ok(see_other(&format!("/products/{}", id)))
}

pub async fn product_delete_submit(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let user = match current_user(&db, &req).await? {
        Some(user) => user,
        None => return Ok(see_other("/login")),
    };
    if !user.is_staff {
        return Ok(see_other("/products"));
    }

    if !db.delete_product(path.into_inner()).await? {
        return Ok(HttpResponse::NotFound().body("Product not found."));
    }
    Ok(see_other("/products"))
}

pub async fn review_submit(
    db: web::Data<Arc<Mutex<Database>>>,
    req: HttpRequest,
    path: web::Path<i64>,
    form: web::Form<ReviewForm>,
) -> Result<HttpResponse, ApiError> {
    let db = db.lock().await;
    let user = match current_user(&db, &req).await? {
        Some(user) => user,
        None => return Ok(see_other("/login")),
    };

    let product_id = path.into_inner();
    let detail_path = format!("/products/{}", product_id);
    let review_path = format!("/products/{}/review", product_id);

    if db.get_product(product_id).await?.is_none() {
        return Ok(HttpResponse::NotFound().body("Product not found."));
    }
    // Staff manage the catalog; they do not review it
    if user.is_staff {
        return Ok(see_other(&detail_path));
    }
    if db.user_has_reviewed(product_id, user.id).await? {
        return Ok(see_other(&detail_path));
    }

    let rating = match form.rating.trim().parse::<i64>() {
        Ok(rating) if (1..=5).contains(&rating) => rating as u8,
        _ => return Ok(back_with_error(&review_path, "Invalid rating")),
    };
    if form.feedback.trim().is_empty() {
        return Ok(back_with_error(&review_path, "Please enter feedback"));
    }

    match db
        .insert_review(product_id, user.id, rating, form.feedback.trim())
        .await
    {
        Ok(_) => Ok(see_other(&detail_path)),
        // Lost the race against a concurrent submission: treat as duplicate
        Err(e) if is_unique_violation(&e) => Ok(see_other(&detail_path)),
        Err(e) => Err(e.into()),
    }
}
