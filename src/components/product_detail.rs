/// Product detail page: description, price, review aggregates and the
/// full review list. Staff see management links; regular users who have
/// not reviewed yet get a link to the review form.
use leptos::*;
use leptos_router::{use_params_map, Redirect};
use serde::{Deserialize, Serialize};

use crate::components::navbar::NavBar;
use crate::components::reviews_list::ReviewsList;
use crate::models::product::ProductWithRating;
use crate::models::review::ReviewWithAuthor;
use crate::models::user::User;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProductDetailData {
    pub user: Option<User>,
    pub product: Option<ProductWithRating>,
    pub reviews: Vec<ReviewWithAuthor>,
    pub can_review: bool,
}

#[server(GetProductDetail, "/sfn")]
pub async fn get_product_detail(id: i64) -> Result<ProductDetailData, ServerFnError> {
    use crate::auth;
    use crate::db::Database;
    use actix_web::{web, HttpRequest};
    use leptos_actix::extract;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    let req: HttpRequest = extract().await?;
    let db: web::Data<Arc<Mutex<Database>>> = extract().await?;
    let db = db.lock().await;

    let server_err = |e: crate::error::ApiError| ServerFnError::<leptos::server_fn::error::NoCustomError>::ServerError(e.to_string());
    let db_err = |e: rusqlite::Error| ServerFnError::<leptos::server_fn::error::NoCustomError>::ServerError(e.to_string());

    let user = auth::session_user(&db, &req).await.map_err(server_err)?;
    let product = db.get_product_with_rating(id).await.map_err(db_err)?;

    let (reviews, can_review) = match &product {
        Some(product) => {
            let reviews = db.reviews_with_authors(product.id).await.map_err(db_err)?;
            let can_review = match &user {
                Some(u) if !u.is_staff => {
                    !db.user_has_reviewed(product.id, u.id).await.map_err(db_err)?
                }
                _ => false,
            };
            (reviews, can_review)
        }
        None => (Vec::new(), false),
    };

    Ok(ProductDetailData {
        user,
        product,
        reviews,
        can_review,
    })
}

#[component]
pub fn ProductDetailPage() -> impl IntoView {
    let params = use_params_map();
    let id = move || {
        params.with(|p| p.get("id").and_then(|s| s.parse::<i64>().ok()).unwrap_or(0))
    };
    let data = create_resource(id, |id| async move { get_product_detail(id).await });

    view! {
        <Suspense fallback=move || view! { <p>"Loading product..."</p> }>
            {move || data.get().map(|result| match result {
                Ok(data) if data.user.is_none() => view! { <Redirect path="/login"/> }.into_view(),
                Ok(data) => match data.product.clone() {
                    None => view! {
                        <div class="page">
                            <NavBar user={data.user.clone()}/>
                            <p class="error">"Product not found."</p>
                        </div>
                    }.into_view(),
                    Some(product) => {
                        let is_staff = data.user.as_ref().map(|u| u.is_staff).unwrap_or(false);
                        view! {
                            <div class="page">
                                <NavBar user={data.user.clone()}/>
                                <h1>{product.name.clone()}</h1>
                                <p class="description">{product.description.clone()}</p>
                                <p class="price">{format!("Price: ${:.2}", product.price)}</p>
                                <p class="rating">{match product.average_rating {
                                    Some(avg) => format!("Average rating: {} / 5 ({} reviews)", avg, product.review_count),
                                    None => "No reviews yet".to_string(),
                                }}</p>
                                {is_staff.then(|| view! {
                                    <p class="admin-links">
                                        <a href={format!("/products/{}/edit", product.id)}>"Edit"</a>
                                        " | "
                                        <a href={format!("/products/{}/delete", product.id)}>"Delete"</a>
                                    </p>
                                })}
                                {data.can_review.then(|| view! {
                                    <p><a href={format!("/products/{}/review", product.id)}>"Write a review"</a></p>
                                })}
                                <ReviewsList reviews={data.reviews.clone()}/>
                            </div>
                        }.into_view()
                    }
                },
                Err(_) => view! { <p class="error">"Failed to load product."</p> }.into_view(),
            })}
        </Suspense>
    }
}
