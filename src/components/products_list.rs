/// Component to display the product catalog.
/// Lists every product with its price and review aggregates.
use leptos::*;
use leptos_router::Redirect;
use serde::{Deserialize, Serialize};

use crate::components::navbar::NavBar;
use crate::models::product::ProductWithRating;
use crate::models::user::User;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProductListData {
    pub user: Option<User>,
    pub products: Vec<ProductWithRating>,
}

#[server(ListProducts, "/sfn")]
pub async fn list_products() -> Result<ProductListData, ServerFnError> {
    use crate::auth;
    use crate::db::Database;
    use actix_web::{web, HttpRequest};
    use leptos_actix::extract;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    let req: HttpRequest = extract().await?;
    let db: web::Data<Arc<Mutex<Database>>> = extract().await?;
    let db = db.lock().await;
    let user = auth::session_user(&db, &req)
        .await
        .map_err(|e| ServerFnError::<leptos::server_fn::error::NoCustomError>::ServerError(e.to_string()))?;
    let products = db
        .list_products_with_ratings()
        .await
        .map_err(|e| ServerFnError::<leptos::server_fn::error::NoCustomError>::ServerError(e.to_string()))?;
    Ok(ProductListData { user, products })
}

fn rating_label(product: &ProductWithRating) -> String {
    match product.average_rating {
        Some(avg) => format!("{} / 5 ({} reviews)", avg, product.review_count),
        None => "No reviews yet".to_string(),
    }
}

#[component]
pub fn ProductsPage() -> impl IntoView {
    let data = create_resource(|| (), |_| async move { list_products().await });

    view! {
        <Suspense fallback=move || view! { <p>"Loading products..."</p> }>
            {move || data.get().map(|result| match result {
                // The catalog is for signed-in visitors only
                Ok(data) if data.user.is_none() => view! { <Redirect path="/login"/> }.into_view(),
                Ok(data) => view! {
                    <div class="page">
                        <NavBar user={data.user.clone()}/>
                        <h1>"Products"</h1>
                        {if data.products.is_empty() {
                            view! { <p>"No products yet."</p> }.into_view()
                        } else {
                            view! {
                                <ul class="product-list">
                                    {data.products.iter().map(|product| view! {
                                        <li>
                                            <a href={format!("/products/{}", product.id)}>
                                                <strong>{product.name.clone()}</strong>
                                            </a>
                                            <span class="price">{format!("${:.2}", product.price)}</span>
                                            <span class="rating">{rating_label(product)}</span>
                                        </li>
                                    }).collect::<Vec<_>>()}
                                </ul>
                            }.into_view()
                        }}
                    </div>
                }.into_view(),
                Err(_) => view! { <p class="error">"Failed to load products."</p> }.into_view(),
            })}
        </Suspense>
    }
}
