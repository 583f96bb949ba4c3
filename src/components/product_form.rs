/// Add/edit product forms. Staff only: the POST handlers enforce it and
/// these pages redirect anyone else away before showing the form.
use leptos::*;
use leptos_router::{use_params_map, use_query_map, Redirect};
use serde::{Deserialize, Serialize};

use crate::components::navbar::NavBar;
use crate::models::product::Product;
use crate::models::user::User;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProductFormData {
    pub user: Option<User>,
    pub product: Option<Product>,
}

#[server(GetProductForm, "/sfn")]
pub async fn get_product_form(id: i64) -> Result<ProductFormData, ServerFnError> {
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
    let product = db
        .get_product(id)
        .await
        .map_err(|e| ServerFnError::<leptos::server_fn::error::NoCustomError>::ServerError(e.to_string()))?;
    Ok(ProductFormData { user, product })
}

/// The form markup itself, shared between add and edit. Plain HTML form:
/// the POST goes to an Actix handler which validates and redirects, so
/// it works with or without the WASM bundle.
#[component]
fn ProductFormFields(
    title: String,
    action: String,
    product: Option<Product>,
) -> impl IntoView {
    let query = use_query_map();
    let error = move || query.with(|q| q.get("error").cloned());
    let (name, description, price) = match &product {
        Some(p) => (p.name.clone(), p.description.clone(), p.price.to_string()),
        None => (String::new(), String::new(), String::new()),
    };

    view! {
        <div class="form-page">
            <h1>{title}</h1>
            {move || error().map(|e| view! { <p class="error">{e}</p> })}
            <form method="post" action={action}>
                <label>"Name"
                    <input type="text" name="name" value={name}/>
                </label>
                <label>"Description"
                    <textarea name="description">{description}</textarea>
                </label>
                <label>"Price"
                    <input type="text" name="price" value={price}/>
                </label>
                <button type="submit">"Save"</button>
            </form>
            <p><a href="/products">"Back to products"</a></p>
        </div>
    }
}

#[component]
pub fn ProductAddPage() -> impl IntoView {
    let data = create_resource(
        || (),
        |_| async move { crate::components::navbar::current_user().await },
    );

    view! {
        <Suspense fallback=move || view! { <p>"Loading..."</p> }>
            {move || data.get().map(|result| match result {
                Ok(None) => view! { <Redirect path="/login"/> }.into_view(),
                Ok(Some(user)) if !user.is_staff => view! { <Redirect path="/products"/> }.into_view(),
                Ok(Some(user)) => view! {
                    <div class="page">
                        <NavBar user={Some(user)}/>
                        <ProductFormFields
                            title={"Add Product".to_string()}
                            action={"/products/add".to_string()}
                            product={None}
                        />
                    </div>
                }.into_view(),
                Err(_) => view! { <p class="error">"Failed to load the form."</p> }.into_view(),
            })}
        </Suspense>
    }
}

#[component]
pub fn ProductEditPage() -> impl IntoView {
    let params = use_params_map();
    let id = move || {
        params.with(|p| p.get("id").and_then(|s| s.parse::<i64>().ok()).unwrap_or(0))
    };
    let data = create_resource(id, |id| async move { get_product_form(id).await });

    view! {
        <Suspense fallback=move || view! { <p>"Loading..."</p> }>
            {move || data.get().map(|result| match result {
                Ok(data) if data.user.is_none() => view! { <Redirect path="/login"/> }.into_view(),
                Ok(data) if !data.user.as_ref().map(|u| u.is_staff).unwrap_or(false) => {
                    view! { <Redirect path="/products"/> }.into_view()
                }
                Ok(data) => match data.product.clone() {
                    None => view! {
                        <div class="page">
                            <NavBar user={data.user.clone()}/>
                            <p class="error">"Product not found."</p>
                        </div>
                    }.into_view(),
                    Some(product) => view! {
                        <div class="page">
                            <NavBar user={data.user.clone()}/>
                            <ProductFormFields
                                title={"Edit Product".to_string()}
                                action={format!("/products/{}/edit", product.id)}
                                product={Some(product.clone())}
                            />
                        </div>
                    }.into_view(),
                },
                Err(_) => view! { <p class="error">"Failed to load the form."</p> }.into_view(),
            })}
        </Suspense>
    }
}
