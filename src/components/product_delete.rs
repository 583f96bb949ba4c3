/// Delete confirmation page. The actual delete happens in the POST
/// handler; this page only asks.
use leptos::*;
use leptos_router::{use_params_map, Redirect};

use crate::components::navbar::NavBar;
use crate::components::product_form::get_product_form;

#[component]
pub fn ProductDeletePage() -> impl IntoView {
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
                            <h1>"Delete Product"</h1>
                            <p>{format!("Are you sure you want to delete \"{}\"? Its reviews will be deleted too.", product.name)}</p>
                            <form method="post" action={format!("/products/{}/delete", product.id)}>
                                <button type="submit">"Delete"</button>
                            </form>
                            <p><a href={format!("/products/{}", product.id)}>"Cancel"</a></p>
                        </div>
                    }.into_view(),
                },
                Err(_) => view! { <p class="error">"Failed to load the page."</p> }.into_view(),
            })}
        </Suspense>
    }
}
