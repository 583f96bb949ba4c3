use leptos::*;
use leptos_router::{use_params_map, use_query_map, Redirect};

use crate::components::navbar::NavBar;
use crate::components::product_detail::get_product_detail;

/// Review submission form for one product. Staff accounts and users who
/// already reviewed the product are sent back to the detail page.
#[component]
pub fn ReviewFormPage() -> impl IntoView {
    let params = use_params_map();
    let id = move || {
        params.with(|p| p.get("id").and_then(|s| s.parse::<i64>().ok()).unwrap_or(0))
    };
    let data = create_resource(id, |id| async move { get_product_detail(id).await });

    let query = use_query_map();
    let error = move || query.with(|q| q.get("error").cloned());

    view! {
        <Suspense fallback=move || view! { <p>"Loading..."</p> }>
            {move || data.get().map(|result| match result {
                Ok(data) if data.user.is_none() => view! { <Redirect path="/login"/> }.into_view(),
                Ok(data) => match data.product.clone() {
                    None => view! {
                        <div class="page">
                            <NavBar user={data.user.clone()}/>
                            <p class="error">"Product not found."</p>
                        </div>
                    }.into_view(),
                    Some(product) if !data.can_review => {
                        view! { <Redirect path={format!("/products/{}", product.id)}/> }.into_view()
                    }
                    Some(product) => view! {
                        <div class="page">
                            <NavBar user={data.user.clone()}/>
                            <h1>{format!("Review {}", product.name)}</h1>
                            {move || error().map(|e| view! { <p class="error">{e}</p> })}
                            <form method="post" action={format!("/products/{}/review", product.id)}>
                                <label>"Rating"
                                    <select name="rating">
                                        {(1..=5).map(|n: i32| view! {
                                            <option value={n.to_string()}>{n.to_string()}</option>
                                        }).collect::<Vec<_>>()}
                                    </select>
                                </label>
                                <label>"Feedback"
                                    <textarea name="feedback" placeholder="What did you think?"></textarea>
                                </label>
                                <button type="submit">"Submit Review"</button>
                            </form>
                            <p><a href={format!("/products/{}", product.id)}>"Back to product"</a></p>
                        </div>
                    }.into_view(),
                },
                Err(_) => view! { <p class="error">"Failed to load the form."</p> }.into_view(),
            })}
        </Suspense>
    }
}
