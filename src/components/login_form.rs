use leptos::*;
use leptos_router::use_query_map;

#[component]
pub fn LoginPage() -> impl IntoView {
    let query = use_query_map();
    let error = move || query.with(|q| q.get("error").cloned());

    view! {
        <div class="form-page">
            <h1>"Log in"</h1>
            {move || error().map(|e| view! { <p class="error">{e}</p> })}
            <form method="post" action="/login">
                <label>"Username"
                    <input type="text" name="username"/>
                </label>
                <label>"Password"
                    <input type="password" name="password"/>
                </label>
                <button type="submit">"Log in"</button>
            </form>
            <p>"No account yet? " <a href="/register">"Register"</a></p>
        </div>
    }
}
