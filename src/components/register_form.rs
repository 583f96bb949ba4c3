use leptos::*;
use leptos_router::use_query_map;

#[component]
pub fn RegisterPage() -> impl IntoView {
    let query = use_query_map();
    let error = move || query.with(|q| q.get("error").cloned());

    // Live mismatch hint once the page has hydrated; the POST handler
    // is still the one that decides.
    let (password1, set_password1) = create_signal(String::new());
    let (password2, set_password2) = create_signal(String::new());
    let mismatch = move || !password2.get().is_empty() && password1.get() != password2.get();

    view! {
        <div class="form-page">
            <h1>"Register"</h1>
            {move || error().map(|e| view! { <p class="error">{e}</p> })}
            <form method="post" action="/register">
                <label>"Username"
                    <input type="text" name="username"/>
                </label>
                <label>"Password"
                    <input
                        type="password"
                        name="password1"
                        on:input=move |e| set_password1.set(event_target_value(&e))
                    />
                </label>
                <label>"Confirm password"
                    <input
                        type="password"
                        name="password2"
                        on:input=move |e| set_password2.set(event_target_value(&e))
                    />
                </label>
                {move || mismatch().then(|| view! { <p class="hint">"Passwords do not match."</p> })}
                <button type="submit">"Register"</button>
            </form>
            <p>"Already registered? " <a href="/login">"Log in"</a></p>
        </div>
    }
}
