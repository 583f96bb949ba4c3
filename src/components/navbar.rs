use leptos::*;

use crate::models::user::User;

/// Resolves the user behind the request's session cookie, if any.
#[server(CurrentUser, "/sfn")]
pub async fn current_user() -> Result<Option<User>, ServerFnError> {
    use crate::auth;
    use crate::db::Database;
    use actix_web::{web, HttpRequest};
    use leptos_actix::extract;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    let req: HttpRequest = extract().await?;
    let db: web::Data<Arc<Mutex<Database>>> = extract().await?;
    let db = db.lock().await;
    auth::session_user(&db, &req)
        .await
        .map_err(|e| ServerFnError::ServerError(e.to_string()))
}

/// Top navigation shared by every page.
#[component]
pub fn NavBar(user: Option<User>) -> impl IntoView {
    view! {
        <nav class="navbar">
            <a href="/products" class="brand">"ReviewWare"</a>
            {match user {
                Some(user) => view! {
                    <span class="nav-links">
                        {user.is_staff.then(|| view! { <a href="/products/add">"Add Product"</a> })}
                        <span class="nav-user">{format!("Signed in as {}", user.username)}</span>
                        <a href="/logout">"Log out"</a>
                    </span>
                }.into_view(),
                None => view! {
                    <span class="nav-links">
                        <a href="/login">"Log in"</a>
                        <a href="/register">"Register"</a>
                    </span>
                }.into_view(),
            }}
        </nav>
    }
}
