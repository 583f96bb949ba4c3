/// Main application entry point for ReviewWare.
/// Wires every server-rendered page into the router; the matching POST
/// handlers live on the Actix side.
use leptos::*;
use leptos_meta::*;
use leptos_router::*;

use crate::components::login_form::LoginPage;
use crate::components::product_delete::ProductDeletePage;
use crate::components::product_detail::ProductDetailPage;
use crate::components::product_form::{ProductAddPage, ProductEditPage};
use crate::components::products_list::ProductsPage;
use crate::components::register_form::RegisterPage;
use crate::components::review_form::ReviewFormPage;

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Stylesheet id="leptos" href="/pkg/reviewware.css"/>
        <Title text="ReviewWare"/>
        <Router>
            <main>
                <Routes>
                    <Route path="/products" view=ProductsPage ssr=SsrMode::Async/>
                    <Route path="/products/add" view=ProductAddPage ssr=SsrMode::Async/>
                    <Route path="/products/:id" view=ProductDetailPage ssr=SsrMode::Async/>
                    <Route path="/products/:id/edit" view=ProductEditPage ssr=SsrMode::Async/>
                    <Route path="/products/:id/delete" view=ProductDeletePage ssr=SsrMode::Async/>
                    <Route path="/products/:id/review" view=ReviewFormPage ssr=SsrMode::Async/>
                    <Route path="/login" view=LoginPage/>
                    <Route path="/register" view=RegisterPage/>
                </Routes>
            </main>
        </Router>
    }
}
