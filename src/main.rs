#[cfg(feature = "ssr")]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    use actix_files::Files;
    use actix_web::{middleware, web, App, HttpServer};
    use leptos::logging::log;
    use leptos::*;
    use leptos_actix::{generate_route_list, LeptosRoutes};
    use reviewware::app::App as ReviewWareApp;
    use reviewware::config::Config;
    use reviewware::db::Database;
    use reviewware::{api, auth, pages};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    // Initialize the database
    let config = Config::load();
    let db = Database::new(&config.database_path).unwrap();
    db.create_schema().await.unwrap(); // Ensure the schema is created

    // Bootstrap the staff account when credentials are configured;
    // staff users manage the catalog, everyone else registers themselves
    if let Some(password) = config.admin_password.as_deref() {
        let hash = auth::hash_password(password).unwrap();
        db.ensure_staff_user(&config.admin_username, &hash)
            .await
            .unwrap();
        log!("Staff account ready: {}", config.admin_username);
    }

    let db = Arc::new(Mutex::new(db)); // Shared state for every worker

    // Load configuration
    let conf = get_configuration(None).await.unwrap();
    let addr = conf.leptos_options.site_addr;

    // Generate the list of routes in the Leptos App
    let routes = generate_route_list(ReviewWareApp);
    println!("listening on http://{}", &addr);

    // Start the Actix Web server
    HttpServer::new(move || {
        let leptos_options = &conf.leptos_options;
        let site_root = &leptos_options.site_root;
        let db = db.clone(); // Clone the Arc for each worker

        App::new()
            // /products/ and /products resolve the same way
            .wrap(middleware::NormalizePath::trim())
            // Pass the database as shared state
            .app_data(web::Data::new(db))
            // Register the REST API and the form POST handlers BEFORE the
            // Leptos routes so they win for their paths
            .configure(api::configure)
            .configure(pages::configure)
            // Register server functions
            .route("/sfn/{tail:.*}", leptos_actix::handle_server_fns())
            // Serve JS/WASM/CSS from `pkg`
            .service(Files::new("/pkg", format!("{site_root}/pkg")))
            // Register Leptos routes
            .leptos_routes(leptos_options.to_owned(), routes.to_owned(), ReviewWareApp)
            // Pass Leptos options to the app
            .app_data(web::Data::new(leptos_options.to_owned()))
    })
    .bind(&addr)?
    .run()
    .await
}

#[cfg(not(feature = "ssr"))]
pub fn main() {
    // no client-side main function
    // see lib.rs for the hydration entry point instead
}
