use std::env;

use leptos::logging::log;

/// Runtime settings sourced from the environment. Everything has a
/// default except the admin password: without it no staff account is
/// bootstrapped at startup.
pub struct Config {
    pub database_path: String,
    pub admin_username: String,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_path: load_or("REVIEWWARE_DB", "reviewware.db"),
            admin_username: load_or("REVIEWWARE_ADMIN_USERNAME", "admin"),
            admin_password: env::var("REVIEWWARE_ADMIN_PASSWORD").ok(),
        }
    }
}

fn load_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        log!("{key} not set, using default: {default}");
        default.to_string()
    })
}
