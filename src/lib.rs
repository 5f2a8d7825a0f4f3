pub mod config;
pub mod error;
pub mod market;
pub mod routes;

pub use routes::api_routes;

/// Banner served on `/`.
pub async fn root() -> &'static str {
    "Add-on Market API"
}
