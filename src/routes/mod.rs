use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod cart;
pub mod doc;
pub mod health;
pub mod invoices;
pub mod orders;
pub mod params;
pub mod products;
pub mod queries;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/auth", auth::router())
        .nest("/cart", cart::router())
        .nest("/booking", bookings::router())
        .nest("/orders", orders::router())
        .nest("/invoices", invoices::router())
        .nest("/queries", queries::router())
        .nest("/admin", admin::router())
}
