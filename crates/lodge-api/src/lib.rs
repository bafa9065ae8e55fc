//! HTTP handlers for listings, inventory and bookings.

pub mod auth;
pub mod bookings;
mod convert;
pub mod error;
pub mod extract;
pub mod inventory;
pub mod listings;
pub mod session;
pub mod state;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// All routes, with state attached. Tracing and CORS layers are added by the
/// binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/listings",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route(
            "/listings/{listing_id}",
            get(listings::get_listing)
                .patch(listings::update_listing)
                .delete(listings::delete_listing),
        )
        .route(
            "/listings/{listing_id}/inventory",
            get(inventory::get_inventory).put(inventory::set_inventory),
        )
        .route("/listings/{listing_id}/bookings", get(bookings::listing_bookings))
        .route("/me/listings", get(listings::my_listings))
        .route(
            "/bookings",
            get(bookings::my_bookings).post(bookings::create_booking),
        )
        .route("/bookings/{booking_id}", get(bookings::get_booking))
        .route("/bookings/{booking_id}/cancel", post(bookings::cancel_booking))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
