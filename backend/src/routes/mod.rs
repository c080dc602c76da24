mod docs;
pub mod health;
pub mod photos;

use aide::axum::{
    routing::{delete, get, post},
    ApiRouter,
};

/// Creates the router with all handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .api_route("/api/upload", post(photos::upload_photo))
        .api_route("/api/photos", get(photos::list_photos))
        .api_route("/api/delete/{file_name}", delete(photos::delete_photo))
}
