pub mod cipher;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pagination;
pub mod services;
pub mod validation;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post, put},
};
use tower_http::cors::{Any, CorsLayer};

use crate::cipher::CardCipher;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub cipher: Arc<CardCipher>,
}

pub fn create_app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/cards/all", get(handlers::cards::get_all_cards))
        .route("/api/cards/:id/activate", put(handlers::cards::activate_card))
        .route("/api/cards/:id", delete(handlers::cards::delete_card))
        .layer(from_fn(middleware::auth::admin_auth));

    let user_routes = Router::new()
        .route(
            "/api/cards",
            post(handlers::cards::create_card).get(handlers::cards::get_my_cards),
        )
        .route("/api/cards/:id", get(handlers::cards::get_card))
        .route("/api/cards/:id/block", put(handlers::cards::block_card))
        .route("/api/transfers", post(handlers::transfers::transfer))
        .route(
            "/api/transfers/history",
            get(handlers::transfers::get_transfer_history),
        )
        .layer(from_fn(middleware::auth::require_user));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(admin_routes)
        .merge(user_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
