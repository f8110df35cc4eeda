//! Villa API - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod patch;
pub mod repositories;
pub mod services;

// Re-export dei tipi principali per facilitare l'import
pub use core::{AppError, AppState, config};
pub use services::root;

use axum::{Router, routing::get};
use entities::Villa;
use repositories::EntityStore;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Crea il router principale dell'applicazione sopra lo store `S`
pub fn create_router<S: EntityStore<Villa>>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(configure_villa_routes::<S>())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Configura le routes per la gestione delle ville
fn configure_villa_routes<S: EntityStore<Villa>>() -> Router<Arc<AppState<S>>> {
    use services::*;

    Router::new()
        .route("/villa", get(list_villas::<S>).post(create_villa::<S>))
        .route(
            "/villa/{id}",
            get(get_villa::<S>)
                .put(update_villa::<S>)
                .patch(patch_villa::<S>)
                .delete(delete_villa::<S>),
        )
}
