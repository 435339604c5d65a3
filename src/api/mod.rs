mod handlers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use guidebook_core::OutlineEditor;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::db::Database;

/// Shared server state: the store plus one open editor per guide.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub editors: Arc<Mutex<HashMap<Uuid, OutlineEditor>>>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            editors: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, &Config::default())
}

pub fn create_router_with_config(db: Database, config: &Config) -> Router {
    let api = Router::new()
        // Guides
        .route("/guides", get(handlers::list_guides))
        .route("/guides", post(handlers::create_guide))
        .route("/guides/{id}", get(handlers::get_guide))
        .route("/guides/{id}", delete(handlers::delete_guide))
        .route("/guides/{id}/publish", post(handlers::publish))
        .route("/guides/{id}/tree", get(handlers::get_tree))
        // Editor
        .route("/guides/{id}/editor", post(handlers::open_editor))
        .route("/guides/{id}/editor", get(handlers::get_editor))
        .route("/guides/{id}/editor", delete(handlers::close_editor))
        .route("/guides/{id}/editor/meta", put(handlers::update_outline_meta))
        .route("/guides/{id}/editor/active", put(handlers::set_active_chapter))
        .route("/guides/{id}/editor/progress", get(handlers::get_progress))
        // Chapters
        .route("/guides/{id}/editor/chapters", post(handlers::add_chapter))
        .route("/guides/{id}/editor/chapters/{chapter_id}", put(handlers::update_chapter_meta))
        .route("/guides/{id}/editor/chapters/{chapter_id}", delete(handlers::delete_chapter))
        .route("/guides/{id}/editor/chapters/{chapter_id}/move", post(handlers::move_chapter))
        .route(
            "/guides/{id}/editor/chapters/{chapter_id}/completed",
            post(handlers::set_chapter_completed),
        )
        .route("/guides/{id}/editor/chapters/{chapter_id}/sections", post(handlers::add_section))
        // Sections
        .route("/guides/{id}/editor/sections/{section_id}", delete(handlers::delete_section))
        .route("/guides/{id}/editor/sections/{section_id}/move", post(handlers::move_section))
        .route(
            "/guides/{id}/editor/sections/{section_id}/completed",
            post(handlers::set_section_completed),
        )
        .route(
            "/guides/{id}/editor/sections/{section_id}/duration",
            put(handlers::set_section_duration),
        )
        .route("/guides/{id}/editor/sections/{section_id}/content", get(handlers::get_content))
        // Edit session
        .route("/guides/{id}/editor/session", post(handlers::begin_edit))
        .route("/guides/{id}/editor/session", put(handlers::update_draft))
        .route("/guides/{id}/editor/session/commit", post(handlers::commit_edit))
        .route("/guides/{id}/editor/session/cancel", post(handlers::cancel_edit))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(config.cors_layer()),
        )
        .with_state(AppState::new(db))
}
