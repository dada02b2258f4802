mod handlers;

use std::time::Duration;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::{Database, GoalRepository, IntentRepository, RequestContext};

pub use handlers::{ListResponse, PaginationResponse};

/// Shared handler state: one repository per resource over the same database handle.
#[derive(Clone)]
pub struct AppState {
    pub intents: IntentRepository,
    pub goals: GoalRepository,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(db: Database, request_timeout: Duration) -> Self {
        Self {
            intents: IntentRepository::new(db.clone()),
            goals: GoalRepository::new(db),
            request_timeout,
        }
    }

    /// A fresh deadline for one request's database work.
    fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}

pub fn create_router(db: Database, request_timeout: Duration) -> Router {
    let api = Router::new()
        // Intents
        .route(
            "/intents",
            get(handlers::list_intents).post(handlers::create_intent),
        )
        .route(
            "/intents/{id}",
            get(handlers::get_intent)
                .put(handlers::update_intent)
                .delete(handlers::delete_intent),
        )
        // Goals
        .route(
            "/goals",
            get(handlers::list_goals).post(handlers::create_goal),
        )
        .route(
            "/goals/{id}",
            get(handlers::get_goal)
                .put(handlers::update_goal)
                .delete(handlers::delete_goal),
        );

    Router::new()
        .nest("/api", api)
        .route("/healthz", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(AppState::new(db, request_timeout))
}
