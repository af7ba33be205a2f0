use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        .route("/system_info", get(handlers::system_info))

        // Generation
        .route("/generate", get(handlers::generate))

        // Saved scripts
        .route("/save_script", post(handlers::save_script))
        .route("/get_saved_scripts", get(handlers::get_saved_scripts))
        .route("/export_userscript/{id}", get(handlers::export_userscript))

        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // The browser extension calls from arbitrary page origins
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}
