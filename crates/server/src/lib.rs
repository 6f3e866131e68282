pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sitesmith API",
        version = "0.1.0",
        description = "Accepts build tasks, generates single-page sites and publishes them to GitHub Pages"
    ),
    paths(routes::root, routes::health_check, routes::build_app),
    components(schemas(
        routes::StatusResponse,
        routes::HealthResponse,
        routes::BuildRequest,
        routes::BuildAck,
        error::ErrorResponse,
        sitesmith_core::Attachment,
    )),
    tags(
        (name = "health", description = "Liveness endpoints"),
        (name = "build", description = "Build task intake"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/", get(routes::root))
        .route("/health", get(routes::health_check))
        .route("/build-app", post(routes::build_app))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
