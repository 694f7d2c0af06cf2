use anyhow::Context;
use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod health;
pub mod images;
pub mod templates;

pub fn create_router(state: AppState) -> anyhow::Result<Router<()>> {
    let cors = cors_layer(state.config.cors_allowed_origin.as_deref())?;

    let template_routes = Router::new()
        .route(
            "/",
            get(templates::list_templates).post(templates::create_template),
        )
        .route("/search", get(templates::search_templates))
        .route(
            "/:id",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .route("/:id/image", get(images::get_template_image));

    Ok(Router::new()
        .nest("/api/templates", template_routes)
        .route("/api/upload-image", post(images::upload_image))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::disable()))
}

fn cors_layer(allowed_origins: Option<&str>) -> anyhow::Result<CorsLayer> {
    let allow_origin = match allowed_origins {
        Some(origins) => {
            let headers = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| {
                    value
                        .parse::<HeaderValue>()
                        .with_context(|| format!("invalid CORS allowed origin: {value}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
