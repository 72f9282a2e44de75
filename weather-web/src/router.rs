use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::handlers::{city_weather, error_page, index, search};
use crate::state::AppState;

// State is applied by the caller using `.with_state(...)`.
pub fn create_router() -> Router<AppState> {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &axum::http::Request<_>| {
            tracing::info_span!("http_request", method = %req.method(), uri = %req.uri())
        })
        .on_request(tower_http::trace::DefaultOnRequest::new().level(Level::INFO))
        .on_response(
            tower_http::trace::DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Millis),
        );

    Router::new()
        .route("/", get(index).post(search))
        .route("/error", get(error_page))
        .route("/{city}", get(city_weather).post(city_weather))
        .layer(trace)
}
