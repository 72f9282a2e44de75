//! Page handlers

use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use city_weather_core::{GeoQuery, Resolution, WeatherError};

use crate::pages;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct CityParams {
    pub country: Option<String>,
}

/// GET / - Search form
pub async fn index() -> Html<String> {
    Html(pages::index(None))
}

/// POST / - Resolve the query and redirect to the city page
pub async fn search(State(state): State<AppState>, Form(form): Form<SearchForm>) -> Response {
    if form.search.trim().is_empty() {
        return Html(pages::index(Some("Type a city or a question about the weather somewhere.")))
            .into_response();
    }

    match state.resolver.resolve(&form.search).await {
        Ok(Resolution::Resolved(city)) => Redirect::to(&city_path(&city)).into_response(),
        Ok(unresolved) => {
            let message = unresolved.fallback_message().unwrap_or_default();
            (StatusCode::UNPROCESSABLE_ENTITY, Html(pages::error(Some(&message)))).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// GET|POST /{city} - Weather page
pub async fn city_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Query(params): Query<CityParams>,
) -> Response {
    let query = GeoQuery::new(city).with_country(params.country);

    match state.aggregator.aggregate(&query).await {
        Ok(view) => Html(pages::city(&view)).into_response(),
        Err(err) => error_response(err),
    }
}

/// GET /error - Static error page
pub async fn error_page() -> Html<String> {
    Html(pages::error(None))
}

/// Percent-encoded path of a city's page.
pub fn city_path(city: &str) -> String {
    format!("/{}", urlencoding::encode(city))
}

fn error_response(err: WeatherError) -> Response {
    let status = match &err {
        WeatherError::NotFound(city) => {
            info!(city = %city, "No geocoding match");
            return Redirect::to("/error").into_response();
        }
        WeatherError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        WeatherError::UpstreamUnavailable { .. }
        | WeatherError::Network { .. }
        | WeatherError::UpstreamData { .. } => StatusCode::BAD_GATEWAY,
        WeatherError::MissingCredentials(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    warn!(error = %err, %status, "Request failed");
    (status, Html(pages::error(Some(&err.user_message())))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_path_percent_encodes() {
        assert_eq!(city_path("Paris"), "/Paris");
        assert_eq!(city_path("New York"), "/New%20York");
        assert_eq!(city_path("a/b"), "/a%2Fb");
    }

    #[test]
    fn not_found_redirects_to_error_page() {
        let res = error_response(WeatherError::NotFound("Qwzxville".into()));
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/error");
    }

    #[test]
    fn timeout_and_unavailable_have_distinct_statuses() {
        let timeout = error_response(WeatherError::UpstreamTimeout { service: "openweather" });
        let down = error_response(WeatherError::UpstreamUnavailable {
            service: "openweather",
            status: 500,
            body: String::new(),
        });

        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(down.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn malformed_upstream_data_is_bad_gateway() {
        let err = WeatherError::UpstreamData {
            service: "openweather",
            detail: "missing field `main`".into(),
        };
        assert!(err.user_message().contains("couldn't read"));

        let res = error_response(err);
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_credentials_is_internal_error() {
        let res = error_response(WeatherError::MissingCredentials(
            city_weather_core::ProviderId::OpenWeather,
        ));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
