use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};

use pubroulette_core::{
    model::{CrawlLength, InvalidQuery, SearchArea, Venue},
    service::RouletteError,
};

use crate::app::AppState;

// response codes
const ERR_GENERAL_ROULETTE: &str = "1";
const ERR_NO_PUBS_FOUND: &str = "2";
const ERR_INVALID_INPUT: &str = "4";

#[derive(Debug, Deserialize)]
struct PubParams {
    lat: f64,
    lon: f64,
    radius: i64,
}

#[derive(Debug, Deserialize)]
struct CrawlParams {
    lat: f64,
    lon: f64,
    radius: i64,
    length: i64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Failure modes visible to HTTP clients.
#[derive(Debug)]
pub(crate) enum ApiError {
    InvalidInput(String),
    Roulette(RouletteError),
}

impl From<InvalidQuery> for ApiError {
    fn from(err: InvalidQuery) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<RouletteError> for ApiError {
    fn from(err: RouletteError) -> Self {
        Self::Roulette(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::InvalidInput(message) => (StatusCode::BAD_REQUEST, ERR_INVALID_INPUT, message),
            Self::Roulette(RouletteError::NoCandidatesFound) => (
                StatusCode::NOT_FOUND,
                ERR_NO_PUBS_FOUND,
                RouletteError::NoCandidatesFound.to_string(),
            ),
            Self::Roulette(err) => {
                // backend detail stays in the logs
                error!(error = %err, "roulette failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ERR_GENERAL_ROULETTE,
                    String::from("temporarily unable to find a valid pub, please try again"),
                )
            }
        };

        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}

/// Build the router with CORS limited to `allowed_origins`.
pub(crate) fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/pub", get(play))
        .route("/crawl", get(crawl))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn play(
    State(state): State<AppState>,
    params: Result<Query<PubParams>, QueryRejection>,
) -> Result<Json<Venue>, ApiError> {
    let Query(params) = params?;
    let area = SearchArea::new(params.lat, params.lon, params.radius)?;

    let venue = state.roulette.play(&area).await?;
    Ok(Json(venue))
}

async fn crawl(
    State(state): State<AppState>,
    params: Result<Query<CrawlParams>, QueryRejection>,
) -> Result<Json<Vec<Venue>>, ApiError> {
    let Query(params) = params?;
    let area = SearchArea::new(params.lat, params.lon, params.radius)?;
    let length = CrawlLength::new(params.length)?;

    let venues = state.crawl.crawl(&area, length).await?;
    Ok(Json(venues))
}
