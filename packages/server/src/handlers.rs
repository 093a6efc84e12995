//! HTTP handler functions for the GDELT Pulse API.

use std::fmt::Display;

use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use gdelt_pulse_aggregator::Aggregation;
use gdelt_pulse_event_models::{Category, TimeWindow};
use gdelt_pulse_server_models::{
    ApiCategory, ApiErrorResponse, ApiHealth, ApiTimeWindow, EventsQueryParams, EventsResponse,
};

use crate::AppState;

/// Shared caching for 5 minutes, stale content served for 10 more.
pub const EVENTS_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/categories`
pub async fn categories() -> HttpResponse {
    let table: Vec<ApiCategory> = Category::all().iter().copied().map(ApiCategory::from).collect();
    HttpResponse::Ok().json(table)
}

/// `GET /api/time-windows`
pub async fn time_windows() -> HttpResponse {
    let table: Vec<ApiTimeWindow> = TimeWindow::all()
        .iter()
        .copied()
        .map(ApiTimeWindow::from)
        .collect();
    HttpResponse::Ok().json(table)
}

/// `GET /api/events`
///
/// Fans out one upstream request per category and returns whatever
/// succeeded. Per-category failures only set `hasErrors`; a malformed
/// query is rejected with 400 and a failure of the handler itself
/// yields 500.
pub async fn events(
    state: web::Data<AppState>,
    params: web::Query<EventsQueryParams>,
) -> HttpResponse {
    let (window, categories) = match parse_events_query(&params) {
        Ok(parsed) => parsed,
        Err(message) => {
            log::warn!("Rejected events request: {message}");
            return HttpResponse::BadRequest()
                .json(ApiErrorResponse::new("Invalid request", message));
        }
    };

    let aggregator = state.aggregator.clone();
    let task = actix_web::rt::spawn(async move { aggregator.aggregate(&categories, window).await });

    events_response(task.await)
}

/// Builds the events response from the outcome of the aggregation task.
fn events_response<E: Display>(result: Result<Aggregation, E>) -> HttpResponse {
    match result {
        Ok(aggregation) => HttpResponse::Ok()
            .insert_header((header::CACHE_CONTROL, EVENTS_CACHE_CONTROL))
            .json(EventsResponse {
                total_count: aggregation.events.len(),
                events: aggregation.events,
                time_filter: aggregation.time_window,
                categories: aggregation.categories,
                has_errors: aggregation.has_errors,
            }),
        Err(e) => {
            log::error!("API route error: {e}");
            HttpResponse::InternalServerError()
                .json(ApiErrorResponse::new("Failed to fetch events", e.to_string()))
        }
    }
}

/// Rejects query strings that do not deserialize, using the same error
/// body as [`events`] uses for unknown values.
pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = err.to_string();
    log::warn!("Rejected events request: {message}");
    let response = HttpResponse::BadRequest().json(ApiErrorResponse::new("Invalid request", message));
    InternalError::from_response(err, response).into()
}

/// Strictly parses the events query. Absent values fall back to `24H`
/// and all categories; anything unrecognized is an error.
fn parse_events_query(params: &EventsQueryParams) -> Result<(TimeWindow, Vec<Category>), String> {
    let window = match params.time_filter.as_deref() {
        None => TimeWindow::default(),
        Some(raw) => raw
            .parse()
            .map_err(|_| format!("unknown timeFilter '{raw}'"))?,
    };

    let categories = match params.categories.as_deref().map(str::trim) {
        None | Some("") => Category::all().to_vec(),
        Some(raw) => raw
            .split(',')
            .map(|token| {
                let token = token.trim();
                token
                    .parse::<Category>()
                    .map_err(|_| format!("unknown category '{token}'"))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok((window, categories))
}
