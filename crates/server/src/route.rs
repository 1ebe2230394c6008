use actix_web::{web, HttpResponse};
use log::{debug, warn};

use crate::params::{require_numbers, ParamError, QueryParams};
use crate::state::AppState;

/// Routes between two points and stores the result as the active route. Answers
/// with a JSON boolean telling whether a route is now active.
pub async fn route(
    state: web::Data<AppState>,
    query: web::Query<QueryParams>,
) -> Result<HttpResponse, ParamError> {
    let [start_lat, start_lon, end_lat, end_lon] =
        require_numbers(&query, ["start_lat", "start_lon", "end_lat", "end_lon"])?;
    debug!(
        "Route request ({}, {}) -> ({}, {})",
        start_lat, start_lon, end_lat, end_lon
    );

    let state = state.into_inner();
    let search = web::block(move || state.update_route(start_lat, start_lon, end_lat, end_lon));
    let found = match search.await {
        Ok(found) => found,
        Err(e) => {
            warn!("Route worker failed: {}", e);
            false
        }
    };
    Ok(HttpResponse::Ok().json(found))
}

pub async fn clear_route(state: web::Data<AppState>) -> HttpResponse {
    state.clear_route();
    HttpResponse::Ok().json(true)
}
