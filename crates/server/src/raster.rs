use actix_web::{web, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, warn};
use render::{compose_raster, encode_png};
use serde::Serialize;
use tileindex::{plan_raster, BoundingBox};

use crate::params::{require_numbers, ParamError, QueryParams};
use crate::state::AppState;

/// Successful `/raster` answer.
#[derive(Debug, Serialize)]
pub struct RasterResponse {
    pub raster_ul_lon: f64,
    pub raster_ul_lat: f64,
    pub raster_lr_lon: f64,
    pub raster_lr_lat: f64,
    pub raster_width: u32,
    pub raster_height: u32,
    pub depth: u32,
    pub query_success: bool,
    pub b64_encoded_image_data: String,
}

#[derive(Debug, Serialize)]
struct RasterFailure {
    query_success: bool,
    error: String,
}

impl RasterFailure {
    fn new(error: impl ToString) -> Self {
        Self {
            query_success: false,
            error: error.to_string(),
        }
    }
}

/// Plans, composes and encodes the raster for a viewport `width_px` wide, with
/// the active route drawn on top.
pub fn render_raster(
    state: &AppState,
    query: &BoundingBox,
    width_px: f64,
) -> render::StatusOr<RasterResponse> {
    let plan = plan_raster(&state.index, query, width_px)?;
    let mut image = compose_raster(&plan, state.tiles.as_ref())?;
    if let Some(route) = state.active_route() {
        state.overlay.draw(&mut image, &plan, &route, &state.graph);
    }
    let png = encode_png(&image)?;

    Ok(RasterResponse {
        raster_ul_lon: plan.bbox.ullon,
        raster_ul_lat: plan.bbox.ullat,
        raster_lr_lon: plan.bbox.lrlon,
        raster_lr_lat: plan.bbox.lrlat,
        raster_width: plan.width,
        raster_height: plan.height,
        depth: plan.depth,
        query_success: true,
        b64_encoded_image_data: STANDARD.encode(png),
    })
}

pub async fn raster(
    state: web::Data<AppState>,
    query: web::Query<QueryParams>,
) -> Result<HttpResponse, ParamError> {
    // h is required but the depth only depends on the width
    let [ullat, ullon, lrlat, lrlon, w, _h] =
        require_numbers(&query, ["ullat", "ullon", "lrlat", "lrlon", "w", "h"])?;
    let bbox = BoundingBox::new(ullat, ullon, lrlat, lrlon);
    debug!("Raster request for {:?} at {} px", bbox, w);

    let state = state.into_inner();
    let response = match web::block(move || render_raster(&state, &bbox, w)).await {
        Ok(Ok(raster)) => HttpResponse::Ok().json(raster),
        Ok(Err(e)) => {
            warn!("Raster for {:?} failed: {}", bbox, e);
            HttpResponse::Ok().json(RasterFailure::new(e))
        }
        Err(e) => {
            warn!("Raster worker failed: {}", e);
            HttpResponse::Ok().json(RasterFailure::new(e))
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_state;
    use crate::{configure, cors_headers};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_raster_success() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/raster?ullat=1&ullon=0&lrlat=0&lrlon=1&w=8&h=8")
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["query_success"], true);
        assert_eq!(resp["depth"], 1);
        assert_eq!(resp["raster_width"], 8);
        assert_eq!(resp["raster_height"], 8);
        assert_eq!(resp["raster_ul_lat"], 1.0);
        assert_eq!(resp["raster_lr_lon"], 1.0);

        let png = STANDARD
            .decode(resp["b64_encoded_image_data"].as_str().unwrap())
            .unwrap();
        let image = image::load_from_memory(&png).unwrap();
        assert_eq!((image.width(), image.height()), (8, 8));
    }

    #[actix_web::test]
    async fn test_raster_outside_region() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/raster?ullat=5&ullon=3&lrlat=4&lrlon=4&w=100&h=100")
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["query_success"], false);
        assert!(resp["error"].as_str().unwrap().contains("No tiles"));
    }

    #[actix_web::test]
    async fn test_raster_bad_params() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .wrap(cors_headers())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/raster?ullat=1&ullon=0&lrlat=0&lrlon=1&w=8")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(resp.headers().contains_key("access-control-allow-origin"));
        let body = test::read_body(resp).await;
        assert_eq!(body, "Request failed - parameters missing.");

        let req = test::TestRequest::get()
            .uri("/raster?ullat=1&ullon=west&lrlat=0&lrlon=1&w=8&h=8")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = test::read_body(resp).await;
        assert_eq!(body, "Incorrect parameters - provide numbers.");
    }

    #[::core::prelude::v1::test]
    fn test_route_is_drawn_when_active() {
        let state = test_state();
        let bbox = BoundingBox::new(1.0, 0.0, 0.0, 1.0);
        let plain = render_raster(&state, &bbox, 16.0).unwrap();

        assert!(state.update_route(0.875, 0.125, 0.5, 0.5));
        let routed = render_raster(&state, &bbox, 16.0).unwrap();
        assert_ne!(plain.b64_encoded_image_data, routed.b64_encoded_image_data);

        state.clear_route();
        let cleared = render_raster(&state, &bbox, 16.0).unwrap();
        assert_eq!(plain.b64_encoded_image_data, cleared.b64_encoded_image_data);
    }
}
