use crate::error::{self, Result};
use actix_web::web;
use serde::Deserialize;
use snafu::ResultExt;
use tracing::debug;
use valor_operators::engine::QueryContext;
use valor_operators::processing::{PointValue, sample_point};
use valor_operators::util::async_util::spawn_blocking;

pub(crate) fn init_point_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/point").route(web::post().to(point_handler)));
}

/// A location in WGS 84
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PointQuery {
    pub lon: f64,
    pub lat: f64,
}

/// Returns the raster value at a location or `null` where there is none.
///
/// # Example
///
/// ```text
/// POST /point
///
/// {"lon": 0.5, "lat": 0.5}
/// ```
/// Response:
/// ```text
/// {"value": 1.0}
/// ```
async fn point_handler(
    ctx: web::Data<QueryContext>,
    query: web::Json<PointQuery>,
) -> Result<web::Json<PointValue>> {
    let PointQuery { lon, lat } = query.into_inner();
    debug!(lon, lat, "point query");

    let ctx = ctx.into_inner();
    let value = spawn_blocking(move || sample_point(&ctx, (lon, lat).into()))
        .await
        .context(error::TokioJoin)??;

    Ok(web::Json(value))
}

#[cfg(test)]
mod tests {
    use crate::handlers::ErrorResponse;
    use crate::util::tests::{send_test_request, unit_context};
    use actix_web::http::{Method, header};
    use actix_web::test;
    use serde_json::json;
    use valor_operators::engine::{QueryContext, QueryStage, ZonalSettings};

    async fn query_point(ctx: QueryContext, lon: f64, lat: f64) -> actix_web::dev::ServiceResponse {
        let req = test::TestRequest::post()
            .uri("/point")
            .set_json(json!({"lon": lon, "lat": lat}));
        send_test_request(req, ctx).await
    }

    #[actix_rt::test]
    async fn it_returns_pixel_values() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = unit_context(dir.path());

        let res = query_point(ctx, 0.5, 0.5).await;

        assert_eq!(res.status(), 200);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body, json!({"value": 1.0}));
    }

    #[actix_rt::test]
    async fn it_returns_null_for_no_data() {
        let dir = tempfile::tempdir().unwrap();

        // center of pixel (5, 5)
        let res = query_point(unit_context(dir.path()), 5.5, 5.5).await;

        assert_eq!(res.status(), 200);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body, json!({"value": null}));
    }

    #[actix_rt::test]
    async fn it_returns_null_outside_of_the_raster() {
        let dir = tempfile::tempdir().unwrap();

        let res = query_point(unit_context(dir.path()), 45.0, 45.0).await;

        assert_eq!(res.status(), 200);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body, json!({"value": null}));
    }

    #[actix_rt::test]
    async fn it_reports_missing_rasters() {
        let ctx = QueryContext::new("/does/not/exist.tif", ZonalSettings::default());

        let res = query_point(ctx, 0.5, 0.5).await;

        ErrorResponse::assert(res, 400, "RasterAccessError", Some(QueryStage::Read)).await;
    }

    #[actix_rt::test]
    async fn it_rejects_malformed_bodies() {
        let dir = tempfile::tempdir().unwrap();
        let req = test::TestRequest::post()
            .uri("/point")
            .append_header((header::CONTENT_TYPE, "application/json"))
            .set_payload(r#"{"lon": "east"}"#);

        let res = send_test_request(req, unit_context(dir.path())).await;

        ErrorResponse::assert(res, 400, "BodyDeserializeError", None).await;
    }

    #[actix_rt::test]
    async fn it_answers_preflight_requests() {
        let dir = tempfile::tempdir().unwrap();

        let res = send_test_request(
            test::TestRequest::default()
                .method(Method::OPTIONS)
                .uri("/point")
                .insert_header((header::ORIGIN, "https://maps.example.org"))
                .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
                .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")),
            unit_context(dir.path()),
        )
        .await;

        assert_eq!(res.status(), 200);
        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://maps.example.org"
        );
        assert!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .unwrap()
                .to_str()
                .unwrap()
                .contains("POST")
        );
    }

    #[actix_rt::test]
    async fn it_rejects_get() {
        let dir = tempfile::tempdir().unwrap();

        let res = send_test_request(
            test::TestRequest::get().uri("/point"),
            unit_context(dir.path()),
        )
        .await;

        ErrorResponse::assert(res, 405, "MethodNotAllowed", None).await;
    }
}
