use crate::error::{self, Result};
use actix_web::web;
use serde::Deserialize;
use serde_json::Value;
use snafu::ResultExt;
use valor_operators::engine::QueryContext;
use valor_operators::processing::{
    GeometryDiagnostics, ZonalStatistics, diagnose, zonal_statistics,
};
use valor_operators::util::async_util::spawn_blocking;

pub(crate) fn init_zonal_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/zonal").route(web::post().to(zonal_handler)))
        .service(web::resource("/zonal/debug").route(web::post().to(zonal_debug_handler)));
}

/// A polygonal area of interest.
///
/// The geometry is a GeoJSON `Polygon` or `MultiPolygon` in WGS 84, either as an object
/// or as a string containing one.
#[derive(Debug, Clone, Deserialize)]
pub struct ZonalQuery {
    pub geometry: Value,
}

/// Computes the mean raster value inside a geometry.
///
/// # Example
///
/// ```text
/// POST /zonal
///
/// {
///   "geometry": {
///     "type": "Polygon",
///     "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
///   }
/// }
/// ```
/// Response:
/// ```text
/// {"mean": 1.0, "count": 99}
/// ```
async fn zonal_handler(
    ctx: web::Data<QueryContext>,
    query: web::Json<ZonalQuery>,
) -> Result<web::Json<ZonalStatistics>> {
    let ctx = ctx.into_inner();
    let ZonalQuery { geometry } = query.into_inner();

    let statistics = spawn_blocking(move || zonal_statistics(&ctx, &geometry))
        .await
        .context(error::TokioJoin)??;

    Ok(web::Json(statistics))
}

/// Explains how a geometry is interpreted without reading any pixels.
async fn zonal_debug_handler(
    ctx: web::Data<QueryContext>,
    query: web::Json<ZonalQuery>,
) -> Result<web::Json<GeometryDiagnostics>> {
    let ctx = ctx.into_inner();
    let ZonalQuery { geometry } = query.into_inner();

    let diagnostics = spawn_blocking(move || diagnose(&ctx, &geometry))
        .await
        .context(error::TokioJoin)??;

    Ok(web::Json(diagnostics))
}
