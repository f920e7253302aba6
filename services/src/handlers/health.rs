use actix_web::{Responder, web};
use serde::Serialize;
use valor_operators::engine::QueryContext;

pub(crate) fn init_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health_handler)));
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    raster: String,
}

/// Reports that the server is up and which raster it serves.
/// The raster itself is only opened by queries.
#[allow(clippy::unused_async)] // the function signature of request handlers requires it
async fn health_handler(ctx: web::Data<QueryContext>) -> impl Responder {
    web::Json(HealthStatus {
        status: "ok",
        raster: ctx.raster_path().display().to_string(),
    })
}
