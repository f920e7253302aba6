use crate::handlers::init_routes;
use crate::util::server::{configure_extractors, render_404, render_405};
use actix_cors::Cors;
use actix_web::dev::ServiceResponse;
use actix_web::{App, http, middleware, test, web};
use std::path::Path;
use valor_operators::engine::{QueryContext, ZonalSettings};

/// A query context over the 10×10 unit raster written into `dir`
pub(crate) fn unit_context(dir: &Path) -> QueryContext {
    QueryContext::new(
        valor_operators::util::test::create_unit_geotiff(dir),
        ZonalSettings::default(),
    )
}

pub(crate) async fn send_test_request(req: test::TestRequest, ctx: QueryContext) -> ServiceResponse {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ctx))
            .wrap(
                middleware::ErrorHandlers::default()
                    .handler(http::StatusCode::NOT_FOUND, render_404)
                    .handler(http::StatusCode::METHOD_NOT_ALLOWED, render_405),
            )
            .wrap(Cors::permissive())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_extractors)
            .configure(init_routes),
    )
    .await;

    test::call_service(&app, req.to_request())
        .await
        .map_into_boxed_body()
}
