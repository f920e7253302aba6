use crate::config::{self, get_config_element};
use crate::error::{self, Result};
use crate::handlers;
use crate::util::server::{CustomRootSpanBuilder, configure_extractors, render_404, render_405};
use actix_cors::Cors;
use actix_web::{App, HttpServer, http, middleware, web};
use snafu::ResultExt;
use std::net::SocketAddr;
use tracing::info;
use tracing_actix_web::TracingLogger;
use valor_operators::engine::QueryContext;

/// Starts the webserver for the Valor API.
///
/// The raster path and zonal settings are read from the configuration once. The raster
/// itself is opened by each query.
pub async fn start_server() -> Result<()> {
    let web_config: config::Web = get_config_element()?;
    let raster_config: config::Raster = get_config_element()?;
    let zonal_config: config::Zonal = get_config_element()?;

    info!(
        "Starting server… bind address: {}, raster: {}",
        web_config.bind_address,
        raster_config.path.display()
    );

    if !raster_config.path.exists() {
        tracing::warn!(
            "raster `{}` does not exist, queries will fail until it does",
            raster_config.path.display()
        );
    }

    let ctx = QueryContext::new(raster_config.path, zonal_config.into());

    start(web_config.bind_address, ctx).await
}

async fn start(bind_address: SocketAddr, ctx: QueryContext) -> Result<()> {
    let wrapped_ctx = web::Data::new(ctx);

    HttpServer::new(move || {
        App::new()
            .app_data(wrapped_ctx.clone())
            .wrap(
                middleware::ErrorHandlers::default()
                    .handler(http::StatusCode::NOT_FOUND, render_404)
                    .handler(http::StatusCode::METHOD_NOT_ALLOWED, render_405),
            )
            .wrap(Cors::permissive())
            .wrap(TracingLogger::<CustomRootSpanBuilder>::new())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_extractors)
            .configure(handlers::init_routes)
    })
    .bind(bind_address)
    .context(error::Server)?
    .run()
    .await
    .context(error::Server)
}
