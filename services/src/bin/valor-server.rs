use tracing::Subscriber;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, Layer,
    field::RecordFields,
    fmt::{
        FormatFields,
        format::{DefaultFields, Writer},
    },
    layer::Filter,
    prelude::*,
    registry::LookupSpan,
};
use valor_services::{
    config::{self, get_config_element},
    error::{self, Result},
};

/// Installs logging and starts the server.
pub async fn start_server() -> Result<()> {
    reroute_gdal_logging();
    let logging_config: config::Logging = get_config_element()?;

    let registry = tracing_subscriber::Registry::default();

    let registry = registry.with(console_layer_with_filter(env_filter(&logging_config)?));

    // `EnvFilter` is not `Clone`, so the file layer gets its own
    let (file_layer, _writer_drop_guard) = if logging_config.log_to_file {
        let (file_layer, writer_drop_guard) = file_layer_with_filter(
            &logging_config.filename_prefix,
            logging_config.log_directory.as_deref(),
            env_filter(&logging_config)?,
        )?;
        (Some(file_layer), Some(writer_drop_guard))
    } else {
        (None, None)
    };

    registry.with(file_layer).init();

    valor_services::server::start_server().await
}

fn env_filter(logging_config: &config::Logging) -> Result<EnvFilter> {
    EnvFilter::try_new(&logging_config.log_spec).map_err(|source| error::Error::InvalidLogSpec {
        log_spec: logging_config.log_spec.clone(),
        reason: source.to_string(),
    })
}

fn console_layer_with_filter<S, F: Filter<S> + 'static>(filter: F) -> impl Layer<S>
where
    S: Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .pretty()
        .with_file(false)
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(filter)
}

// format flags leak into spans even when `with_ansi` is false: https://github.com/tokio-rs/tracing/issues/1817
struct FileFormatterWorkaround(DefaultFields);

impl<'writer> FormatFields<'writer> for FileFormatterWorkaround {
    fn format_fields<R: RecordFields>(
        &self,
        writer: Writer<'writer>,
        fields: R,
    ) -> core::fmt::Result {
        self.0.format_fields(writer, fields)
    }
}

fn file_layer_with_filter<S, F: Filter<S> + 'static>(
    filename_prefix: &str,
    log_directory: Option<&str>,
    filter: F,
) -> Result<(impl Layer<S> + use<S, F>, WorkerGuard)>
where
    S: Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let file_appender = RollingFileAppender::builder()
        .max_log_files(7)
        .filename_prefix(filename_prefix)
        .filename_suffix("log")
        .rotation(Rotation::DAILY)
        .build(log_directory.unwrap_or("./"))
        .map_err(|source| error::Error::LogFile {
            reason: source.to_string(),
        })?;

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let layer = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_target(true)
        .fmt_fields(FileFormatterWorkaround(DefaultFields::default()))
        .with_ansi(false)
        .with_writer(non_blocking_writer)
        .with_filter(filter);
    Ok((layer, guard))
}

/// Routes GDAL's error handler into `tracing`. Raster reads report through it.
fn reroute_gdal_logging() {
    gdal::config::set_error_handler(|error_type, error_num, error_msg| {
        const LOG_TARGET: &str = "GDAL";
        match error_type {
            gdal::errors::CplErrType::None => {
                // should never log anything
                tracing::info!(target: LOG_TARGET, "GDAL None {error_num}: {error_msg}");
            }
            gdal::errors::CplErrType::Debug => {
                tracing::debug!(target: LOG_TARGET, "GDAL Debug {error_num}: {error_msg}");
            }
            gdal::errors::CplErrType::Warning => {
                tracing::warn!(target: LOG_TARGET, "GDAL Warning {error_num}: {error_msg}");
            }
            gdal::errors::CplErrType::Failure => {
                tracing::error!(target: LOG_TARGET, "GDAL Failure {error_num}: {error_msg}");
            }
            gdal::errors::CplErrType::Fatal => {
                tracing::error!(target: LOG_TARGET, "GDAL Fatal {error_num}: {error_msg}");
            }
        }
    });
}

#[tokio::main]
async fn main() {
    start_server().await.expect("the server has to start");
}
