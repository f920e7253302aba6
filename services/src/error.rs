use crate::handlers::ErrorResponse;
use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use snafu::Snafu;
use strum::IntoStaticStr;
use valor_operators::error::QueryError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu, IntoStaticStr)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))] // disables default `Snafu` suffix
pub enum Error {
    #[snafu(display("{source}"))]
    Query {
        source: QueryError,
    },

    TokioJoin {
        source: tokio::task::JoinError,
    },

    #[snafu(display("Unable to bind or run the server: {source}"))]
    Server {
        source: std::io::Error,
    },

    #[snafu(display("Configuration error: {source}"))]
    Config {
        source: config::ConfigError,
    },

    ConfigLockFailed,

    MissingWorkingDirectory {
        source: std::io::Error,
    },

    MissingSettingsDirectory,

    #[snafu(display("Unable to create log file appender: {reason}"))]
    LogFile {
        reason: String,
    },

    #[snafu(display("Invalid log spec `{log_spec}`: {reason}"))]
    InvalidLogSpec {
        log_spec: String,
        reason: String,
    },
}

impl From<QueryError> for Error {
    fn from(source: QueryError) -> Self {
        Self::Query { source }
    }
}

impl actix_web::ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::from(self))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::Query { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&Error> for ErrorResponse {
    fn from(value: &Error) -> Self {
        match value {
            Error::Query { source } => ErrorResponse {
                error: source.kind().to_string(),
                message: source.source.to_string(),
                stage: Some(source.stage),
            },
            _ => ErrorResponse {
                error: Into::<&str>::into(value).to_string(),
                message: value.to_string(),
                stage: None,
            },
        }
    }
}
