use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, test, web};
use serde::{Deserialize, Serialize};
use std::fmt;
use valor_operators::engine::QueryStage;

pub mod health;
pub mod point;
pub mod zonal;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// The query stage that failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<QueryStage>,
}

impl ErrorResponse {
    /// Assert that a `Response` has a certain `status`, `error` and `stage`.
    ///
    /// # Panics
    /// Panics if `status`, `error` or `stage` do not match.
    ///
    pub async fn assert(res: ServiceResponse, status: u16, error: &str, stage: Option<QueryStage>) {
        assert_eq!(res.status(), status);

        let body: Self = test::read_body_json(res).await;
        assert_eq!(body.error, error, "{}", body.message);
        assert_eq!(body.stage, stage);
    }
}

impl actix_web::ResponseError for ErrorResponse {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Registers all query endpoints
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    health::init_health_routes(cfg);
    point::init_point_routes(cfg);
    zonal::init_zonal_routes(cfg);
}
