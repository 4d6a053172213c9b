use poem::http::StatusCode;
use poem::web::Json;
use poem::{IntoResponse, Response};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Serialize)]
pub struct PredictionBody {
    pub prediction: usize,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    Json(ErrorBody {
        error: message.into(),
    })
    .with_status(status)
    .into_response()
}
