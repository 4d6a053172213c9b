use poem::error::{MethodNotAllowedError, NotFoundError, ReadBodyError};
use poem::http::StatusCode;
use poem::{Endpoint, Middleware, Request, Response, Result};

use crate::prelude::*;
use crate::web::responses::error_response;

/// Converts the errors escaping the endpoints into JSON error responses.
pub struct ErrorMiddleware;

impl<E: Endpoint<Output = Response>> Middleware<E> for ErrorMiddleware {
    type Output = ErrorMiddlewareImpl<E>;

    fn transform(&self, ep: E) -> Self::Output {
        ErrorMiddlewareImpl { ep }
    }
}

pub struct ErrorMiddlewareImpl<E> {
    ep: E,
}

#[poem::async_trait]
impl<E: Endpoint<Output = Response>> Endpoint for ErrorMiddlewareImpl<E> {
    type Output = Response;

    async fn call(&self, request: Request) -> Result<Self::Output> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        match self.ep.call(request).await {
            Err(error) if error.is::<NotFoundError>() => {
                info!(?method, ?uri, "{:#}", error);
                Ok(error_response(StatusCode::NOT_FOUND, "Not found"))
            }
            Err(error) if error.is::<MethodNotAllowedError>() => {
                info!(?method, ?uri, "{:#}", error);
                Ok(error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"))
            }
            Err(error) if error.is::<ReadBodyError>() => {
                info!(?method, ?uri, "{:#}", error);
                Ok(error_response(StatusCode::BAD_REQUEST, error.to_string()))
            }
            Err(error) => {
                error!(?method, ?uri, "{:#}", error);
                Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()))
            }
            result => result,
        }
    }
}
