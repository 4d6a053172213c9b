use poem::http::HeaderValue;
use poem::{Endpoint, IntoResponse, Middleware, Request, Response, Result};

pub struct SecurityHeadersMiddleware;

impl<E: Endpoint> Middleware<E> for SecurityHeadersMiddleware {
    type Output = SecurityHeadersMiddlewareImpl<E>;

    fn transform(&self, ep: E) -> Self::Output {
        SecurityHeadersMiddlewareImpl { ep }
    }
}

pub struct SecurityHeadersMiddlewareImpl<E> {
    ep: E,
}

#[poem::async_trait]
impl<E: Endpoint> Endpoint for SecurityHeadersMiddlewareImpl<E> {
    type Output = Response;

    async fn call(&self, request: Request) -> Result<Self::Output> {
        let mut response = self.ep.call(request).await?.into_response();
        let headers = response.headers_mut();
        headers.remove("Server");
        headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
        headers.insert("X-Frame-Options", HeaderValue::from_static("deny"));
        headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
        Ok(response)
    }
}
