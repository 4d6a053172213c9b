use poem::{Endpoint, Middleware, Request, Result};

/// Tags the Sentry scope with the request, so that the reported errors carry it.
pub struct SentryMiddleware;

impl<E: Endpoint> Middleware<E> for SentryMiddleware {
    type Output = SentryMiddlewareImpl<E>;

    fn transform(&self, ep: E) -> Self::Output {
        SentryMiddlewareImpl { ep }
    }
}

pub struct SentryMiddlewareImpl<E> {
    ep: E,
}

#[poem::async_trait]
impl<E: Endpoint> Endpoint for SentryMiddlewareImpl<E> {
    type Output = E::Output;

    async fn call(&self, request: Request) -> Result<Self::Output> {
        sentry::configure_scope(|scope| {
            scope.set_tag("request.method", request.method().as_str());
            scope.set_tag("request.path", request.uri().path());
            scope.set_tag("request.remote_addr", request.remote_addr());
        });
        self.ep.call(request).await
    }
}
