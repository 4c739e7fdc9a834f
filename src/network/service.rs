//! Hyper service running a handler chain

use std::convert::Infallible;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use tracing::{debug, warn};

use crate::context::{Context, Handler, PathParams, SharedBuffer};
use crate::BoxError;

/// Hyper service that feeds requests to a [`Handler`]
///
/// Request bodies are capped at `max_body_size` bytes. The response is
/// assembled from whatever the handler committed and wrote.
pub struct HandlerService<H> {
    handler: Arc<H>,
    max_body_size: usize,
}

impl<H> Clone for HandlerService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            max_body_size: self.max_body_size,
        }
    }
}

impl<H: Handler + 'static> HandlerService<H> {
    /// Create a service around `handler`
    #[must_use]
    pub fn new(handler: H, max_body_size: usize) -> Self {
        Self {
            handler: Arc::new(handler),
            max_body_size,
        }
    }

    /// Run one request through the handler
    pub async fn handle<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (mut parts, body) = request.into_parts();
        let path_params = parts
            .extensions
            .remove::<PathParams>()
            .unwrap_or_default();
        debug!("{} {}", parts.method, parts.uri);

        let body = Limited::new(body, self.max_body_size).boxed_unsync();
        let sink = SharedBuffer::new();
        let mut ctx = Context::new(Request::from_parts(parts, body), Box::new(sink.clone()))
            .with_path_params(path_params);

        match self.handler.call(&mut ctx).await {
            Ok(()) => build_response(&ctx, sink.take()),
            Err(e) => {
                warn!("Handler failed: {}", e);
                error_response(&e)
            }
        }
    }
}

impl<H, B> hyper::service::Service<Request<B>> for HandlerService<H>
where
    H: Handler + 'static,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn call(&self, request: Request<B>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(request).await) })
    }
}

fn build_response(ctx: &Context, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = ctx.response().status();
    *response.headers_mut() = ctx.response().headers().clone();
    response
}

/// Plain-text 500 response for a failed handler
#[must_use]
pub fn error_response(error: &BoxError) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(format!("Error: {error}"))));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
