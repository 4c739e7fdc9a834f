//! Request context handed to handlers
//!
//! This is the narrow slice of an HTTP framework the recorder needs: a
//! request with a consume-once body, the path parameters a router matched,
//! and a response whose byte sink can be swapped out.

use std::io;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::future::BoxFuture;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Request, StatusCode};
use parking_lot::Mutex;
use tracing::warn;

use crate::{ApibError, BoxError};

/// Request body type seen by handlers
pub type Body = UnsyncBoxBody<Bytes, BoxError>;

/// Build a body that yields `bytes` once
pub fn full_body(bytes: impl Into<Bytes>) -> Body {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Build a body with no data
pub fn empty_body() -> Body {
    Empty::new().map_err(|never| match never {}).boxed_unsync()
}

/// Named path parameters matched by a router, in route order
///
/// Routers store this in the request extensions; the adapter in
/// [`crate::network`] moves it into the [`Context`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    /// Create an empty parameter list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Look up a parameter value by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Byte sink a response is written to
pub trait ResponseWriter: Send {
    /// Send the status line
    fn write_header(&mut self, status: StatusCode);

    /// Write body bytes
    ///
    /// # Errors
    ///
    /// Returns error if the underlying connection rejects the write
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// In-memory sink whose contents can be read from another handle
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<BytesMut>>);

impl SharedBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    #[must_use]
    pub fn bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.0.lock())
    }

    /// Take everything written so far, leaving the buffer empty
    #[must_use]
    pub fn take(&self) -> Bytes {
        self.0.lock().split().freeze()
    }
}

impl ResponseWriter for SharedBuffer {
    fn write_header(&mut self, _status: StatusCode) {}

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }
}

/// Placeholder sink used while a writer is being swapped
struct Detached;

impl ResponseWriter for Detached {
    fn write_header(&mut self, _status: StatusCode) {}

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }
}

/// Response under construction
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    committed: bool,
    writer: Box<dyn ResponseWriter>,
}

impl Response {
    /// Create a response that writes to `writer`
    #[must_use]
    pub fn new(writer: Box<dyn ResponseWriter>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            committed: false,
            writer,
        }
    }

    /// Status sent (or to be sent) to the client
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Whether the status line has been sent
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Send the status line. Later calls are ignored.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.committed {
            warn!("Response already committed, ignoring status {}", status);
            return;
        }
        self.status = status;
        self.writer.write_header(status);
        self.committed = true;
    }

    /// Write body bytes, committing the current status first
    ///
    /// # Errors
    ///
    /// Returns error if the sink rejects the write
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.committed {
            self.write_header(self.status);
        }
        self.writer.write(buf)
    }

    /// Replace the sink with one built around the current sink
    pub fn wrap_writer<F>(&mut self, wrap: F)
    where
        F: FnOnce(Box<dyn ResponseWriter>) -> Box<dyn ResponseWriter>,
    {
        let inner = std::mem::replace(&mut self.writer, Box::new(Detached));
        self.writer = wrap(inner);
    }
}

/// One request in flight
pub struct Context {
    request: Request<Body>,
    path_params: PathParams,
    response: Response,
}

impl Context {
    /// Create a context for `request` whose response goes to `writer`
    ///
    /// Path parameters stored in the request extensions are picked up.
    #[must_use]
    pub fn new(mut request: Request<Body>, writer: Box<dyn ResponseWriter>) -> Self {
        let path_params = request
            .extensions_mut()
            .remove::<PathParams>()
            .unwrap_or_default();

        Self {
            request,
            path_params,
            response: Response::new(writer),
        }
    }

    /// Replace the path parameters
    #[must_use]
    pub fn with_path_params(mut self, path_params: PathParams) -> Self {
        self.path_params = path_params;
        self
    }

    /// The request
    #[must_use]
    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    /// Mutable request
    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    /// Path parameters matched by the router
    #[must_use]
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// Single path parameter
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    /// Take the request body, leaving an empty one behind
    pub fn take_body(&mut self) -> Body {
        std::mem::replace(self.request.body_mut(), empty_body())
    }

    /// Install a new request body
    pub fn set_body(&mut self, body: Body) {
        *self.request.body_mut() = body;
    }

    /// Read the whole request body
    ///
    /// # Errors
    ///
    /// Returns error if the body stream fails
    pub async fn body_bytes(&mut self) -> Result<Bytes, BoxError> {
        let collected = self
            .take_body()
            .collect()
            .await
            .map_err(|e| ApibError::BodyRead(e.to_string()))?;
        Ok(collected.to_bytes())
    }

    /// The response
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Mutable response
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Set a response header
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers_mut().insert(name, value);
    }

    /// Send the status line
    pub fn write_header(&mut self, status: StatusCode) {
        self.response.write_header(status);
    }

    /// Write body bytes
    ///
    /// # Errors
    ///
    /// Returns error if the sink rejects the write
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.response.write(buf)
    }

    /// Send a complete response with the given status and content type
    ///
    /// # Errors
    ///
    /// Returns error if the sink rejects the write
    pub fn send(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
        body: &[u8],
    ) -> io::Result<()> {
        self.set_header(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.write_header(status);
        if !body.is_empty() {
            self.write(body)?;
        }
        Ok(())
    }
}

/// Asynchronous request handler
pub trait Handler: Send + Sync {
    /// Handle one request
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), BoxError>> {
        (**self).call(ctx)
    }
}

/// Handler built from a closure, see [`handler_fn`]
#[derive(Clone)]
pub struct HandlerFn<F>(F);

/// Turn a closure into a [`Handler`]
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<(), BoxError>> + Send + Sync,
{
    HandlerFn(f)
}

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<(), BoxError>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), BoxError>> {
        (self.0)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context(body: &'static str) -> (Context, SharedBuffer) {
        let request = Request::builder()
            .method("POST")
            .uri("/items")
            .body(full_body(body))
            .unwrap();
        let sink = SharedBuffer::new();
        (Context::new(request, Box::new(sink.clone())), sink)
    }

    #[test]
    fn test_path_params_lookup() {
        let params: PathParams = [("id", "42"), ("slug", "hello")].into_iter().collect();

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_context_reads_path_params_from_extensions() {
        let mut params = PathParams::new();
        params.push("id", "7");
        let request = Request::builder()
            .uri("/orders/7")
            .extension(params)
            .body(empty_body())
            .unwrap();

        let ctx = Context::new(request, Box::new(SharedBuffer::new()));
        assert_eq!(ctx.param("id"), Some("7"));
    }

    #[test]
    fn test_write_commits_default_status() {
        let (mut ctx, sink) = test_context("");

        assert!(!ctx.response().is_committed());
        ctx.write(b"hello").unwrap();

        assert!(ctx.response().is_committed());
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert_eq!(sink.bytes(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_second_write_header_ignored() {
        let (mut ctx, _sink) = test_context("");

        ctx.write_header(StatusCode::CREATED);
        ctx.write_header(StatusCode::NOT_FOUND);

        assert_eq!(ctx.response().status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_body_is_consumed_once() {
        let (mut ctx, _sink) = test_context("payload");

        assert_eq!(ctx.body_bytes().await.unwrap(), Bytes::from("payload"));
        assert!(ctx.body_bytes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handler_fn() {
        let handler = handler_fn(|ctx| {
            Box::pin(async move {
                ctx.send(StatusCode::ACCEPTED, "text/plain", b"ok")?;
                Ok::<(), BoxError>(())
            })
        });
        let (mut ctx, sink) = test_context("");

        handler.call(&mut ctx).await.unwrap();

        assert_eq!(ctx.response().status(), StatusCode::ACCEPTED);
        assert_eq!(ctx.response().headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(sink.take(), Bytes::from_static(b"ok"));
    }
}
