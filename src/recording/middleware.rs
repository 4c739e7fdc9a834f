//! Middleware that records exchanges while passing them through

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http_body_util::BodyExt;
use tracing::{debug, warn};

use crate::context::{full_body, Context, Handler, PathParams};
use crate::BoxError;

use super::capture::{CaptureWriter, Tap};
use super::exchange::{first_values, parse_query, Exchange, RecordedRequest, RecordedResponse};
use super::registry::Registry;
use super::CATCH_ALL_PARAM;

/// Handler wrapper that records exchanges into a [`Registry`]
pub struct Recorder<H> {
    next: H,
    registry: Arc<Registry>,
}

impl<H: Handler> Recorder<H> {
    /// Wrap `next`, recording into `registry`
    #[must_use]
    pub fn new(next: H, registry: Arc<Registry>) -> Self {
        Self { next, registry }
    }

    async fn intercept(&self, ctx: &mut Context) -> Result<(), BoxError> {
        let Some(ambient) = self.registry.begin() else {
            debug!(
                "Not recording: {} {}",
                ctx.request().method(),
                ctx.request().uri()
            );
            return self.next.call(ctx).await;
        };

        let body = drain_body(ctx).await;
        let mut request = snapshot_request(ctx, body);
        let path_params = substitute_path_params(&mut request, ctx.path_params());

        let tap = Tap::new();
        let writer_tap = tap.clone();
        ctx.response_mut()
            .wrap_writer(move |inner| Box::new(CaptureWriter::new(inner, writer_tap)));

        if let Err(e) = self.next.call(ctx).await {
            debug!(
                "Handler failed, not recording {} / {}: {}",
                ambient.group, ambient.name, e
            );
            return Err(e);
        }

        let response = RecordedResponse {
            status_code: tap.status().unwrap_or(ctx.response().status()).as_u16(),
            headers: first_values(ctx.response().headers()),
            body: tap.body(),
        };

        self.registry.commit(Exchange {
            group: ambient.group,
            name: ambient.name,
            request,
            response,
            path_params,
            extra_params: ambient.extra_params,
        });

        Ok(())
    }
}

impl<H: Handler> Handler for Recorder<H> {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.intercept(ctx))
    }
}

/// Read the request body into memory and put an identical body back
async fn drain_body(ctx: &mut Context) -> Bytes {
    let bytes = match ctx.take_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("Failed to read request body, recording it as empty: {}", e);
            Bytes::new()
        }
    };
    ctx.set_body(full_body(bytes.clone()));
    bytes
}

fn snapshot_request(ctx: &Context, body: Bytes) -> RecordedRequest {
    let request = ctx.request();
    let uri = request.uri();
    let effective_uri = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());

    RecordedRequest {
        effective_uri,
        method: request.method().as_str().to_string(),
        headers: first_values(request.headers()),
        query_params: uri.query().map(parse_query).unwrap_or_default(),
        body,
    }
}

/// Name a path parameter is documented under
///
/// `*` is not a legal blueprint parameter name and becomes
/// [`CATCH_ALL_PARAM`]; everything else is path-escaped.
#[must_use]
pub fn blueprint_param_name(name: &str) -> Cow<'_, str> {
    if name == "*" {
        Cow::Borrowed(CATCH_ALL_PARAM)
    } else {
        urlencoding::encode(name)
    }
}

/// Replace matched path segments in the request URI with `{name}`
/// placeholders and list the parameters alongside the query parameters
///
/// Only the first occurrence of `/value` is replaced. A value that does
/// not appear in the URI is still recorded as a parameter.
pub fn substitute_path_params(
    request: &mut RecordedRequest,
    params: &PathParams,
) -> BTreeMap<String, String> {
    let mut path_params = BTreeMap::new();

    for (key, value) in params.iter() {
        let name = blueprint_param_name(key).into_owned();
        request
            .query_params
            .insert(name.clone(), vec![value.to_string()]);
        request.effective_uri = request.effective_uri.replacen(
            &format!("/{value}"),
            &format!("/{{{name}}}"),
            1,
        );
        path_params.insert(name, value.to_string());
    }

    path_params
}
