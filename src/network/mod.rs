//! Hyper adapter
//!
//! Serves a [`Handler`](crate::Handler) chain over HTTP/1 and HTTP/2.
//! Routing is left to the application: a router stores the matched
//! [`PathParams`](crate::PathParams) in the request extensions before the
//! request reaches [`HandlerService`].

mod server;
mod service;

pub use server::serve;
pub use service::{error_response, HandlerService};
