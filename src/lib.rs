//! apib-recorder - API Blueprint documentation from live HTTP traffic
//!
//! Wrap a handler with the recording middleware, declare a group and a
//! name before each request worth documenting, and write one `.apib` file
//! per group when done.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::multiple_crate_versions
)]

pub mod blueprint;
pub mod config;
pub mod context;
mod control;
pub mod error;
pub mod network;
pub mod recording;
mod state;

pub use config::Config;
pub use context::{handler_fn, Context, Handler, PathParams};
pub use control::{
    add_param, exchange_count, flush, group, init, is_recording, middleware, name, record, state,
    stop, store,
};
pub use error::{ApibError, BoxError, Result};
pub use recording::{Exchange, ParamSpec, Recorder};
pub use state::ApibState;
