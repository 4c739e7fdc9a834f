//! Capturing live exchanges into the recording registry

mod capture;
mod exchange;
mod middleware;
mod registry;

pub use capture::{CaptureWriter, Tap};
pub use exchange::{
    first_values, parse_query, Exchange, Headers, ParamSpec, QueryParams, RecordedRequest,
    RecordedResponse,
};
pub use middleware::{blueprint_param_name, substitute_path_params, Recorder};
pub use registry::{Ambient, Registry, Snapshot};

/// Blueprint name for a `*` (match-all) path parameter
pub const CATCH_ALL_PARAM: &str = "catch_all";
