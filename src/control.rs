//! Process-wide control surface
//!
//! Documentation calls interleave with the requests they describe:
//!
//! ```text
//! record();
//! group("Users");
//! name("List");
//! // fire GET /users through a handler wrapped with middleware()
//! store();
//! ```

use std::sync::{Arc, OnceLock};

use tracing::{error, info};

use crate::config::Config;
use crate::context::Handler;
use crate::recording::Recorder;
use crate::state::ApibState;
use crate::{ApibError, Result};

static STATE: OnceLock<Arc<ApibState>> = OnceLock::new();

/// Configure the process-wide recorder
///
/// Must run before any other function in this module.
///
/// # Errors
///
/// Returns error if the configuration is invalid or the recorder is
/// already in use
pub fn init(config: Config) -> Result<()> {
    config.validate()?;
    STATE
        .set(Arc::new(ApibState::with_config(config)))
        .map_err(|_| ApibError::AlreadyInitialized)
}

/// The process-wide recorder
pub fn state() -> &'static Arc<ApibState> {
    STATE.get_or_init(|| Arc::new(ApibState::new()))
}

/// Start recording
pub fn record() {
    state().record();
}

/// Stop recording without writing anything
pub fn stop() {
    state().stop();
}

/// Check the recording flag
#[must_use]
pub fn is_recording() -> bool {
    state().is_recording()
}

/// Set the group of the next exchange
pub fn group(group: impl Into<String>) {
    state().group(group);
}

/// Set the name of the next exchange
pub fn name(name: impl Into<String>) {
    state().name(name);
}

/// Document an extra parameter on the next exchange
pub fn add_param(
    name: impl Into<String>,
    type_label: impl Into<String>,
    example: impl Into<String>,
    description: impl Into<String>,
    required: bool,
) {
    state().add_param(name, type_label, example, description, required);
}

/// Clear group, name and extra parameters
pub fn flush() {
    state().flush();
}

/// Number of exchanges recorded so far
#[must_use]
pub fn exchange_count() -> usize {
    state().exchange_count()
}

/// Stop recording and write one blueprint file per group
///
/// A file that cannot be created terminates the process.
pub fn store() {
    match state().store() {
        Ok(written) => info!("Stored {} blueprint files", written.len()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Wrap `next` in a middleware recording into the process-wide recorder
#[must_use]
pub fn middleware<H: Handler>(next: H) -> Recorder<H> {
    state().middleware(next)
}
