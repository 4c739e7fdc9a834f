//! Recorder state: registry plus configuration

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::blueprint::write_blueprints;
use crate::config::Config;
use crate::context::Handler;
use crate::recording::{ParamSpec, Recorder, Registry, Snapshot};
use crate::Result;

/// Self-contained recorder
///
/// The free functions at the crate root operate on a process-wide instance.
/// Create a private one for isolated use and get a middleware bound to it
/// with [`ApibState::middleware`].
#[derive(Debug, Default)]
pub struct ApibState {
    registry: Arc<Registry>,
    config: Config,
}

impl ApibState {
    /// Create a recorder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder with the given configuration
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            config,
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Underlying registry
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Start recording
    pub fn record(&self) {
        self.registry.enable();
    }

    /// Stop recording without writing anything
    pub fn stop(&self) {
        self.registry.disable();
    }

    /// Check the recording flag
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.registry.is_recording()
    }

    /// Set the group of the next exchange
    pub fn group(&self, group: impl Into<String>) {
        self.registry.set_group(group);
    }

    /// Set the name of the next exchange
    pub fn name(&self, name: impl Into<String>) {
        self.registry.set_name(name);
    }

    /// Document an extra parameter on the next exchange
    pub fn add_param(
        &self,
        name: impl Into<String>,
        type_label: impl Into<String>,
        example: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) {
        self.registry.add_param(ParamSpec::new(
            name,
            type_label,
            example,
            description,
            required,
        ));
    }

    /// Clear group, name and extra parameters
    pub fn flush(&self) {
        self.registry.flush();
    }

    /// Number of exchanges recorded so far
    #[must_use]
    pub fn exchange_count(&self) -> usize {
        self.registry.len()
    }

    /// Isolated copy of everything recorded
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.registry.snapshot()
    }

    /// Write blueprint files for everything recorded so far
    ///
    /// The registry is left intact, so a later call writes the same
    /// exchanges again plus any new ones.
    ///
    /// # Errors
    ///
    /// Returns error if a blueprint file cannot be created
    pub fn render(&self) -> Result<Vec<PathBuf>> {
        let snapshot = self.registry.snapshot();
        info!(
            "Writing {} groups to {}",
            snapshot.group_count(),
            self.config.output_dir.display()
        );
        write_blueprints(&snapshot, &self.config.output_dir)
    }

    /// Stop recording and write blueprint files
    ///
    /// # Errors
    ///
    /// Returns error if a blueprint file cannot be created
    pub fn store(&self) -> Result<Vec<PathBuf>> {
        self.registry.disable();
        self.render()
    }

    /// Wrap `next` in a middleware recording into this state
    #[must_use]
    pub fn middleware<H: Handler>(&self, next: H) -> Recorder<H> {
        Recorder::new(next, Arc::clone(&self.registry))
    }
}
