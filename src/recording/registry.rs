//! Recording flag, ambient metadata and recorded exchanges

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::exchange::{Exchange, ParamSpec};

/// Metadata the next recorded exchange will consume
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ambient {
    /// Documentation group
    pub group: String,
    /// Operation name
    pub name: String,
    /// Extra parameters
    pub extra_params: Vec<ParamSpec>,
}

impl Ambient {
    /// Whether both group and name are set
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.group.is_empty() && !self.name.is_empty()
    }

    /// Whether every slot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.group.is_empty() && self.name.is_empty() && self.extra_params.is_empty()
    }
}

#[derive(Debug, Default)]
struct Inner {
    recording: bool,
    ambient: Ambient,
    groups: IndexMap<String, Vec<Arc<Exchange>>>,
}

/// Shared recording state
///
/// Every operation takes the same lock, so appends, ambient updates and
/// snapshots are linearizable with respect to each other.
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    /// Create an empty registry with recording disabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording
    pub fn enable(&self) {
        self.inner.lock().recording = true;
        info!("Recording enabled");
    }

    /// Stop recording
    pub fn disable(&self) {
        self.inner.lock().recording = false;
        info!("Recording disabled");
    }

    /// Check the recording flag
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.inner.lock().recording
    }

    /// Set the ambient group
    pub fn set_group(&self, group: impl Into<String>) {
        self.inner.lock().ambient.group = group.into();
    }

    /// Set the ambient name
    pub fn set_name(&self, name: impl Into<String>) {
        self.inner.lock().ambient.name = name.into();
    }

    /// Append an extra parameter to the ambient slot
    pub fn add_param(&self, param: ParamSpec) {
        self.inner.lock().ambient.extra_params.push(param);
    }

    /// Clear the ambient slots
    pub fn flush(&self) {
        self.inner.lock().ambient = Ambient::default();
    }

    /// Copy of the ambient slots
    #[must_use]
    pub fn ambient(&self) -> Ambient {
        self.inner.lock().ambient.clone()
    }

    /// Read and clear the ambient slots in one step
    pub fn consume_ambient(&self) -> Ambient {
        std::mem::take(&mut self.inner.lock().ambient)
    }

    /// Ambient slots for a new exchange, if it should be recorded
    ///
    /// Returns `None` unless recording is on and both group and name are
    /// set. Nothing is modified.
    #[must_use]
    pub fn begin(&self) -> Option<Ambient> {
        let inner = self.inner.lock();
        if inner.recording && inner.ambient.is_complete() {
            Some(inner.ambient.clone())
        } else {
            None
        }
    }

    /// Append an exchange under its group
    pub fn append(&self, exchange: Exchange) {
        let mut inner = self.inner.lock();
        push(&mut inner, exchange);
    }

    /// Append an exchange and clear the ambient slots in one step
    pub fn commit(&self, exchange: Exchange) {
        let mut inner = self.inner.lock();
        push(&mut inner, exchange);
        inner.ambient = Ambient::default();
    }

    /// Isolated copy of every group and its exchanges
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            groups: self.inner.lock().groups.clone(),
        }
    }

    /// Total number of recorded exchanges
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().groups.values().map(Vec::len).sum()
    }

    /// Check if nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn push(inner: &mut Inner, exchange: Exchange) {
    debug!(
        "Recorded exchange: {} / {} [{} {}]",
        exchange.group, exchange.name, exchange.request.method, exchange.request.effective_uri
    );
    inner
        .groups
        .entry(exchange.group.clone())
        .or_default()
        .push(Arc::new(exchange));
}

/// Point-in-time view of the registry
///
/// Groups are listed in the order they were first recorded; exchanges in
/// the order they were appended.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    groups: IndexMap<String, Vec<Arc<Exchange>>>,
}

impl Snapshot {
    /// Iterate over groups and their exchanges
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Arc<Exchange>])> {
        self.groups
            .iter()
            .map(|(group, exchanges)| (group.as_str(), exchanges.as_slice()))
    }

    /// Exchanges of a single group
    #[must_use]
    pub fn group(&self, group: &str) -> Option<&[Arc<Exchange>]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Number of groups
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Check if there are no groups
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
