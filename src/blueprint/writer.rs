//! Blueprint file writer

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::{file_name, render_group};
use crate::recording::Snapshot;
use crate::{ApibError, Result};

/// Write one blueprint file per group into `dir`
///
/// Existing files are truncated. Each file is closed before the next group
/// is written. A write failure is logged and the group skipped. Two groups
/// mapping to the same file name log a warning and the later group wins.
///
/// # Errors
///
/// Returns [`ApibError::CreateFile`] as soon as a file cannot be created
pub fn write_blueprints(snapshot: &Snapshot, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(snapshot.group_count());
    let mut owners: HashMap<PathBuf, &str> = HashMap::with_capacity(snapshot.group_count());

    for (group, exchanges) in snapshot.iter() {
        let path = dir.join(file_name(group));
        if let Some(previous) = owners.insert(path.clone(), group) {
            warn!(
                "Groups {:?} and {:?} both map to {}, overwriting",
                previous,
                group,
                path.display()
            );
        }
        let mut file = File::create(&path).map_err(|source| ApibError::CreateFile {
            path: path.display().to_string(),
            source,
        })?;

        let contents = render_group(group, exchanges);
        if let Err(e) = file.write_all(contents.as_bytes()).and_then(|()| file.flush()) {
            error!("Failed to write {}: {}", path.display(), e);
            continue;
        }
        drop(file);

        info!(
            "Wrote {} exchanges for group {:?} to {}",
            exchanges.len(),
            group,
            path.display()
        );
        written.push(path);
    }

    Ok(written)
}
