use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{AdoError, Result};
use crate::providers::BuildId;

pub const DEFAULT_STATE_FILE: &str = ".ado-ad.state";

/// Last downloaded build per pipeline resource.
///
/// Loaded once at the start of a run and replaced as a whole at the end, and
/// only when it changed. There is no file locking: two runs against the same
/// state file at the same time will race and the outcome is undefined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadState {
    #[serde(default)]
    state: BTreeMap<String, BuildId>,
}

/// A single resource whose recorded build differs between two states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub resource: String,
    pub previous: Option<BuildId>,
    pub current: Option<BuildId>,
}

impl DownloadState {
    pub fn get(&self, resource: &str) -> Option<BuildId> {
        self.state.get(resource).copied()
    }

    pub fn record(&mut self, resource: impl Into<String>, build_id: BuildId) {
        self.state.insert(resource.into(), build_id);
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, BuildId)> {
        self.state.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Lists every resource added, updated or dropped going from `self` to `next`.
    ///
    /// An empty result means both mappings are identical and nothing needs writing.
    pub fn diff(&self, next: &Self) -> Vec<StateChange> {
        let mut changes: Vec<StateChange> = next
            .state
            .iter()
            .filter(|(name, id)| self.state.get(*name) != Some(*id))
            .map(|(name, id)| StateChange {
                resource: name.clone(),
                previous: self.get(name),
                current: Some(*id),
            })
            .collect();

        changes.extend(
            self.state
                .iter()
                .filter(|(name, _)| !next.state.contains_key(*name))
                .map(|(name, id)| StateChange {
                    resource: name.clone(),
                    previous: Some(*id),
                    current: None,
                }),
        );

        changes.sort_by(|a, b| a.resource.cmp(&b.resource));
        changes
    }

    /// Reads the state file. A missing or empty file is an empty state.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting fresh", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(AdoError::file("error reading file", path)(e)),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let state: Self = serde_yaml::from_str(&content)?;
        debug!(
            "Loaded state for {} resources from {}",
            state.len(),
            path.display()
        );
        Ok(state)
    }

    /// Replaces the state file with this mapping in a single rename.
    ///
    /// With `backup` set and a state file already present, the old file is
    /// copied to `<path>.bak` first.
    pub fn save(&self, path: &Path, backup: bool) -> Result<()> {
        let content = serde_yaml::to_string(self)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp =
            NamedTempFile::new_in(dir).map_err(AdoError::file("error creating temp file in", dir))?;
        temp.write_all(content.as_bytes())
            .map_err(AdoError::file("error writing to file", temp.path()))?;

        if backup && path.exists() {
            let backup_path = backup_path(path);
            fs::copy(path, &backup_path)
                .map_err(AdoError::file("error backing up state to", &backup_path))?;
            debug!("Backed up previous state to {}", backup_path.display());
        }

        temp.persist(path)
            .map_err(|e| AdoError::file("error replacing file", path)(e.error))?;

        info!("State written to {}", path.display());
        Ok(())
    }
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}
