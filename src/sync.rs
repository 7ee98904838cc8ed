use std::path::PathBuf;

use log::info;

use crate::error::Result;
use crate::manifest::PipelineResource;
use crate::providers::{AzureDevOpsProvider, ResourceOutcome, ResourceStatus};
use crate::state::{DownloadState, StateChange};

/// Where the run keeps its state and how it treats it.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub state_file: PathBuf,
    /// Copy the previous state file to `<state>.bak` before replacing it.
    pub backup: bool,
    /// Ignore recorded builds and download every resource again.
    pub force: bool,
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct SyncSummary {
    pub changes: Vec<StateChange>,
    pub outcomes: Vec<ResourceOutcome>,
    pub state_written: bool,
}

impl SyncSummary {
    /// True when nothing was downloaded and the recorded state stayed the same.
    pub fn is_up_to_date(&self) -> bool {
        self.changes.is_empty()
            && self
                .outcomes
                .iter()
                .all(|outcome| outcome.status == ResourceStatus::UpToDate)
    }
}

/// Runs one sync: load state, process every resource, then persist the new
/// state only if it differs from what was loaded.
///
/// A failure anywhere leaves the state file as it was.
pub async fn run(
    provider: &AzureDevOpsProvider,
    resources: &[PipelineResource],
    options: &SyncOptions,
) -> Result<SyncSummary> {
    let current = DownloadState::load(&options.state_file)?;

    let baseline = if options.force {
        info!("Ignoring recorded state, downloading every resource");
        DownloadState::default()
    } else {
        current.clone()
    };

    let report = provider.download_resources(resources, &baseline).await?;

    let changes = current.diff(&report.state);
    let state_written = if changes.is_empty() {
        info!("No new builds found");
        false
    } else {
        info!("{} resources changed build", changes.len());
        report.state.save(&options.state_file, options.backup)?;
        true
    };

    Ok(SyncSummary {
        changes,
        outcomes: report.outcomes,
        state_written,
    })
}
