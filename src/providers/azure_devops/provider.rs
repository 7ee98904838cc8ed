use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::archive;
use crate::auth::AdoContext;
use crate::error::{AdoError, Result};
use crate::manifest::PipelineResource;
use crate::output::ResourceProgress;
use crate::state::DownloadState;

use super::catalog::DefinitionCatalog;
use super::client::AzureDevOpsClient;
use super::links::build_results_url;
use super::selection::{pick_build, BuildConstraint};
use super::types::{Artifact, Build, BuildDefinitionRef, BuildId};

/// Outcome of choosing a build for one resource.
#[derive(Debug)]
pub enum Selection {
    /// The chosen build is the one already on disk.
    Skipped(BuildId),
    /// A different build was chosen; its artifacts still need fetching.
    Download { build: Build, artifacts: Vec<Artifact> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    UpToDate,
    Downloaded { artifacts: usize },
}

/// What happened to one resource during a run.
#[derive(Debug, Clone)]
pub struct ResourceOutcome {
    pub resource: String,
    pub definition: String,
    pub build_id: BuildId,
    pub previous: Option<BuildId>,
    pub status: ResourceStatus,
    pub link: String,
}

/// Result of processing every resource: the new state plus per-resource outcomes.
#[derive(Debug)]
pub struct SyncReport {
    pub state: DownloadState,
    pub outcomes: Vec<ResourceOutcome>,
}

/// Resolves, selects and downloads upstream pipeline artifacts from Azure DevOps.
pub struct AzureDevOpsProvider {
    pub client: AzureDevOpsClient,
    pub output_dir: PathBuf,
}

impl AzureDevOpsProvider {
    /// Creates a provider writing resource directories below `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the organization URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(context: &AdoContext, api_version: &str, output_dir: PathBuf) -> Result<Self> {
        let client = AzureDevOpsClient::new(context, api_version)?;
        Ok(Self { client, output_dir })
    }

    /// Fetches the definition catalog. Done once per run.
    pub async fn load_catalog(&self) -> Result<DefinitionCatalog> {
        let catalog = DefinitionCatalog::new(self.client.fetch_definitions().await?);
        if catalog.is_empty() {
            warn!("Project has no build definitions");
        } else {
            info!("Found {} build definitions", catalog.len());
        }
        Ok(catalog)
    }

    /// Chooses the build `resource` should supply.
    ///
    /// When the winner equals `previous` no artifact listing is requested.
    pub async fn select(
        &self,
        definition: &BuildDefinitionRef,
        resource: &PipelineResource,
        previous: Option<BuildId>,
    ) -> Result<Selection> {
        let constraint = BuildConstraint::for_resource(resource);
        let builds = self.client.fetch_builds(definition.id, &constraint).await?;
        let build = pick_build(&builds, &constraint, &resource.name, &definition.name)?;

        match previous {
            Some(previous) if previous == build.id => {
                info!(
                    "Build {} already downloaded for pipeline {}",
                    build.id, resource.name
                );
                return Ok(Selection::Skipped(build.id));
            }
            Some(previous) => info!(
                "Previously downloaded build {previous} for pipeline {} is outdated, so downloading build {}",
                resource.name, build.id
            ),
            None => info!(
                "Found build {} for definition {} with {constraint}",
                build.id, definition.id
            ),
        }

        let artifacts = self.client.fetch_artifacts(build.id).await?;
        Ok(Selection::Download {
            build: build.clone(),
            artifacts,
        })
    }

    /// Downloads `artifacts` into the resource directory, extracts them and
    /// removes the archives. Returns the resource directory.
    pub async fn fetch_and_extract(
        &self,
        resource_name: &str,
        artifacts: &[Artifact],
    ) -> Result<PathBuf> {
        let resource_dir = self.output_dir.join(resource_name);
        fs::create_dir_all(&resource_dir)
            .map_err(AdoError::file("error creating folder", &resource_dir))?;

        info!("Found {} artifacts", artifacts.len());
        if artifacts.is_empty() {
            warn!("Build for pipeline {resource_name} published no artifacts");
        }

        for artifact in artifacts {
            let destination = archive_path(&resource_dir, &artifact.name)?;
            self.client.download_artifact(artifact, &destination).await?;
            info!("Downloaded artifact {}", artifact.name);
        }

        archive::extract_archives(&resource_dir)?;
        archive::remove_archives(&resource_dir)?;

        Ok(resource_dir)
    }

    /// Processes every resource in manifest order against `current` state.
    ///
    /// Builds a fresh state from scratch; resources skipped as up to date keep
    /// their previous build id. Any error aborts the whole run.
    pub async fn download_resources(
        &self,
        resources: &[PipelineResource],
        current: &DownloadState,
    ) -> Result<SyncReport> {
        let mut state = DownloadState::default();
        let mut outcomes = Vec::with_capacity(resources.len());

        if resources.is_empty() {
            warn!("Manifest declares no pipeline resources");
            return Ok(SyncReport { state, outcomes });
        }

        let catalog = self.load_catalog().await?;

        for resource in resources {
            info!("Processing: {}, {}", resource.name, resource.source);
            let progress = ResourceProgress::start(&resource.name);

            let definition = catalog.resolve(&resource.source)?;
            let previous = current.get(&resource.name);

            progress.selecting();
            let (build_id, status) = match self.select(definition, resource, previous).await? {
                Selection::Skipped(build_id) => {
                    info!(
                        "Skipping artifact download and unzipping for pipeline {}",
                        resource.name
                    );
                    progress.finish_up_to_date(build_id);
                    (build_id, ResourceStatus::UpToDate)
                }
                Selection::Download { build, artifacts } => {
                    progress.downloading(build.id, artifacts.len());
                    self.fetch_and_extract(&resource.name, &artifacts).await?;
                    progress.finish_downloaded(build.id);
                    (
                        build.id,
                        ResourceStatus::Downloaded {
                            artifacts: artifacts.len(),
                        },
                    )
                }
            };

            state.record(resource.name.clone(), build_id);
            outcomes.push(ResourceOutcome {
                resource: resource.name.clone(),
                definition: definition.name.clone(),
                build_id,
                previous,
                status,
                link: build_results_url(self.client.project_url(), build_id),
            });
        }

        Ok(SyncReport { state, outcomes })
    }
}

/// Where an artifact's zip lands; artifact names may not leave the resource directory.
fn archive_path(resource_dir: &Path, artifact_name: &str) -> Result<PathBuf> {
    let file_name = format!("{artifact_name}.zip");
    archive::enclosed_path(resource_dir, &file_name).ok_or_else(|| AdoError::UnsafeArchiveEntry {
        archive: resource_dir.to_path_buf(),
        entry: file_name,
    })
}
