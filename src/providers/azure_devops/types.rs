use serde::Deserialize;

pub type BuildId = u64;
pub type DefinitionId = u64;

/// Envelope the REST API wraps every list in.
#[derive(Debug, Deserialize)]
pub(super) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// A build definition (pipeline) in the project catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildDefinitionRef {
    pub id: DefinitionId,
    /// Short name, e.g. `Sub-Project.Api`
    pub name: String,
    /// Folder, always rooted at `\`, e.g. `\Group`
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildStatus {
    Completed,
    InProgress,
    Cancelling,
    Postponed,
    NotStarted,
    #[serde(other)]
    Unknown,
}

/// A single run of a build definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: BuildId,
    #[serde(default)]
    pub build_number: String,
    /// Only completion matters for selection; `result` is not read, so failed
    /// and partially succeeded builds are eligible too.
    pub status: BuildStatus,
    /// Full ref the build ran on (e.g. "refs/heads/main")
    #[serde(default)]
    pub source_branch: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ArtifactRecord {
    pub name: String,
    pub resource: ArtifactResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ArtifactResource {
    pub download_url: String,
}

/// An artifact published by a build, fetched as a zip archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub download_url: String,
}

impl From<ArtifactRecord> for Artifact {
    fn from(record: ArtifactRecord) -> Self {
        Self {
            name: record.name,
            download_url: record.resource.download_url,
        }
    }
}
