use crate::error::{AdoError, Result};
use crate::manifest::PipelineResource;

use super::types::{Build, BuildStatus};

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Which build of a definition a resource asks for.
///
/// A pinned version beats a branch; with neither, the newest completed build
/// on any branch is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildConstraint {
    /// Exact build number
    Version(String),
    /// Canonical ref, always `refs/heads/...`
    Branch(String),
    Latest,
}

impl BuildConstraint {
    pub fn for_resource(resource: &PipelineResource) -> Self {
        match (&resource.version, &resource.branch) {
            (Some(version), _) => Self::Version(version.clone()),
            (None, Some(branch)) => Self::Branch(canonical_branch(branch)),
            (None, None) => Self::Latest,
        }
    }

    fn matches(&self, build: &Build) -> bool {
        match self {
            Self::Version(version) => build.build_number == *version,
            Self::Branch(branch) => build.source_branch == *branch,
            Self::Latest => true,
        }
    }

    fn not_found(&self, resource: &str, definition: &str) -> AdoError {
        match self {
            Self::Version(version) => AdoError::NoBuildForVersion {
                resource: resource.to_string(),
                version: version.clone(),
            },
            Self::Branch(branch) => AdoError::NoBuildForBranch {
                resource: resource.to_string(),
                branch: branch.clone(),
            },
            Self::Latest => AdoError::NoSuccessfulBuild {
                resource: resource.to_string(),
                definition: definition.to_string(),
            },
        }
    }
}

impl std::fmt::Display for BuildConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Version(version) => write!(f, "version {version}"),
            Self::Branch(branch) => write!(f, "branch {branch}"),
            Self::Latest => f.write_str("latest build on all branches"),
        }
    }
}

/// Prefixes `refs/heads/` unless the branch already carries it.
pub fn canonical_branch(branch: &str) -> String {
    format!(
        "{BRANCH_REF_PREFIX}{}",
        branch.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(branch)
    )
}

/// Picks the first completed build satisfying `constraint`.
///
/// `builds` must be in service order, newest first. The filters the service
/// already applied are checked again here: the `buildNumber` query accepts
/// wildcards, so an exact match is only guaranteed locally.
pub fn pick_build<'a>(
    builds: &'a [Build],
    constraint: &BuildConstraint,
    resource: &str,
    definition: &str,
) -> Result<&'a Build> {
    builds
        .iter()
        .filter(|build| build.status == BuildStatus::Completed)
        .find(|build| constraint.matches(build))
        .ok_or_else(|| constraint.not_found(resource, definition))
}
