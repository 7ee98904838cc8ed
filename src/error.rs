use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdoError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("definition not found for pipeline {path}\\{name}{}", format_hints(.hints))]
    DefinitionNotFound {
        path: String,
        name: String,
        hints: Vec<String>,
    },

    #[error("no build found for given version {version} (resource {resource})")]
    NoBuildForVersion { resource: String, version: String },

    #[error("no build found for branch {branch} (resource {resource})")]
    NoBuildForBranch { resource: String, branch: String },

    #[error("no successful build found for definition {definition} (resource {resource})")]
    NoSuccessfulBuild { resource: String, definition: String },

    #[error("Authentication rejected by {url} (status {status}), check the access token")]
    Unauthorized { url: String, status: u16 },

    #[error("API request to {url} failed with status {status}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid file path {entry:?} in archive {archive}")]
    UnsafeArchiveEntry { archive: PathBuf, entry: String },

    #[error("failed to read archive {archive}: {source}")]
    Zip {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{action} {path}: {source}")]
    File {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AdoError {
    /// Wraps an I/O error with the file it happened on.
    pub fn file(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::File {
            action,
            path,
            source,
        }
    }
}

fn format_hints(hints: &[String]) -> String {
    if hints.is_empty() {
        String::new()
    } else {
        format!(" (same name exists at: {})", hints.join(", "))
    }
}

pub type Result<T> = std::result::Result<T, AdoError>;
