use std::collections::HashSet;
use std::path::{Component, Path};

use log::warn;
use serde::{Deserialize, Deserializer};

use crate::error::{AdoError, Result};

/// The slice of an `azure-pipelines.yaml` this tool cares about.
///
/// Everything outside `resources.pipelines` (triggers, stages, other resource
/// kinds) is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct AzurePipeline {
    #[serde(default)]
    pub resources: Resources,
}

#[derive(Debug, Default, Deserialize)]
pub struct Resources {
    #[serde(default)]
    pub pipelines: Vec<PipelineResource>,
}

/// One upstream pipeline this repository depends on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineResource {
    /// Resource alias, unique within the manifest. Also the output directory name.
    #[serde(rename = "pipeline")]
    pub name: String,
    /// Folder path and definition name, e.g. `Group\Sub-Project.Api`.
    pub source: String,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub branch: Option<String>,
    /// Exact build number to pin to.
    #[serde(default, deserialize_with = "build_label")]
    pub version: Option<String>,
}

impl AzurePipeline {
    /// Reads and validates the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AdoError::Manifest {
            path: path.to_path_buf(),
            message: format!("failed to read file: {e}"),
        })?;

        let pipeline = Self::parse(&content).map_err(|message| AdoError::Manifest {
            path: path.to_path_buf(),
            message,
        })?;

        Ok(pipeline)
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let pipeline: Self =
            serde_yaml::from_str(content).map_err(|e| format!("failed to unmarshal: {e}"))?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    pub fn pipelines(&self) -> &[PipelineResource] {
        &self.resources.pipelines
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = HashSet::new();

        for resource in &self.resources.pipelines {
            if !is_single_component(&resource.name) {
                return Err(format!(
                    "pipeline name {:?} must be a plain directory name",
                    resource.name
                ));
            }
            if !seen.insert(resource.name.as_str()) {
                return Err(format!("pipeline {} is declared twice", resource.name));
            }
            if resource.source.trim().is_empty() {
                return Err(format!("pipeline {} has no source", resource.name));
            }
            if resource.branch.is_some() && resource.version.is_some() {
                warn!(
                    "Pipeline {} sets both branch and version; version takes precedence",
                    resource.name
                );
            }
        }

        Ok(())
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

fn non_empty_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Label {
    Text(String),
    Integer(u64),
    Float(f64),
}

fn build_label<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Label>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Label::Text(text)) => Ok(Some(text).filter(|s| !s.trim().is_empty())),
        Some(Label::Integer(number)) => Ok(Some(number.to_string())),
        Some(Label::Float(number)) => Err(serde::de::Error::custom(format!(
            "version {number} must be quoted, otherwise YAML reads it as a float"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = r#"
trigger: none
resources:
  repositories:
    - repository: templates
      type: git
      name: Shared/templates
  pipelines:
    - pipeline: api
      source: Group\Sub-Project.Api
      branch: main
    - pipeline: web
      source: Group\Web
      version: "20240101.3"
    - pipeline: tools
      source: Tools
      branch: ""
      version: ""
stages:
  - stage: Build
"#;

    #[test]
    fn parses_pipeline_resources() {
        let pipeline = AzurePipeline::parse(MANIFEST).unwrap();
        let resources = pipeline.pipelines();

        assert_eq!(resources.len(), 3);
        assert_eq!(resources[0].name, "api");
        assert_eq!(resources[0].source, "Group\\Sub-Project.Api");
        assert_eq!(resources[0].branch.as_deref(), Some("main"));
        assert_eq!(resources[0].version, None);
        assert_eq!(resources[1].version.as_deref(), Some("20240101.3"));
    }

    #[test]
    fn empty_branch_and_version_count_as_absent() {
        let pipeline = AzurePipeline::parse(MANIFEST).unwrap();
        let tools = &pipeline.pipelines()[2];

        assert_eq!(tools.branch, None);
        assert_eq!(tools.version, None);
    }

    #[test]
    fn accepts_integer_versions() {
        let pipeline = AzurePipeline::parse(
            "resources:\n  pipelines:\n    - pipeline: a\n      source: A\n      version: 1234\n",
        )
        .unwrap();
        assert_eq!(pipeline.pipelines()[0].version.as_deref(), Some("1234"));
    }

    #[test]
    fn rejects_float_versions() {
        let err = AzurePipeline::parse(
            "resources:\n  pipelines:\n    - pipeline: a\n      source: A\n      version: 20240101.10\n",
        )
        .unwrap_err();
        assert!(err.contains("must be quoted"), "unexpected error: {err}");
    }

    #[test]
    fn missing_resources_section_is_empty() {
        let pipeline = AzurePipeline::parse("trigger: none\n").unwrap();
        assert!(pipeline.pipelines().is_empty());
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = AzurePipeline::parse(
            "resources:\n  pipelines:\n    - pipeline: a\n      source: A\n    - pipeline: a\n      source: B\n",
        )
        .unwrap_err();
        assert!(err.contains("declared twice"));
    }

    #[test]
    fn rejects_names_that_escape_the_output_directory() {
        for name in ["..", ".", "a/b", "a\\b", "/abs", ""] {
            let yaml = format!(
                "resources:\n  pipelines:\n    - pipeline: '{name}'\n      source: A\n"
            );
            assert!(
                AzurePipeline::parse(&yaml).is_err(),
                "name {name:?} should be rejected"
            );
        }
    }

    #[test]
    fn load_reports_the_file_on_failure() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "resources: [not, a, map]").unwrap();

        let err = AzurePipeline::load(file.path()).unwrap_err();
        assert!(matches!(err, AdoError::Manifest { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn load_missing_file_is_a_manifest_error() {
        let err = AzurePipeline::load(Path::new("does-not-exist.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read file"));
    }
}
