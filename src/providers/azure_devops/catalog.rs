use indexmap::IndexMap;
use log::{debug, info};

use crate::error::{AdoError, Result};

use super::types::BuildDefinitionRef;

/// Folder separator used by build definition paths.
pub const SEPARATOR: char = '\\';

/// The `(path, name)` pair a resource source is looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionKey {
    pub path: String,
    pub name: String,
}

impl DefinitionKey {
    /// Splits a manifest `source` into folder path and definition name.
    ///
    /// The name is the trailing run of ASCII letters, dots and hyphens. The
    /// folder is whatever precedes it (minus one separator), with `/` turned
    /// into `\` and rooted at `\`. `Group\Sub-Project.Api` gives
    /// `(\Group, Sub-Project.Api)`.
    pub fn from_source(source: &str) -> Self {
        let name_start = source
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_alphabetic() || *c == '.' || *c == '-')
            .last()
            .map_or(source.len(), |(index, _)| index);
        let name = &source[name_start..];

        let folder = if name.is_empty() {
            source
        } else if name_start == 0 {
            ""
        } else {
            source[..name_start]
                .strip_suffix(['\\', '/'])
                .unwrap_or(source)
        };

        let folder = folder.trim_start_matches(['\\', '/']).replace('/', "\\");

        Self {
            path: format!("{SEPARATOR}{folder}"),
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.ends_with(SEPARATOR) {
            write!(f, "{}{}", self.path, self.name)
        } else {
            write!(f, "{}{SEPARATOR}{}", self.path, self.name)
        }
    }
}

/// Build definitions of the project keyed by `(path, name)`.
///
/// Fetched once per run and shared by every resource. When the service lists
/// the same pair twice the first entry wins.
#[derive(Debug, Default)]
pub struct DefinitionCatalog {
    entries: IndexMap<DefinitionKey, BuildDefinitionRef>,
}

impl DefinitionCatalog {
    pub fn new(definitions: impl IntoIterator<Item = BuildDefinitionRef>) -> Self {
        let mut entries = IndexMap::new();
        for definition in definitions {
            let key = DefinitionKey {
                path: definition.path.clone(),
                name: definition.name.clone(),
            };
            entries.entry(key).or_insert(definition);
        }
        debug!("Indexed {} build definitions", entries.len());
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the definition a manifest `source` refers to.
    pub fn resolve(&self, source: &str) -> Result<&BuildDefinitionRef> {
        let key = DefinitionKey::from_source(source);

        match self.entries.get(&key) {
            Some(definition) => {
                info!(
                    "Found definition for pipeline {}, {}, {}",
                    definition.name, definition.id, definition.path
                );
                Ok(definition)
            }
            None => Err(AdoError::DefinitionNotFound {
                hints: self
                    .entries
                    .keys()
                    .filter(|candidate| candidate.name == key.name)
                    .map(ToString::to_string)
                    .collect(),
                path: key.path,
                name: key.name,
            }),
        }
    }
}
