//! # Configuration Records
//!
//! [`ConfigRecord`] is the input side of a build: which directory to build,
//! or which kustomization document and inline fragments to assemble. It can
//! be read from a YAML (or JSON) file or filled in from command-line flags.
//!
//! [`BuildOutput`] is the output side: the resource ids, the manifest text
//! of every resource keyed by id, and the content-derived identity of the
//! whole resolved set.
//!
//! ## Build modes
//!
//! A record selects exactly one [`BuildMode`]:
//!
//! - **Path**: only `path` is set. The directory is built as is.
//! - **Template**: `kustomization` is set without `bases_path` or fragment
//!   lists. The document is assembled with inline fragments materialized,
//!   rooted at `path`, or at an empty scratch directory when `path` is not
//!   set.
//! - **Overlay**: `bases_path` or any of `resources`, `patches`,
//!   `configurations` is set. A scaffold document is generated around the
//!   fragments in a scratch root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Input record of a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigRecord {
    /// Directory holding a `kustomization.yaml`
    pub path: Option<String>,
    /// Base referenced by the generated overlay scaffold
    pub bases_path: Option<String>,
    /// Raw kustomization YAML
    pub kustomization: Option<String>,
    /// Strategic-merge patches, one YAML document each
    pub patches: Vec<String>,
    /// Extra resources, one YAML document each
    pub resources: Vec<String>,
    /// Transformer configurations, one YAML document each
    pub configurations: Vec<String>,
}

/// Inputs of the base-plus-fragments mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayInputs {
    pub bases_path: Option<String>,
    pub kustomization: Option<String>,
    pub resources: Vec<String>,
    pub patches: Vec<String>,
    pub configurations: Vec<String>,
}

/// What a record asks to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    Path { path: PathBuf },
    Template {
        root: Option<PathBuf>,
        kustomization: String,
    },
    Overlay(OverlayInputs),
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ConfigRecord {
    /// Parse a record from YAML text; JSON is accepted as well
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| Error::Config {
            message: format!("invalid configuration record: {}", e),
            hint: Some(
                "known keys are path, bases_path, kustomization, patches, resources, configurations"
                    .to_string(),
            ),
        })
    }

    /// Read and parse a record file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::filesystem("read record", path, e))?;
        Self::parse(&text)
    }

    fn has_overlay_inputs(&self) -> bool {
        non_empty(&self.bases_path).is_some()
            || !self.patches.is_empty()
            || !self.resources.is_empty()
            || !self.configurations.is_empty()
    }

    /// Decide which build the record describes
    pub fn mode(&self) -> Result<BuildMode> {
        let path = non_empty(&self.path);
        let kustomization = non_empty(&self.kustomization);

        if self.has_overlay_inputs() {
            if path.is_some() {
                return Err(Error::Config {
                    message: "'path' cannot be combined with 'bases_path' or fragment lists"
                        .to_string(),
                    hint: Some("reference the directory through 'bases_path' instead".to_string()),
                });
            }
            return Ok(BuildMode::Overlay(OverlayInputs {
                bases_path: non_empty(&self.bases_path),
                kustomization,
                resources: self.resources.clone(),
                patches: self.patches.clone(),
                configurations: self.configurations.clone(),
            }));
        }

        if let Some(kustomization) = kustomization {
            let root = path.map(std::path::absolute).transpose()?;
            return Ok(BuildMode::Template {
                root,
                kustomization,
            });
        }

        match path {
            Some(path) => Ok(BuildMode::Path {
                path: PathBuf::from(path),
            }),
            None => Err(Error::Config {
                message: "the record does not describe anything to build".to_string(),
                hint: Some("set 'path', 'kustomization' or 'bases_path'".to_string()),
            }),
        }
    }
}

/// Output record of a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutput {
    /// Content-derived identity of the resolved set
    pub id: String,
    /// Resource ids in resolution order
    pub ids: Vec<String>,
    /// Manifest YAML keyed by resource id
    pub manifests: BTreeMap<String, String>,
}

impl BuildOutput {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
