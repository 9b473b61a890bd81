//! # Resolved Manifests
//!
//! The resolution engine hands back an ordered stream of YAML documents.
//! This module wraps them as [`Resource`] values, keys each one with a
//! [`ResourceId`], and flattens the set into the output record: an ordered
//! list of ids, an id to manifest-text map, and a content-derived identity.
//!
//! Resources are otherwise opaque; only `apiVersion`, `kind`,
//! `metadata.namespace` and `metadata.name` are ever read. Each resource
//! keeps the exact text the engine emitted for it, and both the published
//! manifests and the identity are computed from that text, never from a
//! re-encoding of the parsed value.

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha512};

use crate::error::{Error, Result};
use crate::fragment::value_kind;
use crate::record::BuildOutput;

/// Separator between documents of a YAML stream
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Canonical key of a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}|{}|{}",
            self.group, self.kind, self.namespace, self.name
        )
    }
}

/// One resolved resource document
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    doc: Mapping,
    text: String,
}

fn str_field<'a>(mapping: &'a Mapping, key: &str) -> &'a str {
    mapping.get(key).and_then(Value::as_str).unwrap_or_default()
}

impl Resource {
    /// Resource built from a parsed mapping; its text is the YAML encoding
    pub fn from_mapping(doc: Mapping) -> Result<Self> {
        let text = serde_yaml::to_string(&doc)?;
        Ok(Self { doc, text })
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.doc
    }

    /// The document text exactly as it was resolved
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn id(&self) -> ResourceId {
        let (group, version) = match str_field(&self.doc, "apiVersion").split_once('/') {
            Some((group, version)) => (group.to_string(), version.to_string()),
            None => (String::new(), str_field(&self.doc, "apiVersion").to_string()),
        };
        let (namespace, name) = match self.doc.get("metadata").and_then(Value::as_mapping) {
            Some(metadata) => (
                str_field(metadata, "namespace").to_string(),
                str_field(metadata, "name").to_string(),
            ),
            None => (String::new(), String::new()),
        };

        ResourceId {
            group,
            version,
            kind: str_field(&self.doc, "kind").to_string(),
            namespace,
            name,
        }
    }
}

/// Split a YAML stream into the raw text of each document
///
/// A line holding only `---` separates documents; text following `--- ` on
/// a separator line belongs to the next document. Every returned chunk ends
/// with a newline.
fn split_documents(stream: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current = String::new();
    for line in stream.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        if bare == "---" || bare.starts_with("--- ") {
            documents.push(std::mem::take(&mut current));
            if let Some(rest) = bare.strip_prefix("--- ") {
                current.push_str(rest.trim_start());
                current.push('\n');
            }
            continue;
        }
        current.push_str(line);
    }
    documents.push(current);

    documents
        .into_iter()
        .map(|mut document| {
            if !document.is_empty() && !document.ends_with('\n') {
                document.push('\n');
            }
            document
        })
        .collect()
}

/// Ordered set of resolved resources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSet {
    resources: Vec<Resource>,
}

impl ResourceSet {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    /// Parse a multi-document YAML stream; empty documents are skipped
    pub fn from_yaml_stream(text: &str) -> Result<Self> {
        let mut resources = Vec::new();
        for (index, document) in split_documents(text).into_iter().enumerate() {
            if document.trim().is_empty() {
                continue;
            }
            let value: Value = serde_yaml::from_str(&document)
                .map_err(|e| Error::parse("resolved manifests", e))?;
            match value {
                Value::Null => continue,
                Value::Mapping(doc) => resources.push(Resource {
                    doc,
                    text: document,
                }),
                other => {
                    return Err(Error::parse(
                        "resolved manifests",
                        format!(
                            "document {} is a {}, expected a mapping",
                            index,
                            value_kind(&other)
                        ),
                    ))
                }
            }
        }
        Ok(Self { resources })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// The whole set as one multi-document YAML stream
    pub fn as_yaml(&self) -> String {
        self.resources
            .iter()
            .map(Resource::text)
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR)
    }

    /// SHA-512 hex digest of [`ResourceSet::as_yaml`]
    pub fn identity(&self) -> String {
        let mut hasher = Sha512::new();
        hasher.update(self.as_yaml().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Flatten into ids, per-id manifest text and the set identity
    pub fn flatten(&self) -> Result<BuildOutput> {
        let mut ids: Vec<String> = Vec::with_capacity(self.resources.len());
        let mut manifests = BTreeMap::new();

        for resource in &self.resources {
            let id = resource.id().to_string();
            if !manifests.contains_key(&id) {
                ids.push(id.clone());
            }
            manifests.insert(id, resource.text().to_string());
        }

        Ok(BuildOutput {
            id: self.identity(),
            ids,
            manifests,
        })
    }
}

impl FromIterator<Resource> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
