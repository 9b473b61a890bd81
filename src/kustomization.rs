//! # Kustomization Documents
//!
//! [`Kustomization`] is a thin, order-preserving wrapper around a YAML
//! mapping. It is parsed once from the caller's raw text, edited field by
//! field by the assembler, and serialized once into `kustomization.yaml`.
//! Keys the assembler does not recognise pass through untouched and keep
//! their position.
//!
//! [`KustomizationBuilder`] emits the scaffolding used by the
//! base-plus-fragments mode (`bases`, `resources`, `patchesStrategicMerge`,
//! `configurations` pointing at fixed file names) as a mapping rather than
//! as concatenated text.

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::fragment::value_kind;

/// File name the resolution engine looks for at the root
pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

/// Recognized kustomization field names
pub mod fields {
    pub const BASES: &str = "bases";
    pub const RESOURCES: &str = "resources";
    pub const CONFIGURATIONS: &str = "configurations";
    pub const PATCHES_STRATEGIC_MERGE: &str = "patchesStrategicMerge";
    pub const PATCHES_JSON6902: &str = "patchesJson6902";

    /// List fields whose entries are file references or inline content, in
    /// processing order
    pub const FILE_LIST_FIELDS: [&str; 3] = [CONFIGURATIONS, PATCHES_STRATEGIC_MERGE, RESOURCES];
}

/// An ordered kustomization document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kustomization {
    doc: Mapping,
}

impl Kustomization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw YAML; empty input yields an empty document
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value =
            serde_yaml::from_str(text).map_err(|e| Error::parse("kustomization", e))?;
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(doc) => Ok(Self { doc }),
            other => Err(Error::parse(
                "kustomization",
                format!("expected a mapping, found {}", value_kind(&other)),
            )),
        }
    }

    pub fn from_mapping(doc: Mapping) -> Self {
        Self { doc }
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.doc
    }

    pub fn into_mapping(self) -> Mapping {
        self.doc
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.doc.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.doc.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.doc.contains_key(key)
    }

    /// Set a field, keeping its position if it already exists
    pub fn set(&mut self, key: &str, value: Value) {
        self.doc.insert(Value::String(key.to_string()), value);
    }

    /// Remove a field, preserving the order of the remaining ones
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.doc.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.doc.keys().filter_map(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// Merge `other` after this document
    ///
    /// Sequences present in both are concatenated (this document's entries
    /// first); any other value from `other` replaces the existing one. New
    /// keys are appended in `other`'s order.
    pub fn merge(&mut self, other: Kustomization) {
        for (key, value) in other.doc {
            let value = match (self.doc.get_mut(&key), value) {
                (Some(Value::Sequence(existing)), Value::Sequence(extra)) => {
                    existing.extend(extra);
                    continue;
                }
                (_, value) => value,
            };
            self.doc.insert(key, value);
        }
    }

    /// Serialize to YAML text
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.doc)?)
    }
}

/// Builds scaffolding documents field by field
#[derive(Debug, Default)]
pub struct KustomizationBuilder {
    doc: Kustomization,
}

impl KustomizationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a list field; empty lists are left out
    pub fn list<I, S>(mut self, key: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<Value> = entries
            .into_iter()
            .map(|entry| Value::String(entry.into()))
            .collect();
        if !entries.is_empty() {
            self.doc.set(key, Value::Sequence(entries));
        }
        self
    }

    pub fn bases<I, S>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.list(fields::BASES, entries)
    }

    pub fn resources<I, S>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.list(fields::RESOURCES, entries)
    }

    pub fn patches_strategic_merge<I, S>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.list(fields::PATCHES_STRATEGIC_MERGE, entries)
    }

    pub fn configurations<I, S>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.list(fields::CONFIGURATIONS, entries)
    }

    /// Set an arbitrary field
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.doc.set(key, value);
        self
    }

    pub fn build(self) -> Kustomization {
        self.doc
    }
}
