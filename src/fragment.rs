//! # Fragments
//!
//! A fragment is one entry of a kustomization list field (`resources`,
//! `patchesStrategicMerge`, `configurations`, or the `path` of a
//! `patchesJson6902` entry). Each entry is classified exactly once into a
//! [`Fragment`] so the assembler works over a closed set of variants:
//!
//! - [`Fragment::Reference`]: a loadable locator, in the form it is
//!   written back (see [`ReferenceLoader::locator`]).
//! - [`Fragment::InlineDocument`]: a YAML mapping to materialize.
//! - [`Fragment::InlineText`]: a raw YAML text block to materialize.
//!
//! ## Classification policy
//!
//! A string entry is first tried as a reference. When that fails, the
//! [`ReferencePolicy`] decides what happens:
//!
//! - `Strict` (default): the string is inline only if it parses as YAML
//!   whose first non-empty document is a mapping or a sequence. A string
//!   that parses as a bare scalar (it looks like a path or URL) is reported
//!   as [`Error::UnresolvableReference`], and text that is not valid YAML
//!   is a [`Error::Parse`].
//! - `Lenient`: anything that fails to load is inline text.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::kustomization::fields::PATCHES_JSON6902;
use crate::loader::ReferenceLoader;

/// How strings that fail to load as references are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferencePolicy {
    #[default]
    Strict,
    Lenient,
}

/// A classified kustomization list entry
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Reference(String),
    InlineDocument(Mapping),
    InlineText(String),
}

impl Fragment {
    /// Classify a value taken from the kustomization document
    pub fn classify(
        field: &str,
        value: &Value,
        loader: &ReferenceLoader<'_>,
        policy: ReferencePolicy,
    ) -> Result<Self> {
        match value {
            Value::String(text) => Self::from_text(field, text, loader, policy),
            Value::Mapping(mapping) => Ok(Fragment::InlineDocument(mapping.clone())),
            // a JSON-6902 patch body is a list of operations
            Value::Sequence(_) if field == PATCHES_JSON6902 => {
                Ok(Fragment::InlineText(serde_yaml::to_string(value)?))
            }
            other => Err(Error::parse(
                field,
                format!("unsupported fragment type: {}", value_kind(other)),
            )),
        }
    }

    /// Classify a raw string
    pub fn from_text(
        field: &str,
        text: &str,
        loader: &ReferenceLoader<'_>,
        policy: ReferencePolicy,
    ) -> Result<Self> {
        if let Ok(reference) = loader.load(text) {
            return Ok(Fragment::Reference(loader.locator(&reference, text)));
        }
        if policy == ReferencePolicy::Lenient {
            return Ok(Fragment::InlineText(text.to_string()));
        }

        match first_document(text).map_err(|e| Error::parse(field, e))? {
            Some(Value::Mapping(_)) | Some(Value::Sequence(_)) => {
                Ok(Fragment::InlineText(text.to_string()))
            }
            _ => Err(Error::UnresolvableReference {
                field: field.to_string(),
                reference: text.to_string(),
            }),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Fragment::Reference(_))
    }

    /// Bytes to materialize, or `None` for a reference
    pub fn content(&self) -> Result<Option<Vec<u8>>> {
        match self {
            Fragment::Reference(_) => Ok(None),
            Fragment::InlineDocument(mapping) => {
                Ok(Some(serde_yaml::to_string(mapping)?.into_bytes()))
            }
            Fragment::InlineText(text) => Ok(Some(text.as_bytes().to_vec())),
        }
    }
}

/// Parse every document of a YAML stream, dropping the empty ones
pub(crate) fn documents(text: &str) -> std::result::Result<Vec<Value>, serde_yaml::Error> {
    let mut values = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            values.push(value);
        }
    }
    Ok(values)
}

/// First non-empty document of a YAML stream; the rest must still parse
pub(crate) fn first_document(text: &str) -> std::result::Result<Option<Value>, serde_yaml::Error> {
    Ok(documents(text)?.into_iter().next())
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
