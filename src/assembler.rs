//! # Kustomization Assembly
//!
//! The [`Assembler`] turns a caller's kustomization document plus inline
//! fragments into a tree the resolution engine can build. It owns a fresh
//! [`OverlayFS`] per assembly: inline content is written into the overlay
//! under synthetic names, real files stay on the base, and the finished
//! `kustomization.yaml` joins the synthetic files at the assembly root.
//!
//! ## Template documents
//!
//! [`Assembler::assemble`] walks the list fields in a fixed order
//! (`configurations`, `patchesStrategicMerge`, `resources`), then
//! `patchesJson6902`:
//!
//! - an absent field is left alone;
//! - an empty list is removed from the document;
//! - every entry is classified once into a [`Fragment`]; references stay
//!   in place, inline content becomes the overlay file `<field>_<index>`
//!   and its name takes the entry's place. When that name is already taken
//!   on the base, in the overlay, or by a reference in the same list, a
//!   numeric suffix is appended (`<field>_<index>_<n>`) until it is free.
//!
//! For `patchesJson6902` only each entry's `path` is classified; sibling
//! keys such as `target` are kept verbatim.
//!
//! ## Base-plus-fragments
//!
//! [`Assembler::assemble_overlay`] generates a scaffold that points at a
//! base and at the fixed files `resources.yaml`, `patches.yaml` and
//! `configurations.yaml`, each holding every document of its fragments as
//! one multi-document YAML stream.

use std::path::{Path, PathBuf};

use log::debug;
use serde_yaml::{Mapping, Value};

use crate::defaults::{CONFIGURATIONS_FILE, PATCHES_FILE, RESOURCES_FILE};
use crate::error::{Error, Result};
use crate::filesystem::{DiskFS, FileSystem, OverlayFS, WalkScope};
use crate::fragment::{documents, value_kind, Fragment, ReferencePolicy};
use crate::kustomization::{fields, Kustomization, KustomizationBuilder, KUSTOMIZATION_FILE};
use crate::loader::{is_remote, ReferenceLoader};
use crate::manifest::DOCUMENT_SEPARATOR;
use crate::path::clean;
use crate::record::OverlayInputs;

/// Assembles one kustomization tree
#[derive(Debug)]
pub struct Assembler<B: FileSystem = DiskFS> {
    fs: OverlayFS<B>,
    root: PathBuf,
    policy: ReferencePolicy,
}

impl Assembler<DiskFS> {
    /// Assembly rooted at `root` on the real disk
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_base(DiskFS::new(), root)
    }
}

impl<B: FileSystem> Assembler<B> {
    /// Assembly rooted at `root` on top of `base`
    pub fn with_base(base: B, root: impl AsRef<Path>) -> Self {
        Self {
            fs: OverlayFS::with_base(base),
            root: clean(root),
            policy: ReferencePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReferencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_walk_scope(mut self, scope: WalkScope) -> Self {
        self.fs = self.fs.with_walk_scope(scope);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filesystem(&self) -> &OverlayFS<B> {
        &self.fs
    }

    pub fn into_filesystem(self) -> OverlayFS<B> {
        self.fs
    }

    fn is_taken(&self, name: &str, references: &[&str]) -> bool {
        let path = clean(self.root.join(name));
        self.fs.exists(&path)
            || references
                .iter()
                .any(|reference| clean(self.root.join(reference)) == path)
    }

    /// `<prefix>_<index>`, suffixed until it names nothing that exists
    fn synthetic_name(&self, prefix: &str, index: usize, references: &[&str]) -> String {
        let stem = format!("{}_{}", prefix, index);
        let mut name = stem.clone();
        let mut suffix = 0;
        while self.is_taken(&name, references) {
            suffix += 1;
            name = format!("{}_{}", stem, suffix);
        }
        if suffix > 0 {
            debug!("{} is already taken, writing {} instead", stem, name);
        }
        name
    }

    /// Classify `entries` and materialize the inline ones as
    /// `<prefix>_<index>`
    ///
    /// Returns one name per entry, in order: the reference for a reference,
    /// the synthetic name otherwise. Synthetic files never shadow existing
    /// ones.
    pub fn add_overlay_files(&mut self, prefix: &str, entries: &[Value]) -> Result<Vec<String>> {
        let fragments = {
            let loader = ReferenceLoader::new(self.fs.base(), &self.root);
            entries
                .iter()
                .map(|entry| Fragment::classify(prefix, entry, &loader, self.policy))
                .collect::<Result<Vec<_>>>()?
        };
        let references: Vec<String> = fragments
            .iter()
            .filter_map(|fragment| match fragment {
                Fragment::Reference(reference) => Some(reference.clone()),
                _ => None,
            })
            .collect();
        let references: Vec<&str> = references.iter().map(String::as_str).collect();

        let mut names = Vec::with_capacity(fragments.len());
        for (index, fragment) in fragments.iter().enumerate() {
            let name = match fragment {
                Fragment::Reference(reference) => {
                    debug!("{}[{}]: keeping reference {}", prefix, index, reference);
                    reference.clone()
                }
                inline => {
                    let name = self.synthetic_name(prefix, index, &references);
                    let content = inline.content()?.unwrap_or_default();
                    self.fs.write_overlay(self.root.join(&name), &content)?;
                    name
                }
            };
            names.push(name);
        }
        Ok(names)
    }

    fn add_file_list(&mut self, doc: &mut Kustomization, field: &str) -> Result<()> {
        let entries = match doc.get(field) {
            None => return Ok(()),
            Some(Value::Sequence(entries)) => entries.clone(),
            Some(other) => {
                return Err(Error::parse(
                    field,
                    format!("expected a list, found {}", value_kind(other)),
                ))
            }
        };
        if entries.is_empty() {
            doc.remove(field);
            return Ok(());
        }

        let names = self.add_overlay_files(field, &entries)?;
        doc.set(
            field,
            Value::Sequence(names.into_iter().map(Value::String).collect()),
        );
        Ok(())
    }

    fn add_json6902_patches(&mut self, doc: &mut Kustomization) -> Result<()> {
        let field = fields::PATCHES_JSON6902;
        let patches = match doc.get(field) {
            None => return Ok(()),
            Some(Value::Sequence(patches)) => patches.clone(),
            Some(other) => {
                return Err(Error::parse(
                    field,
                    format!("expected a list, found {}", value_kind(other)),
                ))
            }
        };
        if patches.is_empty() {
            doc.remove(field);
            return Ok(());
        }

        let mut specs: Vec<Mapping> = Vec::with_capacity(patches.len());
        let mut paths = Vec::with_capacity(patches.len());
        for patch in patches {
            let path = patch.as_mapping().and_then(|spec| spec.get("path")).cloned();
            match (patch, path) {
                (Value::Mapping(spec), Some(path)) => {
                    specs.push(spec);
                    paths.push(path);
                }
                (patch, _) => {
                    return Err(Error::MalformedPatch {
                        field: field.to_string(),
                        entry: serde_yaml::to_string(&patch)?.trim_end().to_string(),
                    })
                }
            }
        }

        let names = self.add_overlay_files(field, &paths)?;
        for (spec, name) in specs.iter_mut().zip(names) {
            spec.insert(Value::String("path".to_string()), Value::String(name));
        }
        doc.set(
            field,
            Value::Sequence(specs.into_iter().map(Value::Mapping).collect()),
        );
        Ok(())
    }

    /// Materialize every inline fragment of `doc` and rewrite its fields
    pub fn assemble(&mut self, doc: &mut Kustomization) -> Result<()> {
        for field in fields::FILE_LIST_FIELDS {
            self.add_file_list(doc, field)?;
        }
        self.add_json6902_patches(doc)
    }

    /// Write `doc` as `kustomization.yaml` at the assembly root
    pub fn persist(&mut self, doc: &Kustomization) -> Result<PathBuf> {
        let path = self.root.join(KUSTOMIZATION_FILE);
        let yaml = doc.to_yaml()?;
        self.fs.write_overlay(&path, yaml.as_bytes())?;
        Ok(path)
    }

    /// Parse, assemble and persist a raw kustomization document
    pub fn assemble_template(&mut self, raw: &str) -> Result<Kustomization> {
        let mut doc = Kustomization::parse(raw)?;
        self.assemble(&mut doc)?;
        self.persist(&doc)?;
        Ok(doc)
    }

    fn write_fragment_file(
        &mut self,
        field: &str,
        name: &str,
        fragments: &[String],
    ) -> Result<bool> {
        let documents = validate_fragments(field, fragments)?;
        if documents.is_empty() {
            return Ok(false);
        }
        let path = self.root.join(name);
        if self.fs.exists(&path) {
            return Err(Error::filesystem(
                "write fragments",
                path,
                "a file with this name already exists",
            ));
        }
        self.fs
            .write_overlay(path, documents.join(DOCUMENT_SEPARATOR).as_bytes())?;
        Ok(true)
    }

    /// Generate the base-plus-fragments scaffold, merge the caller's raw
    /// document after it, and persist the result
    pub fn assemble_overlay(&mut self, inputs: &OverlayInputs) -> Result<Kustomization> {
        let resources =
            self.write_fragment_file(fields::RESOURCES, RESOURCES_FILE, &inputs.resources)?;
        let patches = self.write_fragment_file(
            fields::PATCHES_STRATEGIC_MERGE,
            PATCHES_FILE,
            &inputs.patches,
        )?;
        let configurations = self.write_fragment_file(
            fields::CONFIGURATIONS,
            CONFIGURATIONS_FILE,
            &inputs.configurations,
        )?;

        let bases = match inputs.bases_path.as_deref() {
            Some(bases_path) => vec![base_reference(bases_path)?],
            None => Vec::new(),
        };
        let mut doc = KustomizationBuilder::new()
            .bases(bases)
            .resources(resources.then_some(RESOURCES_FILE))
            .patches_strategic_merge(patches.then_some(PATCHES_FILE))
            .configurations(configurations.then_some(CONFIGURATIONS_FILE))
            .build();

        if let Some(raw) = inputs.kustomization.as_deref() {
            doc.merge(Kustomization::parse(raw)?);
        }
        self.persist(&doc)?;
        Ok(doc)
    }
}

/// Make a local base path absolute so it survives staging; remote
/// references pass through
pub fn base_reference(bases_path: &str) -> Result<String> {
    let bases_path = bases_path.trim();
    if is_remote(bases_path) || Path::new(bases_path).is_absolute() {
        return Ok(bases_path.to_string());
    }
    let absolute = clean(std::path::absolute(bases_path)?);
    Ok(absolute.display().to_string())
}

/// Re-serialize every document of every fragment; each must be a YAML
/// mapping and empty documents are dropped
fn validate_fragments(field: &str, fragments: &[String]) -> Result<Vec<String>> {
    let mut serialized = Vec::new();
    for (index, fragment) in fragments.iter().enumerate() {
        let context = format!("{}[{}]", field, index);
        for document in documents(fragment).map_err(|e| Error::parse(&context, e))? {
            match document {
                Value::Mapping(mapping) => serialized.push(serde_yaml::to_string(&mapping)?),
                other => {
                    return Err(Error::parse(
                        context,
                        format!("expected a mapping, found {}", value_kind(&other)),
                    ))
                }
            }
        }
    }
    Ok(serialized)
}
