//! # Kustomize Overlay Library
//!
//! This library assembles Kubernetes kustomizations from a mix of on-disk
//! bases and caller-supplied inline fragments, then hands the assembled tree
//! to kustomize to resolve into concrete resource manifests. It is used by
//! the `kustomize-overlay` command-line tool but can be embedded in any
//! application that builds kustomizations programmatically.
//!
//! ## Quick Example
//!
//! ```
//! use std::path::Path;
//! use kustomize_overlay::assembler::Assembler;
//! use kustomize_overlay::filesystem::{FileSystem, MemoryFS};
//!
//! // An on-disk tree, simulated in memory
//! let mut base = MemoryFS::new();
//! base.add_file_string("/srv/app/deploy.yaml", "kind: Deployment\n").unwrap();
//!
//! let mut assembler = Assembler::with_base(base, "/srv/app");
//! let doc = assembler
//!     .assemble_template("resources:\n- deploy.yaml\n- kind: ConfigMap\n")
//!     .unwrap();
//!
//! // the reference is kept, the inline mapping became a synthetic file
//! let names: Vec<&str> = doc.get("resources").unwrap()
//!     .as_sequence().unwrap()
//!     .iter()
//!     .filter_map(|v| v.as_str())
//!     .collect();
//! assert_eq!(names, vec!["deploy.yaml", "resources_1"]);
//!
//! let fs = assembler.filesystem();
//! assert!(fs.exists(Path::new("/srv/app/resources_1")));
//! assert!(fs.exists(Path::new("/srv/app/kustomization.yaml")));
//! assert!(fs.base().get_file("/srv/app/resources_1").is_none());
//! ```
//!
//! ## Core Concepts
//!
//! - **Filesystems (`filesystem`)**: a `FileSystem` trait with an in-memory
//!   store, a disk adapter, and the composite `OverlayFS` that layers
//!   synthetic files over a real tree.
//! - **References (`loader`)**: decides whether a string is something
//!   kustomize can load itself.
//! - **Fragments (`fragment`)**: each list entry classified once as a
//!   reference, an inline document, or inline text.
//! - **Assembly (`assembler`, `kustomization`)**: materializes inline
//!   fragments and rewrites the kustomization document.
//! - **Resolution (`resolver`)**: the boundary to kustomize itself.
//! - **Records (`record`, `manifest`)**: the configuration record going in
//!   and the ids, manifests and identity coming out.
//!
//! ## Execution Flow
//!
//! The main entry point is [`orchestrator::execute`]:
//!
//! 1.  **Mode**: Decide from the record whether to build a directory, a
//!     template document, or a base-plus-fragments overlay.
//! 2.  **Assembly**: Materialize inline fragments into a fresh overlay and
//!     persist `kustomization.yaml` next to them.
//! 3.  **Resolution**: Run kustomize on the composite tree.
//! 4.  **Flattening**: Key every resource by id and hash the whole set into
//!     the build identity.

pub mod assembler;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod fragment;
pub mod kustomization;
pub mod loader;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod path;
pub mod record;
pub mod resolver;

#[cfg(test)]
mod path_proptest;
