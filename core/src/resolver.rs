#![deny(missing_docs)]

//! # Schema Name Resolution
//!
//! Finds handwritten model types that already exist on disk so the generated
//! client can import them instead of synthesizing duplicates.
//!
//! Each search root is expected to hold its models under a `Model`
//! subdirectory. The namespace of a match is the path of the file's directory
//! relative to the root's parent, with separators replaced by `.`:
//!
//! ```text
//! Source/                          <- parent of the search root
//!   MyProject.Core/                <- search root
//!     Model/Plugins/PluginVersion.cs
//! ```
//!
//! resolves `PluginVersion` to `MyProject.Core.Model.Plugins.PluginVersion`.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use walkdir::WalkDir;

/// Name of the directory holding models, both in search roots and in generated trees.
pub const MODEL_DIR: &str = "Model";

/// How much of a located type is rendered into a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// Only the containing namespace, e.g. `Core.Model`.
    Namespace,
    /// Namespace and type name, e.g. `Core.Model.Plugin`.
    #[default]
    Qualified,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "namespace" => Ok(Self::Namespace),
            "qualified" => Ok(Self::Qualified),
            other => Err(format!(
                "unknown granularity `{}` (expected `namespace` or `qualified`)",
                other
            )),
        }
    }
}

/// A handwritten type found under a search root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Located {
    /// Dotted namespace derived from the file's directory.
    pub namespace: String,
    /// The type name (file stem).
    pub name: String,
}

impl Located {
    /// Renders the reference at the requested granularity.
    pub fn reference(&self, granularity: Granularity) -> String {
        match granularity {
            Granularity::Namespace => self.namespace.clone(),
            Granularity::Qualified if self.namespace.is_empty() => self.name.clone(),
            Granularity::Qualified => format!("{}.{}", self.namespace, self.name),
        }
    }
}

impl fmt::Display for Located {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference(Granularity::Qualified))
    }
}

/// Resolves type names against an ordered list of search roots.
///
/// The roots are indexed once at construction. Directory entries are visited
/// sorted by file name, so when several files share a stem the first one in
/// lexicographic order within the earliest root wins.
#[derive(Debug, Clone)]
pub struct SchemaNameResolver {
    index: HashMap<String, Vec<Located>>,
}

impl SchemaNameResolver {
    /// Indexes `search_roots` for files with the given source extension (`cs`, `.ts`, ...).
    ///
    /// Roots that do not exist or have no `Model` directory are skipped.
    pub fn new(search_roots: Vec<PathBuf>, extension: &str) -> Self {
        let extension = extension.trim_start_matches('.');
        let mut index: HashMap<String, Vec<Located>> = HashMap::new();

        for root in &search_roots {
            for (stem, located) in scan_root(root, extension) {
                index.entry(stem).or_default().push(located);
            }
        }

        Self { index }
    }

    /// Finds the handwritten type named `type_name`, if any.
    ///
    /// A miss is the expected outcome for types the generator synthesizes itself.
    pub fn locate(&self, type_name: &str) -> Option<Located> {
        let candidates = self.index.get(type_name)?;

        if candidates.len() > 1 {
            debug!(
                type_name,
                chosen = %candidates[0],
                candidates = candidates.len(),
                "ambiguous model name, first match wins"
            );
        }

        candidates.first().cloned()
    }

    /// Like [`Self::locate`], rendered at the given granularity.
    pub fn locate_reference(&self, type_name: &str, granularity: Granularity) -> Option<String> {
        self.locate(type_name).map(|l| l.reference(granularity))
    }
}

/// Walks `<root>/Model` and returns every matching source file in traversal order.
fn scan_root(root: &Path, extension: &str) -> Vec<(String, Located)> {
    let root = match fs::canonicalize(root) {
        Ok(root) => root,
        Err(e) => {
            debug!(root = %root.display(), error = %e, "skipping unreadable search root");
            return Vec::new();
        }
    };

    let model_dir = root.join(MODEL_DIR);
    if !model_dir.is_dir() {
        debug!(root = %root.display(), "search root has no Model directory");
        return Vec::new();
    }

    let base = root.parent().unwrap_or(root.as_path()).to_path_buf();
    let wanted = OsStr::new(extension);
    let mut found = Vec::new();

    let walker = WalkDir::new(&model_dir).sort_by_file_name().into_iter();
    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension() != Some(wanted) {
            continue;
        }

        let (Some(stem), Some(dir)) = (path.file_stem().and_then(|s| s.to_str()), path.parent())
        else {
            continue;
        };

        if let Some(namespace) = namespace_of(dir, &base) {
            found.push((
                stem.to_string(),
                Located {
                    namespace,
                    name: stem.to_string(),
                },
            ));
        }
    }

    debug!(root = %root.display(), models = found.len(), "indexed search root");
    found
}

/// Dotted form of `dir` relative to `base`. `None` if a component is not valid UTF-8.
fn namespace_of(dir: &Path, base: &Path) -> Option<String> {
    let relative = dir.strip_prefix(base).ok()?;
    let parts = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_str()),
            _ => None,
        })
        .collect::<Option<Vec<&str>>>()?;
    Some(parts.join("."))
}
