#![deny(missing_docs)]

//! # Client Tree Rewriting
//!
//! Post-processes a freshly generated client tree in place:
//!
//! 1. In every `Api` source file, the generator's catch-all model import is
//!    replaced with one import per resolved namespace, and page wrapper aliases
//!    are injected right after the Api namespace opens.
//! 2. Generated `Model` files superseded by handwritten types are deleted,
//!    keeping the shared abstract base.
//!
//! Rewrites are keyed off literal anchor tokens. Every `Api` file is planned
//! before anything is written, so exceeding the missing-anchor tolerance
//! leaves the tree as the generator produced it.

use crate::error::{AppError, AppResult};
use crate::mapping::ImportMapping;
use crate::resolver::MODEL_DIR;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Directory holding operation code that imports models.
pub const API_DIR: &str = "Api";

/// Directory holding client infrastructure, never rewritten.
pub const CLIENT_DIR: &str = "Client";

/// Which generated model files are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelCleanup {
    /// Delete every model except the retained base file.
    #[default]
    All,
    /// Delete only models whose schema has a mapping entry.
    ResolvedOnly,
}

impl FromStr for ModelCleanup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "resolved" => Ok(Self::ResolvedOnly),
            other => Err(format!(
                "unknown model cleanup `{}` (expected `all` or `resolved`)",
                other
            )),
        }
    }
}

/// Anchors, templates and policies for one generator flavour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteConfig {
    /// Line the generator emits to import every model, replaced by the namespace imports.
    pub model_import_anchor: String,
    /// Opening of the Api namespace; aliases are injected right after it.
    pub api_namespace_anchor: String,
    /// Template for one import line. `{namespace}` is substituted.
    pub import_template: String,
    /// Template for one alias line. `{alias}`, `{target}` and `{element}` are substituted.
    pub alias_template: String,
    /// Source file extension, without the dot.
    pub extension: String,
    /// Model file that survives cleanup (e.g. an abstract schema base class).
    pub retained_model_file: Option<String>,
    /// Which model files are deleted.
    pub model_cleanup: ModelCleanup,
    /// How many `Api` files may lack both anchors before the rewrite fails.
    /// `None` never fails.
    pub max_missing_anchors: Option<usize>,
}

impl RewriteConfig {
    /// Anchors produced by the `csharp` generator for `package`.
    pub fn csharp(package: &str) -> Self {
        Self {
            model_import_anchor: format!("using {}.Model;", package),
            api_namespace_anchor: format!("namespace {}.Api\n{{", package),
            import_template: "using {namespace};".to_string(),
            alias_template: "    using {alias} = {target};".to_string(),
            extension: "cs".to_string(),
            retained_model_file: Some("AbstractOpenAPISchema.cs".to_string()),
            model_cleanup: ModelCleanup::All,
            max_missing_anchors: None,
        }
    }
}

/// What a rewrite pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// `Api` files whose content changed.
    pub rewritten: Vec<PathBuf>,
    /// `Api` files containing neither anchor.
    pub missing_anchors: Vec<PathBuf>,
    /// Deleted model files.
    pub removed_models: Vec<PathBuf>,
}

/// Rewrites generated client trees according to a [`RewriteConfig`].
#[derive(Debug, Clone)]
pub struct ClientTreeRewriter {
    config: RewriteConfig,
}

impl ClientTreeRewriter {
    /// Creates a rewriter.
    pub fn new(config: RewriteConfig) -> Self {
        Self { config }
    }

    /// Rewrites the tree rooted at `output_root` (the directory holding `Api` and `Model`).
    ///
    /// Any read, write or delete failure aborts the pass.
    pub fn rewrite(&self, output_root: &Path, mapping: &ImportMapping) -> AppResult<RewriteReport> {
        let imports = self.render_imports(mapping);
        let aliases = self.render_aliases(mapping);
        info!(
            root = %output_root.display(),
            imports = imports.len(),
            aliases = aliases.len(),
            "rewriting generated client"
        );

        let mut report = RewriteReport::default();
        let mut planned = Vec::new();

        for path in self.source_files(&output_root.join(API_DIR))? {
            let content = fs::read_to_string(&path).map_err(|e| {
                AppError::Rewrite(format!("Failed to read file {:?}: {}", path, e))
            })?;

            match self.rewrite_source(&content, &imports, &aliases) {
                Some(new_content) if new_content != content => planned.push((path, new_content)),
                Some(_) => debug!(file = %path.display(), "already up to date"),
                None => {
                    warn!(file = %path.display(), "no rewrite anchor found, leaving untouched");
                    report.missing_anchors.push(path);
                }
            }
        }

        if let Some(max) = self.config.max_missing_anchors {
            if report.missing_anchors.len() > max {
                return Err(AppError::Rewrite(format!(
                    "{} Api files lack rewrite anchors (tolerance {}), first: {:?}",
                    report.missing_anchors.len(),
                    max,
                    report.missing_anchors[0]
                )));
            }
        }

        for (path, new_content) in planned {
            fs::write(&path, new_content).map_err(|e| {
                AppError::Rewrite(format!("Failed to write file {:?}: {}", path, e))
            })?;
            debug!(file = %path.display(), "rewrote api file");
            report.rewritten.push(path);
        }

        report.removed_models = self.prune_models(&output_root.join(MODEL_DIR), mapping)?;

        Ok(report)
    }

    /// Applies the anchor substitutions to one file's content.
    ///
    /// Returns `None` when the content holds neither anchor. CRLF content is
    /// matched and rewritten with CRLF line endings.
    pub fn rewrite_source(
        &self,
        content: &str,
        imports: &[String],
        aliases: &[String],
    ) -> Option<String> {
        let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
        let import_anchor = self.config.model_import_anchor.replace('\n', newline);
        let namespace_anchor = self.config.api_namespace_anchor.replace('\n', newline);

        let has_imports = content.contains(&import_anchor);
        let has_namespace = content.contains(&namespace_anchor);
        if !has_imports && !has_namespace {
            return None;
        }

        let mut out = content.to_string();
        if has_imports {
            out = out.replace(&import_anchor, &imports.join(newline));
        }
        if has_namespace && !aliases.is_empty() {
            let injected = format!("{}{}{}", namespace_anchor, newline, aliases.join(newline));
            out = out.replace(&namespace_anchor, &injected);
        }

        Some(out)
    }

    /// One import line per distinct namespace, sorted.
    pub fn render_imports(&self, mapping: &ImportMapping) -> Vec<String> {
        mapping
            .namespaces()
            .iter()
            .map(|ns| self.config.import_template.replace("{namespace}", ns))
            .collect()
    }

    /// One alias line per page wrapper, in mapping order.
    pub fn render_aliases(&self, mapping: &ImportMapping) -> Vec<String> {
        mapping
            .page_wrappers()
            .iter()
            .map(|wrapper| {
                self.config
                    .alias_template
                    .replace("{alias}", &wrapper.schema)
                    .replace("{target}", &wrapper.target)
                    .replace("{element}", &wrapper.element)
            })
            .collect()
    }

    fn prune_models(&self, model_dir: &Path, mapping: &ImportMapping) -> AppResult<Vec<PathBuf>> {
        let resolved: HashSet<&str> = mapping.iter().map(|(name, _)| name).collect();
        let mut removed = Vec::new();

        for path in self.source_files(model_dir)? {
            let file_name = path.file_name().and_then(|n| n.to_str());
            if file_name.is_some() && file_name == self.config.retained_model_file.as_deref() {
                continue;
            }

            if self.config.model_cleanup == ModelCleanup::ResolvedOnly {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                if !resolved.contains(stem) {
                    debug!(file = %path.display(), "keeping unresolved model");
                    continue;
                }
            }

            fs::remove_file(&path).map_err(|e| {
                AppError::Rewrite(format!("Failed to remove model {:?}: {}", path, e))
            })?;
            removed.push(path);
        }

        info!(removed = removed.len(), "pruned generated models");
        Ok(removed)
    }

    /// Source files under `dir` in sorted traversal order.
    fn source_files(&self, dir: &Path) -> AppResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(AppError::Rewrite(format!(
                "Generated directory not found: {:?}",
                dir
            )));
        }

        let wanted = OsStr::new(&self.config.extension);
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry
                .map_err(|e| AppError::Rewrite(format!("Failed to walk {:?}: {}", dir, e)))?;
            if entry.file_type().is_file() && entry.path().extension() == Some(wanted) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }
}
