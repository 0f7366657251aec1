#![deny(missing_docs)]

//! # Resolve Command
//!
//! Builds the import mapping for a specification and prints it as JSON,
//! without running the generator. Useful to check which schemas will be
//! served by handwritten models before regenerating a client.

use clientgen_core::{
    AppError, AppResult, Granularity, ImportMapping, ImportMappingBuilder, PagePolicy, Pagination,
    SchemaNameResolver, SpecDocument,
};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Options controlling schema resolution, shared by `resolve` and `generate`.
#[derive(clap::Args, Debug, Clone)]
pub struct ResolutionArgs {
    /// Handwritten source tree searched for existing models (repeatable, first match wins).
    /// Each tree is expected to contain a `Model` directory.
    #[clap(long = "search-root", env = "CLIENTGEN_SEARCH_ROOTS", value_delimiter = ',')]
    pub search_roots: Vec<PathBuf>,

    /// How `*Page` schemas are mapped: `parameterized` or `shared`.
    #[clap(long, env = "CLIENTGEN_PAGE_POLICY", default_value = "parameterized")]
    pub page_policy: PagePolicy,

    /// Namespace of the shared pagination type. Required by the `shared` policy.
    #[clap(long, env = "CLIENTGEN_PAGINATION_NAMESPACE")]
    pub pagination_namespace: Option<String>,

    /// Name of the shared generic pagination type.
    #[clap(long, default_value = "Pagination")]
    pub pagination_type: String,
}

impl ResolutionArgs {
    /// Indexes the search roots and builds the mapping for `spec`.
    pub fn build_mapping(&self, spec: &SpecDocument, extension: &str) -> AppResult<ImportMapping> {
        let resolver = SchemaNameResolver::new(self.search_roots.clone(), extension);
        let pagination = Pagination {
            namespace: self.pagination_namespace.clone(),
            type_name: self.pagination_type.clone(),
        };
        let builder = ImportMappingBuilder::new(&resolver, self.page_policy, pagination)?;

        let mapping = builder.build(spec, ImportMapping::new());
        if self.leaves_pagination_unimported(&mapping) {
            warn!(
                pagination_type = %self.pagination_type,
                "page schemas found but no pagination namespace is configured, the pagination type is not imported"
            );
        }
        info!(
            schemas = spec.schemas().len(),
            resolved = mapping.len(),
            "built import mapping"
        );
        Ok(mapping)
    }

    /// Whether parameterized page aliases reference a pagination type nothing imports.
    fn leaves_pagination_unimported(&self, mapping: &ImportMapping) -> bool {
        self.page_policy == PagePolicy::Parameterized
            && self.pagination_namespace.is_none()
            && !mapping.page_wrappers().is_empty()
    }
}

/// Arguments for the resolve command.
#[derive(clap::Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Path to the OpenAPI document (JSON, or YAML by extension).
    #[clap(long, env = "CLIENTGEN_SPEC", default_value = "openapi-spec.json")]
    pub spec: PathBuf,

    /// Source extension of handwritten models.
    #[clap(long, default_value = "cs")]
    pub extension: String,

    /// Render located types as `namespace` only or `qualified` (namespace and type).
    #[clap(long, default_value = "qualified")]
    pub granularity: Granularity,

    /// Write the mapping to this file instead of stdout.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Schema resolution options.
    #[clap(flatten)]
    pub resolution: ResolutionArgs,
}

/// Executes the resolve command.
pub fn execute(args: &ResolveArgs) -> AppResult<()> {
    let spec = SpecDocument::load(&args.spec)?;
    let mapping = args.resolution.build_mapping(&spec, &args.extension)?;
    let rendered = render(&mapping, args.granularity)?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, rendered).map_err(|e| {
                AppError::General(format!("Failed to write mapping {:?}: {}", path, e))
            })?;
            println!("Import mapping written to {:?}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Pretty JSON object of schema name -> reference, in mapping order.
pub fn render(mapping: &ImportMapping, granularity: Granularity) -> AppResult<String> {
    serde_json::to_string_pretty(&mapping.rendered(granularity))
        .map_err(|e| AppError::General(format!("JSON serialization failed: {}", e)))
}
