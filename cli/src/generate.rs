#![deny(missing_docs)]

//! # Generate Command
//!
//! Implements the pipeline: Spec -> Mapping -> Generator -> Rewrite -> Relocate.
//!
//! 1. **Spec -> Mapping**: schemas are resolved against the handwritten search roots.
//! 2. **Generator**: the external generator writes a raw client into a scratch directory.
//! 3. **Rewrite**: `Api` files import the resolved namespaces, page wrappers become aliases,
//!    superseded models are pruned.
//! 4. **Relocate**: `Api`/`Client`/`Model` replace the previous client in the project.
//!
//! The TypeScript target skips steps 1 and 3 and generates straight into the destination.

use crate::generator::{run_generator, CommandExecutor, GeneratorInvocation, Target};
use crate::resolve::ResolutionArgs;
use clientgen_core::{
    relocate, remove_scratch, AppError, AppResult, ClientTreeRewriter, ModelCleanup,
    RewriteConfig, SpecDocument,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Arguments for the generate command.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Path to the OpenAPI document (JSON, or YAML by extension).
    #[clap(long, env = "CLIENTGEN_SPEC", default_value = "openapi-spec.json")]
    pub spec: PathBuf,

    /// Client language to generate.
    #[clap(long, value_enum, default_value = "csharp")]
    pub target: Target,

    /// Directory that receives the final client (`Api`, `Client`, `Model` for C#).
    #[clap(long, env = "CLIENTGEN_DESTINATION")]
    pub destination: PathBuf,

    /// Scratch directory the generator writes into. Removed after relocation.
    #[clap(long, env = "CLIENTGEN_SCRATCH", default_value = "generated/dotnet")]
    pub scratch_dir: PathBuf,

    /// Package name of the generated client (required for C#), e.g. `MyProject.WebClient`.
    #[clap(long, env = "CLIENTGEN_PACKAGE")]
    pub package_name: Option<String>,

    /// Schema resolution options.
    #[clap(flatten)]
    pub resolution: ResolutionArgs,

    /// Which generated models are deleted: `all` or `resolved`.
    #[clap(long, default_value = "all")]
    pub model_cleanup: ModelCleanup,

    /// Generated model file kept during cleanup.
    #[clap(long, default_value = "AbstractOpenAPISchema.cs")]
    pub retained_model: String,

    /// Fail when more than this many `Api` files lack rewrite anchors.
    #[clap(long)]
    pub max_missing_anchors: Option<usize>,

    /// Template for one import line (`{namespace}`).
    #[clap(long)]
    pub import_template: Option<String>,

    /// Template for one alias line (`{alias}`, `{target}`, `{element}`).
    #[clap(long)]
    pub alias_template: Option<String>,

    /// Generator program.
    #[clap(long, env = "CLIENTGEN_GENERATOR", default_value = "openapi-generator-cli")]
    pub generator: String,

    /// Generator configuration file (e.g. `openapitools.json`).
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Custom generator template directory.
    #[clap(long)]
    pub template_dir: Option<PathBuf>,

    /// Extra generator property. Format: `"key=value"`.
    #[clap(long = "property", value_parser = parse_key_val)]
    pub additional_properties: Vec<(String, String)>,

    /// Generator import mapping override. Format: `"Schema=Namespace.Type"`.
    #[clap(long = "import-mapping", value_parser = parse_key_val)]
    pub import_mappings: Vec<(String, String)>,

    /// Generator type mapping override. Format: `"Type=OtherType"`.
    #[clap(long = "type-mapping", value_parser = parse_key_val)]
    pub type_mappings: Vec<(String, String)>,
}

/// Helper to parse "key=value" arguments.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Executes the generation pipeline.
///
/// # Arguments
///
/// * `args` - Command arguments.
/// * `executor` - Runs the external generator (use `ShellExecutor` for real execution).
pub fn execute<E: CommandExecutor>(args: &GenerateArgs, executor: &E) -> AppResult<()> {
    match args.target {
        Target::Csharp => generate_csharp(args, executor),
        Target::Typescript => generate_typescript(args, executor),
    }
}

fn generate_csharp<E: CommandExecutor>(args: &GenerateArgs, executor: &E) -> AppResult<()> {
    let package = args.package_name.as_deref().ok_or_else(|| {
        AppError::General("--package-name is required for the csharp target".into())
    })?;

    // 1. Spec -> Mapping
    let spec = SpecDocument::load(&args.spec)?;
    let mapping = args
        .resolution
        .build_mapping(&spec, Target::Csharp.extension())?;

    // 2. Generator
    remove_scratch(&args.scratch_dir)?;
    let mut invocation = build_invocation(args, Target::Csharp, args.scratch_dir.clone());
    invocation.package_name = Some(package.to_string());
    if !invocation
        .additional_properties
        .iter()
        .any(|(key, _)| key == "library")
    {
        invocation
            .additional_properties
            .insert(0, ("library".into(), "httpclient".into()));
    }
    generate(&invocation, executor)?;

    let generated_root = args.scratch_dir.join("src").join(package);
    if !generated_root.is_dir() {
        return Err(AppError::Generator(format!(
            "expected generated client at {:?}",
            generated_root
        )));
    }

    // 3. Rewrite
    let rewriter = ClientTreeRewriter::new(rewrite_config(args, package));
    let report = rewriter.rewrite(&generated_root, &mapping)?;
    info!(
        rewritten = report.rewritten.len(),
        untouched = report.missing_anchors.len(),
        removed_models = report.removed_models.len(),
        "rewrite finished"
    );

    // 4. Relocate
    relocate(&generated_root, &args.destination)?;
    remove_scratch(&args.scratch_dir)?;

    println!("Generated C# client at {:?}", args.destination);
    Ok(())
}

fn generate_typescript<E: CommandExecutor>(args: &GenerateArgs, executor: &E) -> AppResult<()> {
    clear_destination(&args.destination)?;

    let invocation = build_invocation(args, Target::Typescript, args.destination.clone());
    generate(&invocation, executor)?;

    println!("Generated TypeScript client at {:?}", args.destination);
    Ok(())
}

fn build_invocation(
    args: &GenerateArgs,
    target: Target,
    output_dir: PathBuf,
) -> GeneratorInvocation {
    let mut invocation = GeneratorInvocation::new(
        args.generator.clone(),
        target.generator_name(),
        args.spec.clone(),
        output_dir,
    );
    invocation.config_file = args.config.clone();
    invocation.template_dir = args.template_dir.clone();
    invocation.additional_properties = args.additional_properties.clone();
    invocation.import_mappings = args.import_mappings.clone();
    invocation.type_mappings = args.type_mappings.clone();
    invocation
}

fn generate<E: CommandExecutor>(invocation: &GeneratorInvocation, executor: &E) -> AppResult<()> {
    info!(
        generator = %invocation.generator,
        output = %invocation.output_dir.display(),
        "running external generator"
    );
    run_generator(invocation, executor).map_err(|e| AppError::Generator(e.to_string()))
}

fn rewrite_config(args: &GenerateArgs, package: &str) -> RewriteConfig {
    let mut config = RewriteConfig::csharp(package);
    config.model_cleanup = args.model_cleanup;
    config.retained_model_file = Some(args.retained_model.clone());
    config.max_missing_anchors = args.max_missing_anchors;
    if let Some(template) = &args.import_template {
        config.import_template = template.clone();
    }
    if let Some(template) = &args.alias_template {
        config.alias_template = template.clone();
    }
    config
}

fn clear_destination(destination: &Path) -> AppResult<()> {
    if destination.exists() {
        fs::remove_dir_all(destination).map_err(|e| {
            AppError::Relocation(format!("Failed to clear {:?}: {}", destination, e))
        })?;
    }
    Ok(())
}
