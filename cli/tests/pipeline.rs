//! End-to-end runs of the generate pipeline against a fake generator.

use clientgen_cli::error::CliResult;
use clientgen_cli::generate::{execute, GenerateArgs};
use clientgen_cli::generator::{CommandExecutor, Target};
use clientgen_cli::resolve::ResolutionArgs;
use clientgen_core::{AppError, ModelCleanup, PagePolicy};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

const API_SOURCE: &str = "using System;
using Acme.WebClient.Client;
using Acme.WebClient.Model;

namespace Acme.WebClient.Api
{
    public interface IPluginsApi
    {
        PluginPage ListPlugins(int page);
        Bar GetBar();
    }
}
";

/// Writes what `openapi-generator-cli` would produce, without running it.
struct FakeGenerator {
    calls: RefCell<Vec<Vec<String>>>,
    exit_code: i32,
}

impl FakeGenerator {
    fn new(exit_code: i32) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            exit_code,
        }
    }
}

fn flag<'a>(args: &'a [&str], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| *a == name)
        .and_then(|i| args.get(i + 1))
        .copied()
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

impl CommandExecutor for FakeGenerator {
    fn execute(&self, _program: &str, args: &[&str]) -> CliResult<Output> {
        self.calls
            .borrow_mut()
            .push(args.iter().map(|a| a.to_string()).collect());

        if self.exit_code == 0 {
            let output = PathBuf::from(flag(args, "--output").unwrap());
            match flag(args, "--generator-name").unwrap() {
                "csharp" => {
                    let base = output.join("src").join(flag(args, "--package-name").unwrap());
                    write(&base.join("Api/PluginsApi.cs"), API_SOURCE);
                    write(&base.join("Client/ApiClient.cs"), "class ApiClient {}");
                    for model in ["Plugin", "PluginPage", "Bar", "AbstractOpenAPISchema"] {
                        write(&base.join(format!("Model/{}.cs", model)), "class Generated {}");
                    }
                    write(&output.join("README.md"), "generated");
                }
                _ => write(&output.join("apis/PluginsApi.ts"), "export class PluginsApi {}"),
            }
        }

        Ok(Output {
            status: ExitStatus::from_raw(self.exit_code << 8),
            stdout: Vec::new(),
            stderr: b"generator exploded".to_vec(),
        })
    }
}

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            &root.join("Acme.Core/Source/Acme.Core/Model/Plugins/Plugin.cs"),
            "public class Plugin {}",
        );
        write(
            &root.join("openapi-spec.json"),
            r#"{
                "openapi": "3.0.1",
                "components": {
                    "schemas": {
                        "PluginPage": {"type": "object"},
                        "Plugin": {"type": "object"},
                        "Bar": {"type": "object"}
                    }
                }
            }"#,
        );
        write(
            &root.join("Acme.Api/Source/Acme.WebClient/Model/Stale.cs"),
            "left over from a previous run",
        );
        Self { dir }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn args(&self) -> GenerateArgs {
        GenerateArgs {
            spec: self.path("openapi-spec.json"),
            target: Target::Csharp,
            destination: self.path("Acme.Api/Source/Acme.WebClient"),
            scratch_dir: self.path("generated/dotnet"),
            package_name: Some("Acme.WebClient".into()),
            resolution: ResolutionArgs {
                search_roots: vec![self.path("Acme.Core/Source/Acme.Core")],
                page_policy: PagePolicy::Parameterized,
                pagination_namespace: Some("Acme.Core.Pagination".into()),
                pagination_type: "Page".into(),
            },
            model_cleanup: ModelCleanup::All,
            retained_model: "AbstractOpenAPISchema.cs".into(),
            max_missing_anchors: Some(0),
            import_template: None,
            alias_template: None,
            generator: "openapi-generator-cli".into(),
            config: None,
            template_dir: None,
            additional_properties: vec![],
            import_mappings: vec![],
            type_mappings: vec![],
        }
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_csharp_pipeline_end_to_end() {
    let project = Project::new();
    let generator = FakeGenerator::new(0);

    execute(&project.args(), &generator).unwrap();

    let dest = project.path("Acme.Api/Source/Acme.WebClient");
    let api = fs::read_to_string(dest.join("Api/PluginsApi.cs")).unwrap();
    let expected = "using System;
using Acme.WebClient.Client;
using Acme.Core.Model.Plugins;
using Acme.Core.Pagination;

namespace Acme.WebClient.Api
{
    using PluginPage = Page<Acme.Core.Model.Plugins.Plugin>;
    public interface IPluginsApi
    {
        PluginPage ListPlugins(int page);
        Bar GetBar();
    }
}
";
    assert_eq!(api, expected);

    assert_eq!(file_names(&dest), vec!["Api", "Client", "Model"]);
    assert_eq!(file_names(&dest.join("Model")), vec!["AbstractOpenAPISchema.cs"]);
    assert!(dest.join("Client/ApiClient.cs").exists());
    assert!(!project.path("generated/dotnet").exists());

    let calls = generator.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains(&"library=httpclient".to_string()));
}

#[test]
fn test_rerun_produces_same_tree() {
    let project = Project::new();
    let dest = project.path("Acme.Api/Source/Acme.WebClient");

    execute(&project.args(), &FakeGenerator::new(0)).unwrap();
    let first = fs::read_to_string(dest.join("Api/PluginsApi.cs")).unwrap();

    execute(&project.args(), &FakeGenerator::new(0)).unwrap();
    let second = fs::read_to_string(dest.join("Api/PluginsApi.cs")).unwrap();

    assert_eq!(first, second);
    assert_eq!(file_names(&dest.join("Model")), vec!["AbstractOpenAPISchema.cs"]);
}

#[test]
fn test_resolved_only_cleanup_keeps_generated_bar() {
    let project = Project::new();
    let mut args = project.args();
    args.model_cleanup = ModelCleanup::ResolvedOnly;

    execute(&args, &FakeGenerator::new(0)).unwrap();

    let models = project.path("Acme.Api/Source/Acme.WebClient/Model");
    assert_eq!(
        file_names(&models),
        vec!["AbstractOpenAPISchema.cs", "Bar.cs"]
    );
}

#[test]
fn test_generator_failure_aborts_before_rewrite() {
    let project = Project::new();

    let err = execute(&project.args(), &FakeGenerator::new(1)).unwrap_err();
    match err {
        AppError::Generator(msg) => assert!(msg.contains("generator exploded")),
        other => panic!("expected generator error, got {:?}", other),
    }

    // the previous client is still in place
    assert!(project
        .path("Acme.Api/Source/Acme.WebClient/Model/Stale.cs")
        .exists());
}

#[test]
fn test_csharp_requires_package_name() {
    let project = Project::new();
    let mut args = project.args();
    args.package_name = None;

    let generator = FakeGenerator::new(0);
    assert!(execute(&args, &generator).is_err());
    assert!(generator.calls.borrow().is_empty());
}

#[test]
fn test_typescript_generates_into_cleared_destination() {
    let project = Project::new();
    write(&project.path("web/src/api/stale.ts"), "old");

    let mut args = project.args();
    args.target = Target::Typescript;
    args.destination = project.path("web/src/api");

    execute(&args, &FakeGenerator::new(0)).unwrap();

    assert!(!project.path("web/src/api/stale.ts").exists());
    assert!(project.path("web/src/api/apis/PluginsApi.ts").exists());
}
