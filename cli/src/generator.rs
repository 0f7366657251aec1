#![deny(missing_docs)]

//! # Generator
//!
//! Handles the invocation of the external OpenAPI code generator
//! (`openapi-generator-cli` by default), which produces the raw client tree.

use crate::error::{CliError, CliResult};
use std::path::PathBuf;
use std::process::{Command, Output};

/// Interface for executing the generation command.
///
/// Abstracted to allow mocking command execution in tests without requiring the generator to be installed.
pub trait CommandExecutor {
    /// Executes the command and returns the output.
    fn execute(&self, program: &str, args: &[&str]) -> CliResult<Output>;
}

/// Standard executor using `std::process::Command`.
pub struct ShellExecutor;

impl CommandExecutor for ShellExecutor {
    fn execute(&self, program: &str, args: &[&str]) -> CliResult<Output> {
        let output = Command::new(program).args(args).output()?;
        Ok(output)
    }
}

/// Target client language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Target {
    /// C# client, rewritten to import handwritten models.
    Csharp,
    /// TypeScript fetch client, generated in place.
    Typescript,
}

impl Target {
    /// The generator's name for this target.
    pub fn generator_name(self) -> &'static str {
        match self {
            Target::Csharp => "csharp",
            Target::Typescript => "typescript-fetch",
        }
    }

    /// Source file extension of generated and handwritten files.
    pub fn extension(self) -> &'static str {
        match self {
            Target::Csharp => "cs",
            Target::Typescript => "ts",
        }
    }
}

/// One run of the external generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorInvocation {
    /// Program to run.
    pub program: String,
    /// Generator name, e.g. `csharp`.
    pub generator: String,
    /// OpenAPI document passed as `--input-spec`.
    pub spec_path: PathBuf,
    /// Directory the generator writes into.
    pub output_dir: PathBuf,
    /// Package name of the generated client.
    pub package_name: Option<String>,
    /// Generator configuration file (e.g. `openapitools.json`).
    pub config_file: Option<PathBuf>,
    /// Custom template directory.
    pub template_dir: Option<PathBuf>,
    /// `--additional-properties` pairs.
    pub additional_properties: Vec<(String, String)>,
    /// `--import-mappings` pairs.
    pub import_mappings: Vec<(String, String)>,
    /// `--type-mappings` pairs.
    pub type_mappings: Vec<(String, String)>,
}

impl GeneratorInvocation {
    /// A minimal invocation with no optional flags.
    pub fn new(
        program: impl Into<String>,
        generator: impl Into<String>,
        spec_path: PathBuf,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            program: program.into(),
            generator: generator.into(),
            spec_path,
            output_dir,
            package_name: None,
            config_file: None,
            template_dir: None,
            additional_properties: Vec::new(),
            import_mappings: Vec::new(),
            type_mappings: Vec::new(),
        }
    }

    /// Command line arguments, in the order the generator documents them.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "generate".to_string(),
            "--generator-name".to_string(),
            self.generator.clone(),
        ];

        if let Some(config) = &self.config_file {
            args.push("--config".into());
            args.push(config.to_string_lossy().into_owned());
        }
        push_pairs(&mut args, "--additional-properties", &self.additional_properties);

        args.push("--input-spec".into());
        args.push(self.spec_path.to_string_lossy().into_owned());
        args.push("--output".into());
        args.push(self.output_dir.to_string_lossy().into_owned());

        if let Some(templates) = &self.template_dir {
            args.push("--template-dir".into());
            args.push(templates.to_string_lossy().into_owned());
        }
        if let Some(package) = &self.package_name {
            args.push("--package-name".into());
            args.push(package.clone());
        }
        push_pairs(&mut args, "--import-mappings", &self.import_mappings);
        push_pairs(&mut args, "--type-mappings", &self.type_mappings);

        args
    }
}

fn push_pairs(args: &mut Vec<String>, flag: &str, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        return;
    }
    let joined = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",");
    args.push(flag.to_string());
    args.push(joined);
}

/// Runs the generator and checks that it produced its output directory.
///
/// # Returns
///
/// * `CliResult<()>` - Ok if successful, Err if the process fails or writes nothing.
pub fn run_generator<E: CommandExecutor>(
    invocation: &GeneratorInvocation,
    executor: &E,
) -> CliResult<()> {
    let args = invocation.args();
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    tracing::debug!(program = %invocation.program, args = ?args, "running generator");
    let cmd_result = executor.execute(&invocation.program, &arg_refs)?;

    if !cmd_result.status.success() {
        let stderr = String::from_utf8_lossy(&cmd_result.stderr);
        return Err(CliError::General(format!(
            "{} failed with status {}: {}",
            invocation.program, cmd_result.status, stderr
        )));
    }

    if !invocation.output_dir.is_dir() {
        return Err(CliError::General(format!(
            "{} produced no output in {:?}",
            invocation.program, invocation.output_dir
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::os::unix::process::ExitStatusExt;
    use std::process::{ExitStatus, Output};
    use tempfile::tempdir;

    // Mock Executor to capture commands
    struct MockExecutor {
        last_command: RefCell<Option<(String, Vec<String>)>>,
        should_fail: bool,
    }

    impl MockExecutor {
        fn new(should_fail: bool) -> Self {
            Self {
                last_command: RefCell::new(None),
                should_fail,
            }
        }
    }

    impl CommandExecutor for MockExecutor {
        fn execute(&self, program: &str, args: &[&str]) -> CliResult<Output> {
            self.last_command.borrow_mut().replace((
                program.to_string(),
                args.iter().map(|s| s.to_string()).collect(),
            ));

            let status = if self.should_fail {
                ExitStatus::from_raw(1 << 8)
            } else {
                ExitStatus::from_raw(0)
            };

            Ok(Output {
                status,
                stdout: Vec::new(),
                stderr: if self.should_fail {
                    b"Mock Error".to_vec()
                } else {
                    Vec::new()
                },
            })
        }
    }

    #[test]
    fn test_args_full() {
        let mut inv = GeneratorInvocation::new(
            "openapi-generator-cli",
            "csharp",
            PathBuf::from("openapi-spec.json"),
            PathBuf::from("generated/dotnet"),
        );
        inv.package_name = Some("Acme.WebClient".into());
        inv.config_file = Some(PathBuf::from("openapitools.json"));
        inv.template_dir = Some(PathBuf::from("openapi-template"));
        inv.additional_properties = vec![
            ("library".into(), "httpclient".into()),
            ("nullableReferenceTypes".into(), "true".into()),
        ];
        inv.type_mappings = vec![("DateTime".into(), "DateTimeOffset".into())];

        assert_eq!(
            inv.args(),
            vec![
                "generate",
                "--generator-name",
                "csharp",
                "--config",
                "openapitools.json",
                "--additional-properties",
                "library=httpclient,nullableReferenceTypes=true",
                "--input-spec",
                "openapi-spec.json",
                "--output",
                "generated/dotnet",
                "--template-dir",
                "openapi-template",
                "--package-name",
                "Acme.WebClient",
                "--type-mappings",
                "DateTime=DateTimeOffset",
            ]
        );
    }

    #[test]
    fn test_run_generator_success() {
        let dir = tempdir().unwrap();
        let executor = MockExecutor::new(false);
        let inv = GeneratorInvocation::new(
            "openapi-generator-cli",
            "typescript-fetch",
            PathBuf::from("spec.json"),
            dir.path().to_path_buf(),
        );

        run_generator(&inv, &executor).unwrap();

        let (prog, args) = executor.last_command.take().unwrap();
        assert_eq!(prog, "openapi-generator-cli");
        assert_eq!(args[0], "generate");
        assert_eq!(args[2], "typescript-fetch");
    }

    #[test]
    fn test_run_generator_failure() {
        let dir = tempdir().unwrap();
        let executor = MockExecutor::new(true);
        let inv = GeneratorInvocation::new(
            "openapi-generator-cli",
            "csharp",
            PathBuf::from("spec.json"),
            dir.path().to_path_buf(),
        );

        match run_generator(&inv, &executor).unwrap_err() {
            CliError::General(msg) => {
                assert!(msg.contains("openapi-generator-cli failed"));
                assert!(msg.contains("Mock Error"));
            }
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_run_generator_without_output() {
        let dir = tempdir().unwrap();
        let executor = MockExecutor::new(false);
        let inv = GeneratorInvocation::new(
            "openapi-generator-cli",
            "csharp",
            PathBuf::from("spec.json"),
            dir.path().join("never-written"),
        );

        let err = run_generator(&inv, &executor).unwrap_err();
        assert!(err.to_string().contains("produced no output"));
    }

    #[test]
    fn test_target_properties() {
        assert_eq!(Target::Csharp.generator_name(), "csharp");
        assert_eq!(Target::Typescript.generator_name(), "typescript-fetch");
        assert_eq!(Target::Csharp.extension(), "cs");
    }

    #[test]
    fn test_shell_executor_structure() {
        // `echo` stands in for the generator; a missing binary surfaces as CliError::Io.
        let exec = ShellExecutor;
        match exec.execute("echo", &["test"]) {
            Ok(output) => assert!(output.status.success()),
            Err(e) => assert!(matches!(e, CliError::Io(_))),
        }
    }
}
