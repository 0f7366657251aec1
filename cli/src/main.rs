#![deny(missing_docs)]

//! # Clientgen
//!
//! Generates OpenAPI client SDKs and fits them to a project's conventions.
//!
//! Supported Commands:
//! - `generate`: Pipeline Spec -> Mapping -> Generator -> Rewrite -> Relocate.
//! - `resolve`: Prints the schema import mapping without generating anything.

use clap::{Parser, Subcommand};
use clientgen_cli::generator::ShellExecutor;
use clientgen_cli::{generate, resolve};
use clientgen_core::AppResult;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI client generation toolchain")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a client, rewrite it against handwritten models and move it into place.
    Generate(generate::GenerateArgs),
    /// Print the schema import mapping as JSON.
    Resolve(resolve::ResolveArgs),
}

/// Installs the stderr subscriber, honouring `RUST_LOG` over `-v` flags.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .compact()
        .init();
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Generate(args) => {
            // Injecting the real process runner
            let executor = ShellExecutor;
            generate::execute(args, &executor)?;
        }
        Commands::Resolve(args) => resolve::execute(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "clientgen",
            "-vv",
            "generate",
            "--destination",
            "Acme.Api/Source/Acme.WebClient",
            "--package-name",
            "Acme.WebClient",
            "--search-root",
            "Acme.Core/Source/Acme.Core",
            "--page-policy",
            "shared",
            "--pagination-namespace",
            "Acme.Core.Pagination",
            "--property",
            "library=httpclient",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.package_name.as_deref(), Some("Acme.WebClient"));
                assert_eq!(args.resolution.search_roots.len(), 1);
                assert_eq!(
                    args.resolution.page_policy,
                    clientgen_core::PagePolicy::SharedNamespace
                );
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let res = Cli::try_parse_from([
            "clientgen",
            "resolve",
            "--page-policy",
            "sometimes",
        ]);
        assert!(res.is_err());
    }
}
