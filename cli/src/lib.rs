#![deny(missing_docs)]

//! # Clientgen CLI
//!
//! Command implementations behind the `clientgen` binary.

/// Process-execution errors.
pub mod error;

/// `generate` command: the end-to-end pipeline.
pub mod generate;

/// External generator invocation.
pub mod generator;

/// `resolve` command and shared resolution options.
pub mod resolve;
