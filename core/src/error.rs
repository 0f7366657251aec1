//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// String errors default to `General`. The stage-specific variants carry a
/// message and must be constructed explicitly.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The specification document could not be read or lacks `components.schemas`.
    #[from(ignore)]
    #[display("Specification Error: {_0}")]
    Spec(String),

    /// A generated file could not be rewritten, or too many files lacked anchors.
    #[from(ignore)]
    #[display("Rewrite Error: {_0}")]
    Rewrite(String),

    /// The destination tree could not be replaced.
    /// The destination must be treated as inconsistent until a full re-run.
    #[from(ignore)]
    #[display("Relocation Error: {_0}")]
    Relocation(String),

    /// The external code generator failed or produced no output tree.
    #[from(ignore)]
    #[display("Generator Error: {_0}")]
    Generator(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
