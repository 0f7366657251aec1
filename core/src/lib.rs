#![deny(missing_docs)]

//! # Clientgen Core
//!
//! Post-processing for generated OpenAPI client SDKs: resolves schemas to
//! handwritten model types, rewrites the generated tree to import them, and
//! relocates the result into the consuming project.

/// Shared error types.
pub mod error;

/// OpenAPI document access.
pub mod spec;

/// Handwritten model lookup.
pub mod resolver;

/// Schema -> symbol mapping.
pub mod mapping;

/// In-place rewriting of generated sources.
pub mod rewriter;

/// Moving generated trees into place.
pub mod relocator;

pub use error::{AppError, AppResult};
pub use mapping::{
    page_element, ImportMapping, ImportMappingBuilder, PagePolicy, PageWrapper, Pagination,
    RenderedMapping, SymbolRef,
};
pub use relocator::{relocate, remove_scratch, Relocation};
pub use resolver::{Granularity, Located, SchemaNameResolver};
pub use rewriter::{ClientTreeRewriter, ModelCleanup, RewriteConfig, RewriteReport};
pub use spec::SpecDocument;
