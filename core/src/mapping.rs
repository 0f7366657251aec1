#![deny(missing_docs)]

//! # Import Mapping
//!
//! Maps schema names declared in the specification to the handwritten symbols
//! they should resolve to in the generated client.
//!
//! The mapping is an explicit accumulator: [`ImportMappingBuilder::build`]
//! takes one by value and hands back the extended mapping. Entries are never
//! overwritten, so building twice over the same document is a no-op.

use crate::error::{AppError, AppResult};
use crate::resolver::{Granularity, Located, SchemaNameResolver};
use crate::spec::SpecDocument;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Suffix marking a paginated wrapper schema.
pub const PAGE_SUFFIX: &str = "Page";

/// Returns the element name of a page wrapper schema (`PluginPage` -> `Plugin`).
///
/// A bare `Page` has no element and is not a wrapper.
pub fn page_element(schema_name: &str) -> Option<&str> {
    schema_name
        .strip_suffix(PAGE_SUFFIX)
        .filter(|element| !element.is_empty())
}

/// How `*Page` schemas are mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagePolicy {
    /// Every page schema maps to the shared pagination namespace.
    /// The element type is recovered only through the alias table.
    SharedNamespace,
    /// Page schemas map to `Pagination<Element>` with the element resolved like any schema.
    #[default]
    Parameterized,
}

impl FromStr for PagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared" => Ok(Self::SharedNamespace),
            "parameterized" => Ok(Self::Parameterized),
            other => Err(format!(
                "unknown page policy `{}` (expected `shared` or `parameterized`)",
                other
            )),
        }
    }
}

/// The shared generic pagination type handwritten code provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Namespace holding the type. Required by [`PagePolicy::SharedNamespace`].
    pub namespace: Option<String>,
    /// Generic type name, e.g. `Page` in `Page<Plugin>`.
    pub type_name: String,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            namespace: None,
            type_name: "Pagination".to_string(),
        }
    }
}

/// What a schema name resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolRef {
    /// A handwritten type found under a search root.
    Type(Located),
    /// A name nothing on disk matched. Only appears as a pagination element.
    Unresolved(String),
    /// The shared pagination namespace ([`PagePolicy::SharedNamespace`]).
    SharedPagination {
        /// Namespace every page schema collapses to.
        namespace: String,
        /// Generic type used when rendering aliases.
        type_name: String,
    },
    /// `Pagination<Element>` ([`PagePolicy::Parameterized`]).
    Paginated {
        /// Namespace of the pagination type, imported alongside the element's.
        namespace: Option<String>,
        /// Generic type name.
        type_name: String,
        /// The wrapped element.
        element: Box<SymbolRef>,
    },
}

impl SymbolRef {
    /// Renders the symbol. Located types honour `granularity`; composite symbols
    /// always render in full.
    pub fn reference(&self, granularity: Granularity) -> String {
        match self {
            SymbolRef::Type(located) => located.reference(granularity),
            other => other.to_string(),
        }
    }

    /// Namespaces a file must import to use this symbol.
    ///
    /// The shared pagination namespace is left out, it would import itself.
    pub fn namespaces(&self) -> Vec<&str> {
        match self {
            SymbolRef::Type(located) if !located.namespace.is_empty() => {
                vec![located.namespace.as_str()]
            }
            SymbolRef::Type(_) | SymbolRef::Unresolved(_) | SymbolRef::SharedPagination { .. } => {
                Vec::new()
            }
            SymbolRef::Paginated {
                namespace, element, ..
            } => {
                let mut out: Vec<&str> = namespace.iter().map(String::as_str).collect();
                out.extend(element.namespaces());
                out
            }
        }
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolRef::Type(located) => write!(f, "{}", located),
            SymbolRef::Unresolved(name) => f.write_str(name),
            SymbolRef::SharedPagination { namespace, .. } => f.write_str(namespace),
            SymbolRef::Paginated {
                type_name, element, ..
            } => write!(f, "{}<{}>", type_name, element),
        }
    }
}

/// A page wrapper schema and the alias that replaces it in generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWrapper {
    /// The schema name, e.g. `PluginPage`.
    pub schema: String,
    /// The element name, e.g. `Plugin`.
    pub element: String,
    /// The aliased type, e.g. `Page<Acme.Model.Plugin>`.
    pub target: String,
}

/// Schema name -> resolved symbol, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMapping {
    entries: IndexMap<String, SymbolRef>,
}

impl ImportMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry unless `name` is already mapped. Returns whether it was inserted.
    pub fn insert(&mut self, name: impl Into<String>, symbol: SymbolRef) -> bool {
        match self.entries.entry(name.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(symbol);
                true
            }
        }
    }

    /// Looks up a schema name.
    pub fn get(&self, name: &str) -> Option<&SymbolRef> {
        self.entries.get(name)
    }

    /// Whether `name` has an entry.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymbolRef)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serializable view rendering every symbol at `granularity`, in insertion order.
    pub fn rendered(&self, granularity: Granularity) -> RenderedMapping<'_> {
        RenderedMapping {
            mapping: self,
            granularity,
        }
    }

    /// Distinct namespaces referenced by the mapping, sorted.
    pub fn namespaces(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .flat_map(SymbolRef::namespaces)
            .map(str::to_string)
            .collect()
    }

    /// Every mapped page schema paired with its element and alias target.
    pub fn page_wrappers(&self) -> Vec<PageWrapper> {
        self.entries
            .iter()
            .filter_map(|(schema, symbol)| {
                let element = page_element(schema)?;
                let target = match symbol {
                    SymbolRef::SharedPagination {
                        namespace,
                        type_name,
                    } => {
                        let element_ref = match self.get(element) {
                            Some(found) if matches!(found, SymbolRef::Type(_)) => found.to_string(),
                            _ => element.to_string(),
                        };
                        // the shared namespace is not imported, so the type is qualified here
                        format!("{}.{}<{}>", namespace, type_name, element_ref)
                    }
                    SymbolRef::Paginated { .. } => symbol.to_string(),
                    // page names are never resolved through the filesystem
                    SymbolRef::Type(_) | SymbolRef::Unresolved(_) => return None,
                };
                Some(PageWrapper {
                    schema: schema.clone(),
                    element: element.to_string(),
                    target,
                })
            })
            .collect()
    }
}

/// An [`ImportMapping`] serialized as a `name -> reference` object.
#[derive(Debug, Clone, Copy)]
pub struct RenderedMapping<'a> {
    mapping: &'a ImportMapping,
    granularity: Granularity,
}

impl Serialize for RenderedMapping<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.mapping.len()))?;
        for (name, symbol) in self.mapping.iter() {
            map.serialize_entry(name, &symbol.reference(self.granularity))?;
        }
        map.end()
    }
}

/// Builds an [`ImportMapping`] from the schemas a specification declares.
#[derive(Debug)]
pub struct ImportMappingBuilder<'a> {
    resolver: &'a SchemaNameResolver,
    policy: PagePolicy,
    pagination: Pagination,
}

impl<'a> ImportMappingBuilder<'a> {
    /// Creates a builder.
    ///
    /// Fails if the shared page policy is selected without a pagination namespace.
    pub fn new(
        resolver: &'a SchemaNameResolver,
        policy: PagePolicy,
        pagination: Pagination,
    ) -> AppResult<Self> {
        if policy == PagePolicy::SharedNamespace && pagination.namespace.is_none() {
            return Err(AppError::General(
                "the shared page policy requires a pagination namespace".into(),
            ));
        }

        Ok(Self {
            resolver,
            policy,
            pagination,
        })
    }

    /// Extends `mapping` with every schema of `spec` that resolves, in declared order.
    ///
    /// Unresolved schemas are left out; the generator synthesizes them.
    pub fn build(&self, spec: &SpecDocument, mut mapping: ImportMapping) -> ImportMapping {
        for name in spec.schema_names() {
            if mapping.contains(name) {
                continue;
            }

            match self.resolve(name, &mapping) {
                Some(symbol) => {
                    debug!(schema = name, symbol = %symbol, "resolved schema");
                    mapping.insert(name, symbol);
                }
                None => debug!(schema = name, "no handwritten model, leaving to generator"),
            }
        }

        mapping
    }

    fn resolve(&self, name: &str, mapping: &ImportMapping) -> Option<SymbolRef> {
        if let Some(existing) = mapping.get(name) {
            return Some(existing.clone());
        }

        match page_element(name) {
            Some(element) => Some(self.resolve_page(element, mapping)),
            // the pagination type itself lives in the shared namespace
            None if name == PAGE_SUFFIX && self.policy == PagePolicy::SharedNamespace => {
                Some(self.shared_pagination())
            }
            None => self.resolver.locate(name).map(SymbolRef::Type),
        }
    }

    fn resolve_page(&self, element: &str, mapping: &ImportMapping) -> SymbolRef {
        match self.policy {
            PagePolicy::SharedNamespace => self.shared_pagination(),
            PagePolicy::Parameterized => {
                let element = self
                    .resolve(element, mapping)
                    .unwrap_or_else(|| SymbolRef::Unresolved(element.to_string()));
                SymbolRef::Paginated {
                    namespace: self.pagination.namespace.clone(),
                    type_name: self.pagination.type_name.clone(),
                    element: Box::new(element),
                }
            }
        }
    }

    fn shared_pagination(&self) -> SymbolRef {
        SymbolRef::SharedPagination {
            namespace: self.pagination.namespace.clone().unwrap_or_default(),
            type_name: self.pagination.type_name.clone(),
        }
    }
}
