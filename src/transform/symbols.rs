// Symbol availability filtering
//
// A declaration parsed from a header may never have been compiled into the
// target binary. Every candidate member is cross-referenced against the
// linker-visible names of the active platform; members that would not link
// are removed, except where no standalone symbol is needed (inline,
// virtual dispatch).

use crate::error::{Error, Result};
use crate::model::entities::{Class, Function};
use crate::model::module::ModuleInfo;
use std::path::Path;

/// An immutable multiset of linker-visible names, loaded once per platform
/// and shared read-only across all filtering workers
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: Vec<String>,
}

impl SymbolTable {
    /// Load an nm-style listing: whitespace-delimited lines with the symbol
    /// name as the last field
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::symbol_table(path, e.to_string()))?;
        Ok(Self::from_listing(&contents))
    }

    /// Parse an nm-style listing from memory
    pub fn from_listing(contents: &str) -> Self {
        let names = contents
            .lines()
            .filter_map(|line| line.split_whitespace().last())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    /// Build a table from bare names (test and tooling convenience)
    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether any entry ends with the given mangled name
    pub fn contains_suffix(&self, mangled: &str) -> bool {
        self.names.iter().any(|n| n.ends_with(mangled))
    }

    /// Whether any entry starts with the given mangled name.
    ///
    /// Free-function overload suffixes vary between compilers while the
    /// namespace-qualified prefix does not, hence the different match mode.
    pub fn contains_prefix(&self, mangled: &str) -> bool {
        self.names.iter().any(|n| n.starts_with(mangled))
    }
}

/// Remove module members that would not link against the symbol table.
///
/// Removed entities stay available through the `unfiltered` snapshots so a
/// later stage can distinguish "absent" from "excluded".
pub fn filter_module(module: &mut ModuleInfo, table: &SymbolTable) {
    for class in module
        .classes
        .iter_mut()
        .chain(module.exceptions.iter_mut())
    {
        filter_class(class, table);
    }

    // Class templates are only ever instantiated by the generated glue
    // itself, so their members never need a pre-existing export

    module.unfiltered_functions = module.functions.clone();
    module.functions.retain(|f| keep_function(f, table));

    module.unfiltered_operators = module.operators.clone();
    module.operators.retain(|f| keep_function(f, table));
}

/// Filter one class, preserving the pre-filter state in `unfiltered`
pub fn filter_class(class: &mut Class, table: &SymbolTable) {
    let mut snapshot = class.clone();
    snapshot.unfiltered = None;
    class.unfiltered = Some(Box::new(snapshot));

    class
        .constructors
        .retain(|c| c.is_inline || matches_suffix(c.mangled_name.as_deref(), table));
    class.destructors.retain(|d| {
        d.is_inline || d.is_virtual || matches_suffix(d.mangled_name.as_deref(), table)
    });

    for collection in [
        &mut class.methods,
        &mut class.static_methods,
        &mut class.operators,
        &mut class.static_operators,
        &mut class.methods_byref,
        &mut class.static_methods_byref,
        &mut class.methods_return_byref,
    ] {
        collection.retain(|m| {
            m.is_inline
                || m.is_virtual
                || m.is_pure_virtual
                || matches_suffix(m.mangled_name.as_deref(), table)
        });
    }
}

fn keep_function(f: &Function, table: &SymbolTable) -> bool {
    f.is_inline
        || f.mangled_name
            .as_deref()
            .map(|m| table.contains_prefix(m))
            .unwrap_or(false)
}

fn matches_suffix(mangled: Option<&str>, table: &SymbolTable) -> bool {
    mangled.map(|m| table.contains_suffix(m)).unwrap_or(false)
}
