// Dependency graphs for emission ordering
//
// Two graphs are built after the per-module transforms settle: a class-level
// graph inside each module and a module-level graph across the whole run.
// An edge points from the dependent entity to the entity that must already
// be declared when the dependent is emitted.

pub mod sort;

pub use sort::topo_sort;

use crate::error::Result;
use crate::model::entities::{base_type, Class};
use crate::model::module::ModuleInfo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;

/// A name-keyed directed dependency graph
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    indices: BTreeMap<String, NodeIndex>,
    /// Node names in insertion order, for reproducible tie-breaking
    order: Vec<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index; adding twice is a no-op
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.indices.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.indices.insert(name.to_string(), idx);
        self.order.push(name.to_string());
        idx
    }

    /// Record that `from` depends on `to`. Unknown targets are ignored so
    /// references to entities outside the graph never distort the order.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let (Some(&from_idx), Some(&to_idx)) = (self.indices.get(from), self.indices.get(to))
        else {
            return;
        };
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Names this node depends on
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        let Some(&idx) = self.indices.get(name) else {
            return Vec::new();
        };
        self.graph
            .neighbors(idx)
            .map(|n| self.graph[n].clone())
            .collect()
    }

    fn insertion_order(&self) -> &[String] {
        &self.order
    }

    fn neighbors(&self, name: &str) -> Vec<String> {
        self.dependencies_of(name)
    }
}

/// Build the class-level graph for one module.
///
/// Edges: inheritance, default-argument types used by constructors/methods,
/// and the base/argument types of typedef'd template aliases.
pub fn class_graph(module: &ModuleInfo) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for class in &module.classes {
        graph.add_node(&class.name);
    }
    for template in &module.class_templates {
        graph.add_node(&template.class.name);
    }
    for td in &module.typedefs {
        graph.add_node(&td.name);
    }

    for class in module
        .classes
        .iter()
        .chain(module.class_templates.iter().map(|t| &t.class))
    {
        for base in &class.superclass {
            graph.add_edge(&class.name, base);
        }
        for ty in default_argument_types(class) {
            graph.add_edge(&class.name, &ty);
        }
    }

    for td in &module.typedefs {
        if let Some(base) = &td.template_base {
            graph.add_edge(&td.name, base);
            for arg in &td.template_args {
                graph.add_edge(&td.name, &base_type(arg));
            }
        }
    }

    graph
}

/// Build the module-level graph across the whole run, projecting class
/// edges through the global entity-to-module dictionaries
pub fn module_graph(
    modules: &[ModuleInfo],
    class_dict: &BTreeMap<String, String>,
    typedef_dict: &BTreeMap<String, String>,
) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for module in modules {
        graph.add_node(&module.name);
    }

    let owner = |name: &str| -> Option<String> {
        class_dict
            .get(name)
            .or_else(|| typedef_dict.get(name))
            .cloned()
    };

    for module in modules {
        for class in module.all_classes().chain(module.exceptions.iter()) {
            for base in &class.superclass {
                if let Some(target) = owner(base) {
                    graph.add_edge(&module.name, &target);
                }
            }
            for ty in default_argument_types(class) {
                if let Some(target) = owner(&ty) {
                    graph.add_edge(&module.name, &target);
                }
            }
        }

        for td in &module.typedefs {
            if let Some(base) = &td.template_base {
                if let Some(target) = owner(base) {
                    graph.add_edge(&module.name, &target);
                }
                for arg in &td.template_args {
                    if let Some(target) = owner(&base_type(arg)) {
                        graph.add_edge(&module.name, &target);
                    }
                }
            }
        }
    }

    graph
}

/// Types referenced by default-argument values across a class's callables
fn default_argument_types(class: &Class) -> Vec<String> {
    let mut types = Vec::new();

    let args = class
        .constructors
        .iter()
        .flat_map(|c| c.args.iter())
        .chain(class.methods.iter().flat_map(|m| m.args.iter()))
        .chain(class.static_methods.iter().flat_map(|m| m.args.iter()))
        .chain(class.methods_byref.iter().flat_map(|m| m.args.iter()))
        .chain(
            class
                .static_methods_byref
                .iter()
                .flat_map(|m| m.args.iter()),
        );

    for arg in args {
        if arg.default_value.is_some() {
            let ty = arg.base_type();
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
    }

    types
}

/// Reorder one module's classes, templates and typedefs into a safe
/// emission order
pub fn sort_module_classes(module: &mut ModuleInfo) -> Result<()> {
    let graph = class_graph(module);
    let order = topo_sort(&graph)?;
    let position: BTreeMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    module
        .classes
        .sort_by_key(|c| position.get(c.name.as_str()).copied().unwrap_or(usize::MAX));
    module.class_templates.sort_by_key(|t| {
        position
            .get(t.class.name.as_str())
            .copied()
            .unwrap_or(usize::MAX)
    });
    module
        .typedefs
        .sort_by_key(|t| position.get(t.name.as_str()).copied().unwrap_or(usize::MAX));

    Ok(())
}

/// Reorder whole modules into a safe emission order
pub fn sort_modules(
    modules: &mut Vec<ModuleInfo>,
    class_dict: &BTreeMap<String, String>,
    typedef_dict: &BTreeMap<String, String>,
) -> Result<()> {
    let graph = module_graph(modules, class_dict, typedef_dict);
    let order = topo_sort(&graph)?;
    let position: BTreeMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    modules.sort_by_key(|m| position.get(m.name.as_str()).copied().unwrap_or(usize::MAX));
    Ok(())
}
