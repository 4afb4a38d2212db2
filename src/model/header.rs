// Header extraction: one translation unit in, one HeaderInfo out
//
// Only entities truly defined in the header survive. Forward declarations
// and definitions that live in included files belong to whichever header
// defines them and are dropped here.

use crate::model::entities::{
    base_type, Argument, Class, ClassTemplate, Constructor, Destructor, Enum, Field, Function,
    Method, Typedef,
};
use crate::parser::{Access, Decl, DeclKind, TranslationUnit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Entities discovered strictly within one header file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HeaderInfo {
    pub path: PathBuf,
    pub short_name: String,
    /// Files referenced by the header's preprocessor includes
    pub dependencies: Vec<PathBuf>,
    /// Class name to declared public base names, header scope only
    pub inheritance: BTreeMap<String, Vec<String>>,
    pub classes: Vec<Class>,
    pub class_templates: Vec<ClassTemplate>,
    pub enums: Vec<Enum>,
    pub functions: Vec<Function>,
    /// Free operator functions
    pub operators: Vec<Function>,
    pub typedefs: Vec<Typedef>,
}

impl HeaderInfo {
    /// Check if the header produced any entities
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.class_templates.is_empty()
            && self.enums.is_empty()
            && self.functions.is_empty()
            && self.operators.is_empty()
            && self.typedefs.is_empty()
    }
}

/// Extract the entities a translation unit defines locally
pub fn extract_header(tu: &TranslationUnit) -> HeaderInfo {
    let mut info = HeaderInfo {
        path: tu.path.clone(),
        short_name: tu
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        dependencies: tu.includes.clone(),
        ..Default::default()
    };

    // Typedef registry first, so argument types can be resolved while
    // extracting callables
    let typedefs: BTreeMap<String, Typedef> = tu
        .decls
        .iter()
        .filter(|d| d.kind == DeclKind::Typedef && defined_locally(d, &tu.path))
        .filter_map(|d| {
            let underlying = d.underlying_type.as_deref()?;
            let mut td = Typedef::new(&d.name, underlying);
            td.comment = d.comment.clone();
            Some((td.name.clone(), td))
        })
        .collect();

    let mut free_methods: Vec<&Decl> = Vec::new();

    for decl in &tu.decls {
        if !defined_locally(decl, &tu.path) {
            continue;
        }

        match decl.kind {
            DeclKind::Class => {
                if decl.name.is_empty() {
                    continue;
                }
                let class = extract_class(decl, &typedefs);
                info.inheritance
                    .insert(class.name.clone(), class.superclass.clone());
                info.classes.push(class);
            }
            DeclKind::ClassTemplate => {
                if decl.name.is_empty() {
                    continue;
                }
                let class = extract_class(decl, &typedefs);
                info.inheritance
                    .insert(class.name.clone(), class.superclass.clone());
                info.class_templates.push(ClassTemplate {
                    class,
                    type_parameters: decl.type_parameters.clone(),
                });
            }
            DeclKind::Enum => {
                let mut e = Enum::new(&decl.name);
                e.comment = decl.comment.clone();
                e.values = decl.enum_values.clone();
                e.is_anonymous = decl.is_anonymous || decl.name.is_empty();
                info.enums.push(e);
            }
            DeclKind::Function => {
                let f = extract_function(decl, &typedefs);
                if decl.is_operator() {
                    info.operators.push(f);
                } else {
                    info.functions.push(f);
                }
            }
            DeclKind::Method if decl.semantic_parent.is_some() => {
                // Defined outside the class body; matched back below
                free_methods.push(decl);
            }
            DeclKind::Typedef => {
                if let Some(td) = typedefs.get(&decl.name) {
                    info.typedefs.push(td.clone());
                }
            }
            _ => {}
        }
    }

    // Match free-standing method definitions back to their owning class
    for decl in free_methods {
        let Some(parent) = decl.semantic_parent.as_deref() else {
            continue;
        };
        let Some(class) = info.classes.iter_mut().find(|c| c.name == parent) else {
            continue;
        };
        push_method(class, decl, &typedefs);
    }

    // Resolve transitive ancestry within this header's view
    for class in info
        .classes
        .iter_mut()
        .chain(info.class_templates.iter_mut().map(|t| &mut t.class))
    {
        class.superclasses = ancestor_chain(&class.name, &info.inheritance);
        class.rootclass = root_ancestors(&class.superclasses, &info.inheritance);
    }

    info
}

/// Whether a declaration is truly defined in the parsed file
fn defined_locally(decl: &Decl, tu_path: &Path) -> bool {
    decl.location.is_definition && same_header(&decl.location.file, tu_path)
}

/// Approximate path equality, tolerant of extension differences
fn same_header(a: &Path, b: &Path) -> bool {
    fn key(p: &Path) -> PathBuf {
        let mut p = p.to_path_buf();
        p.set_extension("");
        p
    }
    key(a) == key(b)
}

/// Build a class record from its declaration subtree
fn extract_class(decl: &Decl, typedefs: &BTreeMap<String, Typedef>) -> Class {
    let mut class = Class::new(&decl.name);
    class.comment = decl.comment.clone();

    // Public base edges only; protected/private inheritance stays private
    // to the C++ side
    class.superclass = decl
        .bases
        .iter()
        .filter(|b| b.access == Access::Public)
        .map(|b| b.name.clone())
        .collect();

    for child in &decl.children {
        match child.kind {
            DeclKind::Constructor if child.access == Access::Public => {
                let mut ctor = Constructor::new(&child.name);
                ctor.full_name = child.display_name.clone();
                ctor.mangled_name = child.mangled_name.clone();
                ctor.comment = child.comment.clone();
                ctor.args = extract_args(child, typedefs);
                ctor.is_inline = child.is_inline;
                class.constructors.push(ctor);
            }
            DeclKind::Destructor => {
                let mut dtor = Destructor::new(&child.name);
                dtor.mangled_name = child.mangled_name.clone();
                dtor.comment = child.comment.clone();
                dtor.is_virtual = child.is_virtual;
                dtor.is_inline = child.is_inline;
                match child.access {
                    Access::Public => class.destructors.push(dtor),
                    Access::Private => class.private_destructors.push(dtor),
                    Access::Protected => {}
                }
            }
            DeclKind::Method if child.access == Access::Public => {
                push_method(&mut class, child, typedefs);
            }
            DeclKind::Field if child.access == Access::Public => {
                class.fields.push(Field {
                    name: child.name.clone(),
                    comment: child.comment.clone(),
                    type_spelling: child.underlying_type.clone().unwrap_or_default(),
                });
            }
            _ => {}
        }
    }

    class.update_abstract();
    class
}

/// File the method into the right mutually exclusive collection
fn push_method(class: &mut Class, decl: &Decl, typedefs: &BTreeMap<String, Typedef>) {
    let method = extract_method(decl, typedefs);
    match (decl.is_operator(), decl.is_static) {
        (true, true) => class.static_operators.push(method),
        (true, false) => class.operators.push(method),
        (false, true) => class.static_methods.push(method),
        (false, false) => class.methods.push(method),
    }
}

fn extract_method(decl: &Decl, typedefs: &BTreeMap<String, Typedef>) -> Method {
    let mut m = Method::new(&decl.name);
    m.full_name = decl.display_name.clone();
    m.mangled_name = decl.mangled_name.clone();
    m.comment = decl.comment.clone();
    m.return_type = decl
        .return_type
        .clone()
        .unwrap_or_else(|| "void".to_string());
    m.args = extract_args(decl, typedefs);
    m.is_static = decl.is_static;
    m.is_const = decl.is_const;
    m.is_virtual = decl.is_virtual;
    m.is_pure_virtual = decl.is_pure_virtual;
    m.is_inline = decl.is_inline;
    m
}

fn extract_function(decl: &Decl, typedefs: &BTreeMap<String, Typedef>) -> Function {
    let mut f = Function::new(&decl.name);
    f.full_name = decl.display_name.clone();
    f.mangled_name = decl.mangled_name.clone();
    f.comment = decl.comment.clone();
    f.return_type = decl
        .return_type
        .clone()
        .unwrap_or_else(|| "void".to_string());
    f.args = extract_args(decl, typedefs);
    f.is_inline = decl.is_inline;
    f
}

fn extract_args(decl: &Decl, typedefs: &BTreeMap<String, Typedef>) -> Vec<Argument> {
    decl.params
        .iter()
        .map(|p| Argument {
            name: p.name.clone(),
            type_spelling: resolve_type(&p.type_spelling, typedefs),
            default_value: p.default_value.clone(),
        })
        .collect()
}

/// Unwrap one layer of non-POD typedef, preserving qualifiers.
///
/// `Standard_Real&` (typedef of double) stays as spelled; an alias of a
/// class type is replaced by its underlying spelling so the generator sees
/// an unambiguous type.
pub fn resolve_type(spelling: &str, typedefs: &BTreeMap<String, Typedef>) -> String {
    let base = base_type(spelling);
    match typedefs.get(&base) {
        Some(td) if !td.is_plain_data => spelling.replacen(&base, &td.underlying_type, 1),
        _ => spelling.to_string(),
    }
}

/// Transitive ancestor chain in declaration order, excluding the class itself
pub fn ancestor_chain(name: &str, inheritance: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut chain = Vec::new();
    let mut pending: Vec<String> = inheritance.get(name).cloned().unwrap_or_default();

    while !pending.is_empty() {
        let mut next = Vec::new();
        for base in pending {
            if chain.contains(&base) || base == name {
                continue;
            }
            chain.push(base.clone());
            next.extend(inheritance.get(&base).cloned().unwrap_or_default());
        }
        pending = next;
    }

    chain
}

/// Terminal ancestors: chain members with no further known base
pub fn root_ancestors(chain: &[String], inheritance: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    chain
        .iter()
        .filter(|a| inheritance.get(*a).map_or(true, |b| b.is_empty()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{BaseSpecifier, Location, ParamDecl};

    fn class_decl(name: &str, file: &str) -> Decl {
        Decl::new(DeclKind::Class, name, Location::definition(file))
    }

    fn method_decl(name: &str, file: &str) -> Decl {
        Decl::new(DeclKind::Method, name, Location::definition(file))
            .with_return_type("void")
            .with_params(vec![])
    }

    fn tu_with(decls: Vec<Decl>) -> TranslationUnit {
        TranslationUnit {
            path: PathBuf::from("gp_Ax1.hxx"),
            includes: vec![PathBuf::from("gp_Pnt.hxx")],
            decls,
        }
    }

    #[test]
    fn test_extracts_local_class() {
        let class = class_decl("gp_Ax1", "gp_Ax1.hxx")
            .with_children(vec![method_decl("SetLocation", "gp_Ax1.hxx")]);
        let info = extract_header(&tu_with(vec![class]));

        assert_eq!(info.classes.len(), 1);
        assert_eq!(info.classes[0].name, "gp_Ax1");
        assert_eq!(info.classes[0].methods.len(), 1);
        assert_eq!(info.short_name, "gp_Ax1.hxx");
        assert_eq!(info.dependencies, vec![PathBuf::from("gp_Pnt.hxx")]);
    }

    #[test]
    fn test_forward_declaration_dropped() {
        let fwd = Decl::new(DeclKind::Class, "gp_Pnt", Location::forward("gp_Ax1.hxx"));
        let info = extract_header(&tu_with(vec![fwd]));
        assert!(info.classes.is_empty());
    }

    #[test]
    fn test_definition_in_included_file_dropped() {
        let foreign = class_decl("Standard_Transient", "Standard_Transient.hxx");
        let info = extract_header(&tu_with(vec![foreign]));
        assert!(info.classes.is_empty());
    }

    #[test]
    fn test_same_header_tolerates_extension() {
        assert!(same_header(
            Path::new("include/gp_Ax1.hxx"),
            Path::new("include/gp_Ax1")
        ));
        assert!(!same_header(
            Path::new("gp_Ax1.hxx"),
            Path::new("gp_Pnt.hxx")
        ));
    }

    #[test]
    fn test_free_method_matched_to_class() {
        let class = class_decl("Foo", "gp_Ax1.hxx");
        let mut free = method_decl("Bar", "gp_Ax1.hxx");
        free.semantic_parent = Some("Foo".to_string());

        let info = extract_header(&tu_with(vec![class, free]));
        assert_eq!(info.classes[0].methods.len(), 1);
        assert_eq!(info.classes[0].methods[0].name, "Bar");
    }

    #[test]
    fn test_free_method_with_unknown_class_dropped() {
        let mut free = method_decl("Bar", "gp_Ax1.hxx");
        free.semantic_parent = Some("Elsewhere".to_string());

        let info = extract_header(&tu_with(vec![free]));
        assert!(info.classes.is_empty());
    }

    #[test]
    fn test_only_public_bases_recorded() {
        let mut class = class_decl("Geom_Line", "gp_Ax1.hxx");
        class.bases = vec![
            BaseSpecifier::public("Geom_Curve"),
            BaseSpecifier::with_access("Geom_Hidden", Access::Protected),
        ];

        let info = extract_header(&tu_with(vec![class]));
        assert_eq!(info.classes[0].superclass, vec!["Geom_Curve"]);
        assert_eq!(
            info.inheritance.get("Geom_Line").unwrap(),
            &vec!["Geom_Curve".to_string()]
        );
    }

    #[test]
    fn test_private_members_dropped() {
        let class = class_decl("Foo", "gp_Ax1.hxx").with_children(vec![
            method_decl("Visible", "gp_Ax1.hxx"),
            method_decl("Hidden", "gp_Ax1.hxx").with_access(Access::Private),
        ]);

        let info = extract_header(&tu_with(vec![class]));
        assert_eq!(info.classes[0].methods.len(), 1);
        assert_eq!(info.classes[0].methods[0].name, "Visible");
    }

    #[test]
    fn test_private_destructor_kept_separately() {
        let mut dtor = Decl::new(
            DeclKind::Destructor,
            "~Foo",
            Location::definition("gp_Ax1.hxx"),
        );
        dtor.access = Access::Private;
        let class = class_decl("Foo", "gp_Ax1.hxx").with_children(vec![dtor]);

        let info = extract_header(&tu_with(vec![class]));
        assert!(info.classes[0].destructors.is_empty());
        assert_eq!(info.classes[0].private_destructors.len(), 1);
    }

    #[test]
    fn test_operator_split() {
        let class = class_decl("gp_Vec", "gp_Ax1.hxx").with_children(vec![
            method_decl("Add", "gp_Ax1.hxx"),
            method_decl("operator+", "gp_Ax1.hxx"),
        ]);
        let free_op = Decl::new(
            DeclKind::Function,
            "operator*",
            Location::definition("gp_Ax1.hxx"),
        )
        .with_return_type("gp_Vec")
        .with_params(vec![]);

        let info = extract_header(&tu_with(vec![class, free_op]));
        assert_eq!(info.classes[0].methods.len(), 1);
        assert_eq!(info.classes[0].operators.len(), 1);
        assert_eq!(info.operators.len(), 1);
        assert!(info.functions.is_empty());
    }

    #[test]
    fn test_typedef_resolution_unwraps_class_alias() {
        let td = {
            let mut d = Decl::new(
                DeclKind::Typedef,
                "PntArray",
                Location::definition("gp_Ax1.hxx"),
            );
            d.underlying_type = Some("NCollection_Array1<gp_Pnt>".to_string());
            d
        };
        let class = class_decl("Foo", "gp_Ax1.hxx").with_children(vec![method_decl(
            "Fill",
            "gp_Ax1.hxx",
        )
        .with_params(vec![ParamDecl::new("arr", "const PntArray &")])]);

        let info = extract_header(&tu_with(vec![td, class]));
        assert_eq!(
            info.classes[0].methods[0].args[0].type_spelling,
            "const NCollection_Array1<gp_Pnt> &"
        );
    }

    #[test]
    fn test_typedef_resolution_keeps_plain_data_alias() {
        let td = {
            let mut d = Decl::new(
                DeclKind::Typedef,
                "Standard_Real",
                Location::definition("gp_Ax1.hxx"),
            );
            d.underlying_type = Some("double".to_string());
            d
        };
        let class = class_decl("Foo", "gp_Ax1.hxx").with_children(vec![method_decl(
            "GetValue",
            "gp_Ax1.hxx",
        )
        .with_params(vec![ParamDecl::new("v", "Standard_Real&")])]);

        let info = extract_header(&tu_with(vec![td, class]));
        assert_eq!(
            info.classes[0].methods[0].args[0].type_spelling,
            "Standard_Real&"
        );
    }

    #[test]
    fn test_ancestor_chain_and_roots() {
        let mut inheritance = BTreeMap::new();
        inheritance.insert("C".to_string(), vec!["B".to_string()]);
        inheritance.insert("B".to_string(), vec!["A".to_string()]);
        inheritance.insert("A".to_string(), vec![]);

        let chain = ancestor_chain("C", &inheritance);
        assert_eq!(chain, vec!["B", "A"]);
        assert_eq!(root_ancestors(&chain, &inheritance), vec!["A"]);
    }

    #[test]
    fn test_ancestor_chain_unknown_base_is_root() {
        let mut inheritance = BTreeMap::new();
        inheritance.insert(
            "TopoDS_Solid".to_string(),
            vec!["TopoDS_Shape".to_string()],
        );

        let chain = ancestor_chain("TopoDS_Solid", &inheritance);
        assert_eq!(chain, vec!["TopoDS_Shape"]);
        assert_eq!(root_ancestors(&chain, &inheritance), vec!["TopoDS_Shape"]);
    }

    #[test]
    fn test_ancestor_chain_survives_cycle() {
        let mut inheritance = BTreeMap::new();
        inheritance.insert("A".to_string(), vec!["B".to_string()]);
        inheritance.insert("B".to_string(), vec!["A".to_string()]);

        let chain = ancestor_chain("A", &inheritance);
        assert_eq!(chain, vec!["B"]);
    }

    #[test]
    fn test_abstract_class_detected() {
        let mut pure = method_decl("FirstParameter", "gp_Ax1.hxx");
        pure.is_pure_virtual = true;
        pure.is_virtual = true;
        let class = class_decl("Geom_Curve", "gp_Ax1.hxx").with_children(vec![pure]);

        let info = extract_header(&tu_with(vec![class]));
        assert!(info.classes[0].is_abstract);
    }

    #[test]
    fn test_enum_extraction() {
        let mut e = Decl::new(
            DeclKind::Enum,
            "gp_TrsfForm",
            Location::definition("gp_Ax1.hxx"),
        );
        e.enum_values = vec!["gp_Identity".to_string(), "gp_Rotation".to_string()];

        let info = extract_header(&tu_with(vec![e]));
        assert_eq!(info.enums.len(), 1);
        assert_eq!(info.enums[0].values.len(), 2);
        assert!(!info.enums[0].is_anonymous);
    }

    #[test]
    fn test_class_template_extraction() {
        let mut t = Decl::new(
            DeclKind::ClassTemplate,
            "NCollection_Array1",
            Location::definition("gp_Ax1.hxx"),
        );
        t.type_parameters = vec!["TheItemType".to_string()];

        let info = extract_header(&tu_with(vec![t]));
        assert_eq!(info.class_templates.len(), 1);
        assert_eq!(
            info.class_templates[0].type_parameters,
            vec!["TheItemType"]
        );
    }
}
