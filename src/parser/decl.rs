// Declaration tree handed from a parser integration to the extractor
//
// The tree is an owned, serializable snapshot of one translation unit. The
// extractor only ever reads it, so parser integrations stay swappable and
// nothing patches a third-party cursor type at runtime.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// C++ access specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

/// Where a declaration lives and whether it is a true definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Location {
    /// File the declaration was seen in
    pub file: PathBuf,
    /// False for forward declarations
    pub is_definition: bool,
}

impl Location {
    pub fn definition(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            is_definition: true,
        }
    }

    pub fn forward(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            is_definition: false,
        }
    }
}

/// A function/method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub type_spelling: String,
    /// Literal tokens following `=` in the declaration, if any
    pub default_value: Option<String>,
}

impl ParamDecl {
    pub fn new(name: &str, type_spelling: &str) -> Self {
        Self {
            name: name.to_string(),
            type_spelling: type_spelling.to_string(),
            default_value: None,
        }
    }

    pub fn with_default(name: &str, type_spelling: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            type_spelling: type_spelling.to_string(),
            default_value: Some(default.to_string()),
        }
    }
}

/// A base-class edge with its access specifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSpecifier {
    pub name: String,
    pub access: Access,
    pub is_virtual: bool,
}

impl BaseSpecifier {
    pub fn public(name: &str) -> Self {
        Self {
            name: name.to_string(),
            access: Access::Public,
            is_virtual: false,
        }
    }

    pub fn with_access(name: &str, access: Access) -> Self {
        Self {
            name: name.to_string(),
            access,
            is_virtual: false,
        }
    }
}

/// Kind of declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Class,
    ClassTemplate,
    Method,
    Constructor,
    Destructor,
    Function,
    Enum,
    Field,
    Typedef,
    Namespace,
}

/// One node of the declaration tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub kind: DeclKind,
    /// Bare spelling (e.g. `Bar`)
    pub name: String,
    /// Spelling with signature for callables (e.g. `Bar(double)`)
    pub display_name: String,
    /// Linker name, when the integration could derive one
    pub mangled_name: Option<String>,
    /// Brief documentation comment, if present
    pub comment: Option<String>,
    pub location: Location,
    pub access: Access,
    /// Qualified owner name for out-of-body member definitions
    pub semantic_parent: Option<String>,
    /// Return type spelling for callables
    pub return_type: Option<String>,
    pub params: Vec<ParamDecl>,
    pub bases: Vec<BaseSpecifier>,
    /// Underlying type spelling for typedefs
    pub underlying_type: Option<String>,
    /// Template type parameter names for class templates
    pub type_parameters: Vec<String>,
    /// Ordered value names for enums
    pub enum_values: Vec<String>,
    pub is_static: bool,
    pub is_const: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_inline: bool,
    pub is_anonymous: bool,
    pub children: Vec<Decl>,
}

impl Decl {
    /// Create a declaration with empty payloads
    pub fn new(kind: DeclKind, name: &str, location: Location) -> Self {
        Self {
            kind,
            name: name.to_string(),
            display_name: name.to_string(),
            mangled_name: None,
            comment: None,
            location,
            access: Access::Public,
            semantic_parent: None,
            return_type: None,
            params: Vec::new(),
            bases: Vec::new(),
            underlying_type: None,
            type_parameters: Vec::new(),
            enum_values: Vec::new(),
            is_static: false,
            is_const: false,
            is_virtual: false,
            is_pure_virtual: false,
            is_inline: false,
            is_anonymous: false,
            children: Vec::new(),
        }
    }

    pub fn with_mangled(mut self, mangled: &str) -> Self {
        self.mangled_name = Some(mangled.to_string());
        self
    }

    pub fn with_return_type(mut self, spelling: &str) -> Self {
        self.return_type = Some(spelling.to_string());
        self
    }

    pub fn with_params(mut self, params: Vec<ParamDecl>) -> Self {
        self.display_name = format!(
            "{}({})",
            self.name,
            params
                .iter()
                .map(|p| p.type_spelling.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.params = params;
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_children(mut self, children: Vec<Decl>) -> Self {
        self.children = children;
        self
    }

    /// Whether this declares a callable entity
    pub fn is_callable(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Method | DeclKind::Constructor | DeclKind::Destructor | DeclKind::Function
        )
    }

    /// Whether the name uses the C++ operator spelling
    pub fn is_operator(&self) -> bool {
        self.name.starts_with("operator")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decl_new() {
        let decl = Decl::new(DeclKind::Class, "gp_Ax1", Location::definition("gp_Ax1.hxx"));
        assert_eq!(decl.name, "gp_Ax1");
        assert_eq!(decl.access, Access::Public);
        assert!(decl.location.is_definition);
        assert!(decl.children.is_empty());
    }

    #[test]
    fn test_forward_location() {
        let loc = Location::forward("gp_Pnt.hxx");
        assert!(!loc.is_definition);
    }

    #[test]
    fn test_with_params_updates_display_name() {
        let decl = Decl::new(
            DeclKind::Method,
            "SetLocation",
            Location::definition("gp_Ax1.hxx"),
        )
        .with_params(vec![ParamDecl::new("P", "const gp_Pnt &")])
        .with_return_type("void");

        assert_eq!(decl.display_name, "SetLocation(const gp_Pnt &)");
        assert_eq!(decl.return_type.as_deref(), Some("void"));
    }

    #[test]
    fn test_param_with_default() {
        let p = ParamDecl::with_default("Tol", "double", "1.0e-7");
        assert_eq!(p.default_value.as_deref(), Some("1.0e-7"));
    }

    #[test]
    fn test_is_operator() {
        let op = Decl::new(
            DeclKind::Method,
            "operator+",
            Location::definition("gp_Vec.hxx"),
        );
        assert!(op.is_operator());
        assert!(op.is_callable());

        let plain = Decl::new(DeclKind::Method, "Add", Location::definition("gp_Vec.hxx"));
        assert!(!plain.is_operator());
    }

    #[test]
    fn test_base_specifier() {
        let base = BaseSpecifier::public("Standard_Transient");
        assert_eq!(base.access, Access::Public);
        assert!(!base.is_virtual);

        let hidden = BaseSpecifier::with_access("Secret", Access::Private);
        assert_eq!(hidden.access, Access::Private);
    }

    #[test]
    fn test_serialization_round_trip() {
        let decl = Decl::new(DeclKind::Enum, "gp_TrsfForm", Location::definition("gp.hxx"));
        let json = serde_json::to_string(&decl).expect("serialize");
        let back: Decl = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, decl);
    }
}
