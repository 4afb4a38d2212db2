// Canonical entity records for the cross-module model
//
// These are the records the extractor produces, the transform mutates in
// place, and the renderer consumes. They are serializable so intermediate
// artifacts can be written between pipeline stages.

use serde::{Deserialize, Serialize};

/// A function/method argument: name, resolved type, default literal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Argument {
    pub name: String,
    pub type_spelling: String,
    pub default_value: Option<String>,
}

impl Argument {
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

    /// Base type with const/reference/pointer qualifiers stripped
    pub fn base_type(&self) -> String {
        base_type(&self.type_spelling)
    }

    /// Whether the type is spelled as a reference
    pub fn is_reference(&self) -> bool {
        self.type_spelling.trim_end().ends_with('&')
    }
}

/// A free function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Function {
    pub name: String,
    /// Display name with signature
    pub full_name: String,
    pub mangled_name: Option<String>,
    pub comment: Option<String>,
    pub return_type: String,
    pub args: Vec<Argument>,
    pub is_inline: bool,
}

impl Function {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            full_name: name.to_string(),
            mangled_name: None,
            comment: None,
            return_type: "void".to_string(),
            args: Vec::new(),
            is_inline: false,
        }
    }
}

/// A class member function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Method {
    pub name: String,
    pub full_name: String,
    pub mangled_name: Option<String>,
    pub comment: Option<String>,
    pub return_type: String,
    pub args: Vec<Argument>,
    pub is_static: bool,
    pub is_const: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_inline: bool,
}

impl Method {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            full_name: name.to_string(),
            mangled_name: None,
            comment: None,
            return_type: "void".to_string(),
            args: Vec::new(),
            is_static: false,
            is_const: false,
            is_virtual: false,
            is_pure_virtual: false,
            is_inline: false,
        }
    }

    /// Whether the return type is spelled as a bare reference
    pub fn returns_reference(&self) -> bool {
        self.return_type.trim_end().ends_with('&')
    }
}

/// A constructor (no return type)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Constructor {
    pub name: String,
    pub full_name: String,
    pub mangled_name: Option<String>,
    pub comment: Option<String>,
    pub args: Vec<Argument>,
    pub is_inline: bool,
}

impl Constructor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            full_name: name.to_string(),
            mangled_name: None,
            comment: None,
            args: Vec::new(),
            is_inline: false,
        }
    }
}

/// A destructor (no return type, no arguments)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destructor {
    pub name: String,
    pub mangled_name: Option<String>,
    pub comment: Option<String>,
    pub is_virtual: bool,
    pub is_inline: bool,
}

impl Destructor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mangled_name: None,
            comment: None,
            is_virtual: false,
            is_inline: false,
        }
    }
}

/// An enumeration with its ordered value names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enum {
    pub name: String,
    pub comment: Option<String>,
    pub values: Vec<String>,
    pub is_anonymous: bool,
}

impl Enum {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            comment: None,
            values: Vec::new(),
            is_anonymous: name.is_empty(),
        }
    }
}

/// A public data member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub comment: Option<String>,
    pub type_spelling: String,
}

/// A typedef or type alias
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Typedef {
    pub name: String,
    pub comment: Option<String>,
    pub underlying_type: String,
    pub is_plain_data: bool,
    /// For aliases of template instantiations: the template name
    pub template_base: Option<String>,
    /// For aliases of template instantiations: the argument spellings
    pub template_args: Vec<String>,
}

impl Typedef {
    /// Create a typedef, decomposing template instantiations
    pub fn new(name: &str, underlying: &str) -> Self {
        let (template_base, template_args) = decompose_template(underlying);
        Self {
            name: name.to_string(),
            comment: None,
            underlying_type: underlying.to_string(),
            is_plain_data: is_plain_data(underlying),
            template_base,
            template_args,
        }
    }
}

/// A class with its mutually exclusive member collections
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Class {
    pub name: String,
    pub comment: Option<String>,
    /// Direct public base-class names
    pub superclass: Vec<String>,
    /// Full transitive ancestor chain in declaration order
    pub superclasses: Vec<String>,
    /// Terminal ancestors with no further base
    pub rootclass: Vec<String>,
    pub is_abstract: bool,
    pub fields: Vec<Field>,
    pub constructors: Vec<Constructor>,
    pub destructors: Vec<Destructor>,
    pub private_destructors: Vec<Destructor>,
    pub methods: Vec<Method>,
    pub static_methods: Vec<Method>,
    pub operators: Vec<Method>,
    pub static_operators: Vec<Method>,
    /// Void-returning methods rewritten to return through an out-argument
    pub methods_byref: Vec<Method>,
    pub static_methods_byref: Vec<Method>,
    /// Zero-argument methods returning a bare reference
    pub methods_return_byref: Vec<Method>,
    /// Pre-filter snapshot kept when the symbol filter removes members
    pub unfiltered: Option<Box<Class>>,
}

impl Class {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Merge another definition of the same class into this one.
    ///
    /// Member lists and documentation are concatenated, first seen first;
    /// duplicate signatures are not collapsed.
    pub fn merge_from(&mut self, other: Class) {
        self.fields.extend(other.fields);
        self.constructors.extend(other.constructors);
        self.destructors.extend(other.destructors);
        self.private_destructors.extend(other.private_destructors);
        self.methods.extend(other.methods);
        self.static_methods.extend(other.static_methods);
        self.operators.extend(other.operators);
        self.static_operators.extend(other.static_operators);

        for base in other.superclass {
            if !self.superclass.contains(&base) {
                self.superclass.push(base);
            }
        }

        match (&mut self.comment, other.comment) {
            (Some(mine), Some(theirs)) => {
                mine.push('\n');
                mine.push_str(&theirs);
            }
            (none @ None, Some(theirs)) => *none = Some(theirs),
            _ => {}
        }

        self.is_abstract = self.is_abstract || other.is_abstract;
    }

    /// Recompute abstractness from publicly reachable pure-virtual members
    pub fn update_abstract(&mut self) {
        self.is_abstract = self
            .methods
            .iter()
            .chain(self.operators.iter())
            .any(|m| m.is_pure_virtual);
    }

    /// Total number of wrappable members
    pub fn member_count(&self) -> usize {
        self.constructors.len()
            + self.destructors.len()
            + self.methods.len()
            + self.static_methods.len()
            + self.operators.len()
            + self.static_operators.len()
            + self.methods_byref.len()
            + self.static_methods_byref.len()
            + self.methods_return_byref.len()
    }
}

/// A class template: a class plus its type parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClassTemplate {
    pub class: Class,
    pub type_parameters: Vec<String>,
}

impl ClassTemplate {
    pub fn new(name: &str, type_parameters: Vec<String>) -> Self {
        Self {
            class: Class::new(name),
            type_parameters,
        }
    }
}

/// Strip const/reference/pointer qualifiers down to the base type spelling
pub fn base_type(spelling: &str) -> String {
    let mut rest = spelling.trim();

    loop {
        if let Some(stripped) = rest
            .strip_suffix('&')
            .or_else(|| rest.strip_suffix('*'))
        {
            rest = stripped.trim_end();
        } else if let Some(stripped) = rest.strip_suffix("const") {
            rest = stripped.trim_end();
        } else {
            break;
        }
    }

    rest.strip_prefix("const ").unwrap_or(rest).trim().to_string()
}

/// Whether a type spelling denotes plain builtin data
pub fn is_plain_data(spelling: &str) -> bool {
    const BUILTINS: &[&str] = &[
        "void", "bool", "char", "signed char", "unsigned char", "short", "unsigned short", "int",
        "unsigned", "unsigned int", "long", "unsigned long", "long long", "unsigned long long",
        "float", "double", "long double", "wchar_t", "size_t",
    ];
    BUILTINS.contains(&base_type(spelling).as_str())
}

/// Split `Base<A, B>` into its template name and argument spellings
fn decompose_template(spelling: &str) -> (Option<String>, Vec<String>) {
    let Some(open) = spelling.find('<') else {
        return (None, Vec::new());
    };
    let Some(close) = spelling.rfind('>') else {
        return (None, Vec::new());
    };
    if close <= open {
        return (None, Vec::new());
    }

    let base = spelling[..open].trim().to_string();
    let inner = &spelling[open + 1..close];

    // Split on top-level commas only
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        args.push(last.to_string());
    }

    (Some(base), args)
}
