// C++ header parsing using tree-sitter
//
// Walks the tree-sitter-cpp grammar into the owned `Decl` tree. Only the
// declaration shapes the model records are extracted; grammar `ERROR`
// subtrees are skipped so one broken declaration never blocks the rest of
// the header.

use crate::error::{Error, Result};
use crate::parser::decl::{Access, BaseSpecifier, Decl, DeclKind, Location, ParamDecl};
use crate::parser::{mangle, HeaderParser, ParserContext, TranslationUnit};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Parser for C++ header files
pub struct CppParser {
    context: ParserContext,
}

impl CppParser {
    /// Create a new C++ parser with the given context
    pub fn new(context: ParserContext) -> Self {
        Self { context }
    }

    fn ts_parser() -> Result<Parser> {
        let mut parser = Parser::new();
        let language = tree_sitter_cpp::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::parse("<grammar>", format!("Failed to set C++ language: {}", e)))?;
        Ok(parser)
    }

    /// Parse C++ source text as the translation unit for `path`
    pub fn parse_source(&self, source: &str, path: PathBuf) -> Result<TranslationUnit> {
        // Strip a BOM which would otherwise surface as an ERROR node
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        let full = if self.context.preamble.is_empty() {
            source.to_string()
        } else {
            format!("{}\n{}", self.context.preamble, source)
        };

        let mut parser = Self::ts_parser()?;
        let tree = parser
            .parse(&full, None)
            .ok_or_else(|| Error::parse(path.clone(), "failed to parse source"))?;

        let mut tu = TranslationUnit::new(path.clone());
        let mut walker = Walker {
            source: full.as_bytes(),
            file: path,
            namespaces: Vec::new(),
        };
        walker.visit_scope(tree.root_node(), &mut tu.includes, &mut tu.decls);

        Ok(tu)
    }

    /// Count grammar error nodes in a source file (used by `validate`)
    pub fn error_count(&self, source: &str) -> Result<usize> {
        let mut parser = Self::ts_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| Error::parse("<memory>", "failed to parse source"))?;

        let mut count = 0;
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            if node.is_error() || node.is_missing() {
                count += 1;
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }
        Ok(count)
    }
}

impl HeaderParser for CppParser {
    fn parse_header(&self, path: &Path) -> Result<TranslationUnit> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        self.parse_source(&source, path.to_path_buf())
    }
}

/// Tree walk state
struct Walker<'a> {
    source: &'a [u8],
    file: PathBuf,
    namespaces: Vec<String>,
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or_default().to_string()
    }

    /// Visit the children of a file-scope or namespace-scope node
    fn visit_scope(&mut self, node: Node, includes: &mut Vec<PathBuf>, decls: &mut Vec<Decl>) {
        let mut pending_comment: Option<String> = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "comment" => {
                    pending_comment = Some(clean_comment(&self.text(child)));
                    continue;
                }
                "preproc_include" => {
                    if let Some(path) = self.include_path(child) {
                        includes.push(path);
                    }
                }
                "preproc_ifdef" | "preproc_if" | "preproc_else" | "preproc_elif"
                | "linkage_specification" | "declaration_list" => {
                    // Include guards and extern "C" blocks wrap real content
                    self.visit_scope(child, includes, decls);
                }
                "namespace_definition" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| self.text(n))
                        .unwrap_or_default();
                    self.namespaces.push(name);
                    if let Some(body) = child.child_by_field_name("body") {
                        self.visit_scope(body, includes, decls);
                    }
                    self.namespaces.pop();
                }
                "class_specifier" | "struct_specifier" => {
                    if let Some(decl) = self.class_decl(child, pending_comment.take()) {
                        decls.push(decl);
                    }
                }
                "enum_specifier" => {
                    if let Some(decl) = self.enum_decl(child, pending_comment.take()) {
                        decls.push(decl);
                    }
                }
                "declaration" => {
                    self.visit_declaration(child, pending_comment.take(), decls);
                }
                "function_definition" => {
                    if let Some(decl) = self.callable_decl(child, None, pending_comment.take(), true)
                    {
                        decls.push(decl);
                    }
                }
                "template_declaration" => {
                    if let Some(decl) = self.template_decl(child, pending_comment.take()) {
                        decls.push(decl);
                    }
                }
                "type_definition" => {
                    if let Some(decl) = self.typedef_decl(child, pending_comment.take()) {
                        decls.push(decl);
                    }
                }
                "alias_declaration" => {
                    if let Some(decl) = self.alias_decl(child, pending_comment.take()) {
                        decls.push(decl);
                    }
                }
                "ERROR" => {
                    // A malformed declaration must not block the rest
                }
                _ => {}
            }
            pending_comment = None;
        }
    }

    /// A file-scope `declaration` node: a type declaration or a free callable
    fn visit_declaration(&mut self, node: Node, comment: Option<String>, decls: &mut Vec<Decl>) {
        if let Some(ty) = node.child_by_field_name("type") {
            match ty.kind() {
                "class_specifier" | "struct_specifier" => {
                    if let Some(decl) = self.class_decl(ty, comment) {
                        decls.push(decl);
                    }
                    return;
                }
                "enum_specifier" => {
                    if let Some(decl) = self.enum_decl(ty, comment) {
                        decls.push(decl);
                    }
                    return;
                }
                _ => {}
            }
        }

        if find_function_declarator(node).is_some() {
            if let Some(decl) = self.callable_decl(node, None, comment, false) {
                decls.push(decl);
            }
        }
    }

    /// Extract the include path operand of a `#include` line
    fn include_path(&self, node: Node) -> Option<PathBuf> {
        let path_node = node.child_by_field_name("path")?;
        let raw = self.text(path_node);
        let trimmed = raw
            .trim_start_matches(['"', '<'])
            .trim_end_matches(['"', '>']);
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }

    /// A class/struct specifier, definition or forward declaration
    fn class_decl(&mut self, node: Node, comment: Option<String>) -> Option<Decl> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let body = node.child_by_field_name("body");

        let location = if body.is_some() {
            Location::definition(self.file.clone())
        } else {
            Location::forward(self.file.clone())
        };

        let mut decl = Decl::new(DeclKind::Class, &name, location);
        decl.comment = comment;
        decl.is_anonymous = name.is_empty();

        let default_access = if node.kind() == "struct_specifier" {
            Access::Public
        } else {
            Access::Private
        };

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "base_class_clause" {
                decl.bases = self.base_specifiers(child, default_access);
            }
        }

        if let Some(body) = body {
            decl.children = self.class_members(body, &name, default_access);
        }

        Some(decl)
    }

    /// Parse `: public A, B, virtual C` into base specifiers
    fn base_specifiers(&self, node: Node, default_access: Access) -> Vec<BaseSpecifier> {
        let mut bases = Vec::new();
        let mut access = default_access;
        let mut is_virtual = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "access_specifier" | "public" | "protected" | "private" => {
                    access = match self.text(child).as_str() {
                        "public" => Access::Public,
                        "protected" => Access::Protected,
                        _ => Access::Private,
                    };
                }
                "virtual" => is_virtual = true,
                "type_identifier" | "qualified_identifier" | "template_type" => {
                    bases.push(BaseSpecifier {
                        name: self.text(child),
                        access,
                        is_virtual,
                    });
                    access = default_access;
                    is_virtual = false;
                }
                _ => {}
            }
        }

        bases
    }

    /// Walk a class body collecting member declarations with their access
    fn class_members(&mut self, body: Node, class_name: &str, default_access: Access) -> Vec<Decl> {
        let mut members = Vec::new();
        let mut access = default_access;
        let mut pending_comment: Option<String> = None;

        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "comment" => {
                    pending_comment = Some(clean_comment(&self.text(child)));
                    continue;
                }
                "access_specifier" => {
                    access = match self.text(child).trim_end_matches(':').trim() {
                        "public" => Access::Public,
                        "protected" => Access::Protected,
                        _ => Access::Private,
                    };
                }
                "field_declaration" | "declaration" => {
                    if find_function_declarator(child).is_some() {
                        if let Some(mut decl) =
                            self.callable_decl(child, Some(class_name), pending_comment.take(), false)
                        {
                            decl.access = access;
                            members.push(decl);
                        }
                    } else if let Some(mut decl) =
                        self.field_decl(child, pending_comment.take())
                    {
                        decl.access = access;
                        members.push(decl);
                    }
                }
                "function_definition" => {
                    // Defined in the class body, hence implicitly inline
                    if let Some(mut decl) =
                        self.callable_decl(child, Some(class_name), pending_comment.take(), true)
                    {
                        decl.access = access;
                        members.push(decl);
                    }
                }
                "enum_specifier" => {
                    if let Some(mut decl) = self.enum_decl(child, pending_comment.take()) {
                        decl.access = access;
                        members.push(decl);
                    }
                }
                _ => {}
            }
            pending_comment = None;
        }

        members
    }

    /// A data member
    fn field_decl(&self, node: Node, comment: Option<String>) -> Option<Decl> {
        let type_text = node.child_by_field_name("type").map(|n| self.text(n))?;
        let declarator = node.child_by_field_name("declarator")?;
        let (name, suffix) = unwrap_declarator(declarator, self.source);
        if name.is_empty() {
            return None;
        }

        let mut decl = Decl::new(DeclKind::Field, &name, Location::definition(self.file.clone()));
        decl.comment = comment;
        decl.underlying_type = Some(format!("{}{}", type_text, suffix));
        Some(decl)
    }

    /// A method, constructor, destructor or free function
    fn callable_decl(
        &mut self,
        node: Node,
        class_name: Option<&str>,
        comment: Option<String>,
        is_definition_body: bool,
    ) -> Option<Decl> {
        let func = find_function_declarator(node)?;

        let declarator = func.child_by_field_name("declarator")?;
        let (raw_name, semantic_parent) = match declarator.kind() {
            "qualified_identifier" => {
                let scope = declarator
                    .child_by_field_name("scope")
                    .map(|n| self.text(n));
                let name = declarator
                    .child_by_field_name("name")
                    .map(|n| self.text(n))
                    .unwrap_or_else(|| self.text(declarator));
                (name, scope)
            }
            _ => (self.text(declarator), None),
        };

        if raw_name.is_empty() {
            return None;
        }

        // Shape of the callable: destructors spell `~Name`, constructors
        // reuse the class name, everything else is a plain method/function
        let owner: Option<String> = semantic_parent
            .clone()
            .or_else(|| class_name.map(str::to_string));
        let kind = if raw_name.starts_with('~') {
            DeclKind::Destructor
        } else if owner.as_deref().map(|c| c == raw_name).unwrap_or(false) {
            DeclKind::Constructor
        } else if owner.is_some() {
            DeclKind::Method
        } else {
            DeclKind::Function
        };

        let mut decl = Decl::new(kind, &raw_name, Location::definition(self.file.clone()));
        decl.comment = comment;
        decl.semantic_parent = semantic_parent;
        decl.is_inline = is_definition_body && class_name.is_some();

        // Specifiers preceding the declarator
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "virtual" | "virtual_function_specifier" => decl.is_virtual = true,
                "storage_class_specifier" => match self.text(child).as_str() {
                    "static" => decl.is_static = true,
                    "inline" => decl.is_inline = true,
                    _ => {}
                },
                _ => {}
            }
        }

        // Pure virtual: `= 0` trailing the declarator
        if let Some(default) = node.child_by_field_name("default_value") {
            if self.text(default).trim() == "0" {
                decl.is_pure_virtual = true;
                decl.is_virtual = true;
            }
        } else if decl.is_virtual && !is_definition_body {
            if let Some(tail) = default_after_eq(&self.text(node)) {
                if tail.trim_end_matches(';').trim() == "0" {
                    decl.is_pure_virtual = true;
                }
            }
        }

        // Const qualification of the method itself
        let mut fcursor = func.walk();
        for child in func.children(&mut fcursor) {
            if child.kind() == "type_qualifier" && self.text(child) == "const" {
                decl.is_const = true;
            }
        }

        // Return type with any pointer/reference wrappers
        if !matches!(kind, DeclKind::Constructor | DeclKind::Destructor) {
            let base = node
                .child_by_field_name("type")
                .map(|n| self.text(n))
                .unwrap_or_else(|| "void".to_string());
            let qualifier = node
                .children(&mut node.walk())
                .find(|c| c.kind() == "type_qualifier")
                .map(|c| format!("{} ", self.text(c)))
                .unwrap_or_default();
            let suffix = declarator_suffix(node, func, self.source);
            decl.return_type = Some(format!("{}{}{}", qualifier, base, suffix));
        }

        // Parameters
        if let Some(params) = func.child_by_field_name("parameters") {
            decl = decl.with_params(self.parameters(params));
        } else {
            decl = decl.with_params(Vec::new());
        }

        decl.mangled_name = self.mangled_name(&decl, owner.as_deref());
        Some(decl)
    }

    /// Parse a parameter list
    fn parameters(&self, node: Node) -> Vec<ParamDecl> {
        let mut params = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "parameter_declaration" | "optional_parameter_declaration" => {
                    let base = child
                        .child_by_field_name("type")
                        .map(|n| self.text(n))
                        .unwrap_or_default();
                    let qualifier = child
                        .children(&mut child.walk())
                        .find(|c| c.kind() == "type_qualifier")
                        .map(|c| format!("{} ", self.text(c)))
                        .unwrap_or_default();

                    let (name, suffix) = child
                        .child_by_field_name("declarator")
                        .map(|d| unwrap_declarator(d, self.source))
                        .unwrap_or_default();

                    // Token scan: the literal following `=`, when present
                    let default = child
                        .child_by_field_name("default_value")
                        .map(|n| self.text(n))
                        .or_else(|| default_after_eq(&self.text(child)));

                    params.push(ParamDecl {
                        name,
                        type_spelling: format!("{}{}{}", qualifier, base, suffix),
                        default_value: default,
                    });
                }
                _ => {}
            }
        }

        params
    }

    /// Derive the linker name for a callable, best effort
    fn mangled_name(&self, decl: &Decl, owner: Option<&str>) -> Option<String> {
        let param_types: Vec<String> =
            decl.params.iter().map(|p| p.type_spelling.clone()).collect();

        match decl.kind {
            DeclKind::Constructor => mangle::mangle_constructor(owner?, &param_types),
            DeclKind::Destructor => mangle::mangle_destructor(owner?),
            DeclKind::Method => {
                if decl.is_static {
                    mangle::mangle_function(
                        &format!("{}::{}", owner?, decl.name),
                        &param_types,
                    )
                } else {
                    mangle::mangle_method(owner?, &decl.name, &param_types, decl.is_const)
                }
            }
            DeclKind::Function => {
                let qualified = if self.namespaces.is_empty() {
                    decl.name.clone()
                } else {
                    format!("{}::{}", self.namespaces.join("::"), decl.name)
                };
                mangle::mangle_function(&qualified, &param_types)
            }
            _ => None,
        }
    }

    /// An enum declaration with its ordered values
    fn enum_decl(&self, node: Node, comment: Option<String>) -> Option<Decl> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let body = node.child_by_field_name("body");

        let location = if body.is_some() {
            Location::definition(self.file.clone())
        } else {
            Location::forward(self.file.clone())
        };

        let mut decl = Decl::new(DeclKind::Enum, &name, location);
        decl.comment = comment;
        decl.is_anonymous = name.is_empty();

        if let Some(body) = body {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                if child.kind() == "enumerator" {
                    if let Some(value) = child.child_by_field_name("name") {
                        decl.enum_values.push(self.text(value));
                    }
                }
            }
        }

        Some(decl)
    }

    /// `typedef Underlying Name;`
    fn typedef_decl(&self, node: Node, comment: Option<String>) -> Option<Decl> {
        let underlying = node.child_by_field_name("type").map(|n| self.text(n))?;
        let declarator = node.child_by_field_name("declarator")?;
        let (name, suffix) = unwrap_declarator(declarator, self.source);
        if name.is_empty() {
            return None;
        }

        let mut decl = Decl::new(DeclKind::Typedef, &name, Location::definition(self.file.clone()));
        decl.comment = comment;
        decl.underlying_type = Some(format!("{}{}", underlying, suffix));
        Some(decl)
    }

    /// `using Name = Underlying;`
    fn alias_decl(&self, node: Node, comment: Option<String>) -> Option<Decl> {
        let name = node.child_by_field_name("name").map(|n| self.text(n))?;
        let underlying = node.child_by_field_name("type").map(|n| self.text(n))?;

        let mut decl = Decl::new(DeclKind::Typedef, &name, Location::definition(self.file.clone()));
        decl.comment = comment;
        decl.underlying_type = Some(underlying);
        Some(decl)
    }

    /// `template <...> class X { ... };`
    fn template_decl(&mut self, node: Node, comment: Option<String>) -> Option<Decl> {
        let mut type_parameters = Vec::new();
        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for child in params.children(&mut cursor) {
                match child.kind() {
                    "type_parameter_declaration" => {
                        // `typename T` / `class T`
                        let text = self.text(child);
                        let name = text
                            .trim_start_matches("typename")
                            .trim_start_matches("class")
                            .trim();
                        if !name.is_empty() {
                            type_parameters.push(name.to_string());
                        }
                    }
                    "parameter_declaration" => {
                        if let Some(d) = child.child_by_field_name("declarator") {
                            type_parameters.push(self.text(d));
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(child.kind(), "class_specifier" | "struct_specifier") {
                let mut decl = self.class_decl(child, comment)?;
                decl.kind = DeclKind::ClassTemplate;
                decl.type_parameters = type_parameters;
                return Some(decl);
            }
        }

        None
    }
}

/// Find the `function_declarator` in a declaration, looking through
/// pointer/reference wrappers
fn find_function_declarator(node: Node) -> Option<Node> {
    let mut current = node.child_by_field_name("declarator")?;
    loop {
        match current.kind() {
            "function_declarator" => return Some(current),
            "pointer_declarator" | "reference_declarator" => {
                current = current.child_by_field_name("declarator").or_else(|| {
                    let mut cursor = current.walk();
                    let found = current
                        .children(&mut cursor)
                        .find(|c| c.kind().ends_with("declarator"));
                    found
                })?;
            }
            _ => return None,
        }
    }
}

/// Pointer/reference tokens between a declaration's type and its
/// function declarator (the return-type wrappers)
fn declarator_suffix(decl: Node, func: Node, source: &[u8]) -> String {
    let mut suffix = String::new();
    let mut current = decl.child_by_field_name("declarator");
    while let Some(node) = current {
        if node.id() == func.id() {
            break;
        }
        match node.kind() {
            "pointer_declarator" => suffix.push('*'),
            "reference_declarator" => {
                let text = node.utf8_text(source).unwrap_or_default();
                if text.starts_with("&&") {
                    suffix.push_str("&&");
                } else {
                    suffix.push('&');
                }
            }
            _ => break,
        }
        current = node.child_by_field_name("declarator").or_else(|| {
            let mut cursor = node.walk();
            let found = node
                .children(&mut cursor)
                .find(|c| c.kind().ends_with("declarator"));
            found
        });
    }
    suffix
}

/// Unwrap a (possibly pointer/reference-wrapped) declarator into its
/// identifier and the accumulated `*`/`&` suffix
fn unwrap_declarator(node: Node, source: &[u8]) -> (String, String) {
    let mut suffix = String::new();
    let mut current = node;

    loop {
        match current.kind() {
            "pointer_declarator" => suffix.push('*'),
            "reference_declarator" => {
                let text = current.utf8_text(source).unwrap_or_default();
                if text.starts_with("&&") {
                    suffix.push_str("&&");
                } else {
                    suffix.push('&');
                }
            }
            "identifier" | "field_identifier" | "type_identifier" | "destructor_name"
            | "operator_name" => {
                let name = current.utf8_text(source).unwrap_or_default().to_string();
                return (name, suffix);
            }
            "array_declarator" | "init_declarator" | "parenthesized_declarator" => {}
            _ => return (String::new(), suffix),
        }

        let next = current.child_by_field_name("declarator").or_else(|| {
            let mut cursor = current.walk();
            let found = current
                .children(&mut cursor)
                .find(|c| c.kind().ends_with("identifier") || c.kind().ends_with("declarator"));
            found
        });
        match next {
            Some(n) => current = n,
            None => return (String::new(), suffix),
        }
    }
}

/// The literal tokens following `=` in a declaration snippet
fn default_after_eq(text: &str) -> Option<String> {
    let (_, tail) = text.split_once('=')?;
    let tail = tail.trim().trim_end_matches(';').trim_end_matches(')').trim();
    if tail.is_empty() {
        None
    } else {
        Some(tail.to_string())
    }
}

/// Strip comment markers and leading decoration
fn clean_comment(raw: &str) -> String {
    let raw = raw.trim();
    let body = if let Some(rest) = raw.strip_prefix("/*") {
        rest.trim_end_matches("*/")
    } else {
        raw
    };

    body.lines()
        .map(|l| {
            l.trim()
                .trim_start_matches("//!")
                .trim_start_matches("///")
                .trim_start_matches("//")
                .trim_start_matches('*')
                .trim()
        })
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
