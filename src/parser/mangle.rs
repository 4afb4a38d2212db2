// Itanium-scheme linker names for the declaration shapes the model records
//
// tree-sitter carries no semantic layer, so the parser integration derives
// the linker name itself. Coverage is limited to the constructs the model
// keeps: namespaced free functions, methods with optional const
// qualification, constructors/destructors, builtin and named types with
// const/pointer/reference qualifiers. Substitution compression is not
// applied. Shapes outside that set yield `None` and the symbol filter falls
// back to its inline/virtual escape hatches.

/// Mangle a free function, `qualified_name` like `ns::BRepTools_Write`
pub fn mangle_function(qualified_name: &str, params: &[String]) -> Option<String> {
    let mut out = String::from("_Z");
    out.push_str(&nested_name(qualified_name, None, false)?);
    out.push_str(&bare_function_type(params)?);
    Some(out)
}

/// Mangle a non-static member function
pub fn mangle_method(
    class_name: &str,
    method: &str,
    params: &[String],
    is_const: bool,
) -> Option<String> {
    let mut out = String::from("_Z");
    out.push_str(&nested_name(class_name, Some(method), is_const)?);
    out.push_str(&bare_function_type(params)?);
    Some(out)
}

/// Mangle the complete-object constructor (`C1`)
pub fn mangle_constructor(class_name: &str, params: &[String]) -> Option<String> {
    let mut out = String::from("_Z");
    out.push_str(&nested_name(class_name, Some("C1"), false)?);
    out.push_str(&bare_function_type(params)?);
    Some(out)
}

/// Mangle the complete-object destructor (`D1`)
pub fn mangle_destructor(class_name: &str) -> Option<String> {
    let mut out = String::from("_Z");
    out.push_str(&nested_name(class_name, Some("D1"), false)?);
    out.push('v');
    Some(out)
}

/// `<nested-name>` or `<source-name>` for a possibly qualified name.
///
/// `member` is appended as a final component without length-prefixing when it
/// is a ctor/dtor tag, otherwise as a source name or operator code.
fn nested_name(qualified: &str, member: Option<&str>, is_const: bool) -> Option<String> {
    let components: Vec<&str> = qualified.split("::").filter(|c| !c.is_empty()).collect();
    if components.is_empty() {
        return None;
    }

    let member_code = match member {
        Some("C1") => Some("C1".to_string()),
        Some("D1") => Some("D1".to_string()),
        Some(name) => Some(member_name(name)?),
        None => None,
    };

    let nested = components.len() > 1 || member_code.is_some();
    let mut out = String::new();

    if nested {
        out.push('N');
        if is_const {
            out.push('K');
        }
    }

    for comp in &components {
        out.push_str(&source_name(comp)?);
    }
    if let Some(code) = member_code {
        out.push_str(&code);
    }

    if nested {
        out.push('E');
    }

    Some(out)
}

/// Member component: operator code or length-prefixed source name
fn member_name(name: &str) -> Option<String> {
    if let Some(op) = name.strip_prefix("operator") {
        let op = op.trim();
        return operator_code(op).map(|c| c.to_string());
    }
    source_name(name)
}

/// `<source-name>` = decimal length + identifier
fn source_name(name: &str) -> Option<String> {
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(format!("{}{}", name.len(), name))
}

/// Itanium operator encodings for the overloads a wrapped class can carry
fn operator_code(op: &str) -> Option<&'static str> {
    Some(match op {
        "+" => "pl",
        "-" => "mi",
        "*" => "ml",
        "/" => "dv",
        "%" => "rm",
        "=" => "aS",
        "+=" => "pL",
        "-=" => "mI",
        "*=" => "mL",
        "/=" => "dV",
        "==" => "eq",
        "!=" => "ne",
        "<" => "lt",
        ">" => "gt",
        "<=" => "le",
        ">=" => "ge",
        "!" => "nt",
        "[]" => "ix",
        "()" => "cl",
        "<<" => "ls",
        ">>" => "rs",
        _ => return None,
    })
}

/// `<bare-function-type>`; an empty parameter list encodes as `v`
fn bare_function_type(params: &[String]) -> Option<String> {
    if params.is_empty() {
        return Some("v".to_string());
    }
    let mut out = String::new();
    for p in params {
        out.push_str(&mangle_type(p)?);
    }
    Some(out)
}

/// Encode one parameter type spelling
pub fn mangle_type(spelling: &str) -> Option<String> {
    let mut rest = spelling.trim();
    let mut suffix = String::new();

    // Peel reference/pointer qualifiers from the right
    loop {
        if let Some(stripped) = rest.strip_suffix("&&") {
            suffix.push('O');
            rest = stripped.trim_end();
        } else if let Some(stripped) = rest.strip_suffix('&') {
            suffix.push('R');
            rest = stripped.trim_end();
        } else if let Some(stripped) = rest.strip_suffix('*') {
            suffix.push('P');
            rest = stripped.trim_end();
        } else if let Some(stripped) = rest.strip_suffix("const") {
            suffix.push('K');
            rest = stripped.trim_end();
        } else {
            break;
        }
    }

    if let Some(stripped) = rest.strip_prefix("const ") {
        // West const binds to the base type
        rest = stripped.trim();
        suffix.push('K');
    }

    let base = builtin_code(rest).map(str::to_string).or_else(|| {
        if rest.contains('<') {
            None
        } else {
            nested_name(rest, None, false)
        }
    })?;

    Some(format!("{}{}", suffix, base))
}

/// Builtin type encodings
fn builtin_code(spelling: &str) -> Option<&'static str> {
    Some(match spelling {
        "void" => "v",
        "bool" => "b",
        "char" => "c",
        "signed char" => "a",
        "unsigned char" => "h",
        "short" | "short int" => "s",
        "unsigned short" | "unsigned short int" => "t",
        "int" => "i",
        "unsigned" | "unsigned int" => "j",
        "long" | "long int" => "l",
        "unsigned long" | "unsigned long int" => "m",
        "long long" | "long long int" => "x",
        "unsigned long long" | "unsigned long long int" => "y",
        "float" => "f",
        "double" => "d",
        "long double" => "e",
        "wchar_t" => "w",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_method_no_args() {
        assert_eq!(
            mangle_method("Foo", "Bar", &[], false).as_deref(),
            Some("_ZN3Foo3BarEv")
        );
    }

    #[test]
    fn test_const_method() {
        assert_eq!(
            mangle_method("gp_Ax1", "Location", &[], true).as_deref(),
            Some("_ZNK6gp_Ax18LocationEv")
        );
    }

    #[test]
    fn test_method_with_builtin_args() {
        assert_eq!(
            mangle_method("Foo", "Set", &strs(&["int", "double"]), false).as_deref(),
            Some("_ZN3Foo3SetEid")
        );
    }

    #[test]
    fn test_free_function() {
        assert_eq!(
            mangle_function("add", &strs(&["int", "int"])).as_deref(),
            Some("_Z3addii")
        );
    }

    #[test]
    fn test_namespaced_free_function() {
        assert_eq!(
            mangle_function("BRepTools::Write", &[]).as_deref(),
            Some("_ZN9BRepTools5WriteEv")
        );
    }

    #[test]
    fn test_constructor_and_destructor() {
        assert_eq!(
            mangle_constructor("gp_Pnt", &strs(&["double", "double", "double"])).as_deref(),
            Some("_ZN6gp_PntC1Eddd")
        );
        assert_eq!(
            mangle_destructor("gp_Pnt").as_deref(),
            Some("_ZN6gp_PntD1Ev")
        );
    }

    #[test]
    fn test_const_reference_argument() {
        assert_eq!(
            mangle_method("gp_Ax1", "SetDirection", &strs(&["const gp_Dir &"]), false).as_deref(),
            Some("_ZN6gp_Ax112SetDirectionERK6gp_Dir")
        );
    }

    #[test]
    fn test_pointer_argument() {
        assert_eq!(mangle_type("char *").as_deref(), Some("Pc"));
        assert_eq!(mangle_type("const char *").as_deref(), Some("PKc"));
    }

    #[test]
    fn test_operator_method() {
        assert_eq!(
            mangle_method("gp_Vec", "operator+", &strs(&["const gp_Vec &"]), true).as_deref(),
            Some("_ZNK6gp_VecplERK6gp_Vec")
        );
    }

    #[test]
    fn test_template_type_punts() {
        assert!(mangle_type("Handle<Standard_Transient>").is_none());
        assert!(mangle_method("Foo", "Get", &strs(&["Handle<T>"]), false).is_none());
    }

    #[test]
    fn test_unknown_operator_punts() {
        assert!(mangle_method("Foo", "operator->", &[], false).is_none());
    }
}
