// Configuration-driven exclusions (transform steps 1-4)
//
// A pattern naming a class or member that does not exist is a silent no-op:
// configuration is allowed to over-specify exclusions so one file can serve
// differently sized header sets.

use crate::model::module::ModuleInfo;
use regex::Regex;

/// Step 1: platform-wide class exclusion by regex
pub fn exclude_classes_global(module: &mut ModuleInfo, patterns: &[Regex]) {
    if patterns.is_empty() {
        return;
    }
    let matches = |name: &str| patterns.iter().any(|p| p.is_match(name));

    module.classes.retain(|c| !matches(&c.name));
    module.class_templates.retain(|t| !matches(&t.class.name));
    module.class_dict.retain(|name, _| !matches(name));
}

/// Step 2: per-module class exclusion by exact name
pub fn exclude_classes_exact(module: &mut ModuleInfo, names: &[String]) {
    if names.is_empty() {
        return;
    }

    module.classes.retain(|c| !names.contains(&c.name));
    module
        .class_templates
        .retain(|t| !names.contains(&t.class.name));
    module.class_dict.retain(|name, _| !names.contains(name));
}

/// Step 3: `ClassRegex::MethodRegex` member exclusion.
///
/// Every class whose name matches the class pattern loses the members whose
/// name matches the method pattern, across methods, static methods and
/// operators.
pub fn exclude_methods(module: &mut ModuleInfo, patterns: &[(Regex, Regex)]) {
    if patterns.is_empty() {
        return;
    }

    for class in module
        .classes
        .iter_mut()
        .chain(module.class_templates.iter_mut().map(|t| &mut t.class))
    {
        for (class_pat, method_pat) in patterns {
            if !class_pat.is_match(&class.name) {
                continue;
            }
            class.methods.retain(|m| !method_pat.is_match(&m.name));
            class
                .static_methods
                .retain(|m| !method_pat.is_match(&m.name));
            class.operators.retain(|m| !method_pat.is_match(&m.name));
        }
    }
}

/// Step 4 (functions): exact-name exclusion at module scope and per-header
/// scope, kept consistent
pub fn exclude_functions(module: &mut ModuleInfo, names: &[String]) {
    if names.is_empty() {
        return;
    }

    module.functions.retain(|f| !names.contains(&f.name));
    for header in &mut module.headers {
        header.functions.retain(|f| !names.contains(&f.name));
    }
}

/// Step 4 (typedefs): exact-name exclusion at module scope and per-header
/// scope, kept consistent
pub fn exclude_typedefs(module: &mut ModuleInfo, names: &[String]) {
    if names.is_empty() {
        return;
    }

    module.typedefs.retain(|t| !names.contains(&t.name));
    module.typedef_dict.retain(|name, _| !names.contains(name));
    for header in &mut module.headers {
        header.typedefs.retain(|t| !names.contains(&t.name));
    }
}

/// Compile an anchored exclusion regex
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}
