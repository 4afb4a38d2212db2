// By-reference reclassification (transform step 5)
//
// Some C++ APIs return values through reference out-arguments. Those
// methods need a different wrapper shape, so they move out of the normal
// method list into the byref collections. A member moves, it never
// duplicates.

use crate::model::entities::{base_type, Class, Method};
use crate::model::module::ModuleInfo;
use std::collections::BTreeSet;

/// Reclassify byref methods across a module's classes
pub fn reclassify_module(module: &mut ModuleInfo, byref_types: &BTreeSet<String>) {
    for class in module
        .classes
        .iter_mut()
        .chain(module.class_templates.iter_mut().map(|t| &mut t.class))
    {
        reclassify_class(class, byref_types);
    }
}

/// Reclassify one class's methods
pub fn reclassify_class(class: &mut Class, byref_types: &BTreeSet<String>) {
    let moved = split_off(&mut class.methods, |m| is_byref(m, byref_types));
    class.methods_byref.extend(moved);

    let moved = split_off(&mut class.static_methods, |m| is_byref(m, byref_types));
    class.static_methods_byref.extend(moved);

    let moved = split_off(&mut class.methods, is_return_byref);
    class.methods_return_byref.extend(moved);
}

/// Void return with at least one reference argument of a configured type
fn is_byref(method: &Method, byref_types: &BTreeSet<String>) -> bool {
    method.return_type.trim() == "void"
        && method
            .args
            .iter()
            .any(|a| a.is_reference() && byref_types.contains(&a.base_type()))
}

/// Bare-reference return with no arguments, non-static, non-pure-virtual
fn is_return_byref(method: &Method) -> bool {
    !method.is_static
        && !method.is_pure_virtual
        && method.args.is_empty()
        && method.returns_reference()
}

/// Normalize configured byref type spellings down to their base types
pub fn normalize_types(spellings: &[String]) -> BTreeSet<String> {
    spellings.iter().map(|s| base_type(s)).collect()
}

fn split_off<F>(methods: &mut Vec<Method>, predicate: F) -> Vec<Method>
where
    F: Fn(&Method) -> bool,
{
    let mut moved = Vec::new();
    let mut kept = Vec::new();
    for m in methods.drain(..) {
        if predicate(&m) {
            moved.push(m);
        } else {
            kept.push(m);
        }
    }
    *methods = kept;
    moved
}
