// Exception extraction (transform step 6)
//
// Classes identified by naming convention or ancestry as error conditions
// need exception-mapping glue rather than ordinary object wrapping, so they
// move from the class list into the module's exceptions list.

use crate::model::entities::Class;
use crate::model::module::ModuleInfo;
use regex::Regex;

/// Move exception-like classes into the module's exceptions collection
pub fn extract_exceptions(module: &mut ModuleInfo, patterns: &[Regex]) {
    if patterns.is_empty() {
        return;
    }

    let mut kept = Vec::new();
    for class in module.classes.drain(..) {
        if is_exception(&class, patterns) {
            module.exceptions.push(class);
        } else {
            kept.push(class);
        }
    }
    module.classes = kept;
}

/// A class is exception-like when its own name or any transitive ancestor
/// name matches a configured pattern
fn is_exception(class: &Class, patterns: &[Regex]) -> bool {
    patterns.iter().any(|p| {
        p.is_match(&class.name) || class.superclasses.iter().any(|a| p.is_match(a))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::exclude::compile_pattern;

    fn patterns(pats: &[&str]) -> Vec<Regex> {
        pats.iter().map(|p| compile_pattern(p).unwrap()).collect()
    }

    fn module_with(classes: Vec<Class>) -> ModuleInfo {
        ModuleInfo {
            name: "Standard".to_string(),
            classes,
            ..Default::default()
        }
    }

    #[test]
    fn test_exception_by_own_name() {
        // Scenario: MyException with no base moves under .*Exception
        let mut module = module_with(vec![Class::new("MyException"), Class::new("Plain")]);

        extract_exceptions(&mut module, &patterns(&[".*Exception"]));

        assert_eq!(module.classes.len(), 1);
        assert_eq!(module.classes[0].name, "Plain");
        assert_eq!(module.exceptions.len(), 1);
        assert_eq!(module.exceptions[0].name, "MyException");
    }

    #[test]
    fn test_exception_by_ancestor() {
        let mut derived = Class::new("Standard_RangeError");
        derived.superclass = vec!["Standard_DomainError".to_string()];
        derived.superclasses = vec![
            "Standard_DomainError".to_string(),
            "Standard_Failure".to_string(),
        ];

        let mut module = module_with(vec![derived]);
        extract_exceptions(&mut module, &patterns(&["Standard_Failure"]));

        assert!(module.classes.is_empty());
        assert_eq!(module.exceptions.len(), 1);
    }

    #[test]
    fn test_non_matching_class_stays() {
        let mut module = module_with(vec![Class::new("gp_Ax1")]);
        extract_exceptions(&mut module, &patterns(&[".*Exception"]));

        assert_eq!(module.classes.len(), 1);
        assert!(module.exceptions.is_empty());
    }

    #[test]
    fn test_no_patterns_is_noop() {
        let mut module = module_with(vec![Class::new("MyException")]);
        extract_exceptions(&mut module, &[]);
        assert_eq!(module.classes.len(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut module = module_with(vec![
            Class::new("A_Exception"),
            Class::new("B"),
            Class::new("C_Exception"),
            Class::new("D"),
        ]);

        extract_exceptions(&mut module, &patterns(&[".*Exception"]));

        let names: Vec<&str> = module.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "D"]);
        let ex_names: Vec<&str> = module.exceptions.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(ex_names, vec!["A_Exception", "C_Exception"]);
    }
}
