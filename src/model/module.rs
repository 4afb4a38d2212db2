// Module assembly: headers sharing a name prefix become one generation unit
//
// Classes seen from several headers of the same module are merged by
// concatenation (first-seen header first). Include-derived header
// dependencies are mapped to module names and filtered to modules that
// actually exist in this run.

use crate::config::ModuleNaming;
use crate::model::entities::{Class, ClassTemplate, Enum, Function, Typedef};
use crate::model::header::{ancestor_chain, root_ancestors, HeaderInfo};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The merged result of one module's headers
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleInfo {
    pub name: String,
    pub headers: Vec<HeaderInfo>,
    pub classes: Vec<Class>,
    pub class_templates: Vec<ClassTemplate>,
    pub enums: Vec<Enum>,
    pub functions: Vec<Function>,
    pub operators: Vec<Function>,
    pub typedefs: Vec<Typedef>,
    /// Classes re-filed as exception-like by the transform
    pub exceptions: Vec<Class>,
    /// Pre-filter snapshots kept by the symbol availability filter
    pub unfiltered_functions: Vec<Function>,
    pub unfiltered_operators: Vec<Function>,
    /// Entity name to defining module
    pub class_dict: BTreeMap<String, String>,
    pub typedef_dict: BTreeMap<String, String>,
    pub enum_dict: BTreeMap<String, String>,
    /// Names of other modules this one depends on
    pub dependencies: BTreeSet<String>,
}

impl ModuleInfo {
    /// Assemble a module from its extracted headers.
    ///
    /// Output is a pure function of the merged header contents; header order
    /// only matters through the documented first-seen-wins merge.
    pub fn assemble(
        name: &str,
        headers: Vec<HeaderInfo>,
        known_modules: &BTreeSet<String>,
        naming: ModuleNaming,
    ) -> Self {
        let mut module = ModuleInfo {
            name: name.to_string(),
            ..Default::default()
        };

        let mut class_index: BTreeMap<String, usize> = BTreeMap::new();
        let mut template_index: BTreeMap<String, usize> = BTreeMap::new();
        let mut inheritance: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for header in &headers {
            for (class_name, bases) in &header.inheritance {
                let entry = inheritance.entry(class_name.clone()).or_default();
                for base in bases {
                    if !entry.contains(base) {
                        entry.push(base.clone());
                    }
                }
            }

            for class in header.classes.iter().cloned() {
                match class_index.get(&class.name) {
                    Some(&i) => module.classes[i].merge_from(class),
                    None => {
                        class_index.insert(class.name.clone(), module.classes.len());
                        module.classes.push(class);
                    }
                }
            }

            for template in header.class_templates.iter().cloned() {
                match template_index.get(&template.class.name) {
                    Some(&i) => module.class_templates[i].class.merge_from(template.class),
                    None => {
                        template_index
                            .insert(template.class.name.clone(), module.class_templates.len());
                        module.class_templates.push(template);
                    }
                }
            }

            module.enums.extend(header.enums.iter().cloned());
            module.functions.extend(header.functions.iter().cloned());
            module.operators.extend(header.operators.iter().cloned());
            module.typedefs.extend(header.typedefs.iter().cloned());

            for dep in &header.dependencies {
                let dep_module = naming.module_name(dep);
                if dep_module != name && known_modules.contains(&dep_module) {
                    module.dependencies.insert(dep_module);
                }
            }
        }

        // Re-resolve ancestry against the merged module-wide view
        for class in module
            .classes
            .iter_mut()
            .chain(module.class_templates.iter_mut().map(|t| &mut t.class))
        {
            class.superclasses = ancestor_chain(&class.name, &inheritance);
            class.rootclass = root_ancestors(&class.superclasses, &inheritance);
            class.update_abstract();
        }

        for class in &module.classes {
            module.class_dict.insert(class.name.clone(), name.to_string());
        }
        for template in &module.class_templates {
            module
                .class_dict
                .insert(template.class.name.clone(), name.to_string());
        }
        for td in &module.typedefs {
            module.typedef_dict.insert(td.name.clone(), name.to_string());
        }
        for e in module.enums.iter().filter(|e| !e.is_anonymous) {
            module.enum_dict.insert(e.name.clone(), name.to_string());
        }

        module.headers = headers;
        module
    }

    /// Iterate classes and the classes inside templates
    pub fn all_classes(&self) -> impl Iterator<Item = &Class> {
        self.classes
            .iter()
            .chain(self.class_templates.iter().map(|t| &t.class))
    }
}
