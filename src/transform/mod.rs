// Configuration-driven model transform
//
// Applies, per module, in a fixed order: global class exclusion, per-module
// class exclusion, member exclusion patterns, function/typedef exclusion,
// byref reclassification, exception extraction, and finally the symbol
// availability filter. Later steps assume earlier exclusions already
// happened.

pub mod byref;
pub mod exclude;
pub mod exceptions;
pub mod symbols;

pub use symbols::SymbolTable;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::module::ModuleInfo;
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Compiled per-module exclusion rules
#[derive(Debug, Default)]
struct ModuleRules {
    exclude_classes: Vec<String>,
    exclude_methods: Vec<(Regex, Regex)>,
    exclude_functions: Vec<String>,
    exclude_typedefs: Vec<String>,
}

/// An immutable transform snapshot, compiled once from configuration and
/// shared by reference with every per-module worker
pub struct Transformer {
    global_class_excludes: Vec<Regex>,
    exception_patterns: Vec<Regex>,
    byref_types: BTreeSet<String>,
    module_rules: BTreeMap<String, ModuleRules>,
    symbols: Option<SymbolTable>,
}

impl Transformer {
    /// Compile the transform from configuration. With a platform selected,
    /// its exclusions are merged in and its symbol table is loaded; a
    /// missing symbol file is fatal for that platform.
    pub fn from_config(config: &Config, platform: Option<&str>) -> Result<Self> {
        let mut class_excludes = config.transform.exclude_classes.clone();
        let mut symbols = None;

        if let Some(name) = platform {
            let platform = config.platform(name)?;
            class_excludes.extend(platform.exclude_classes.iter().cloned());
            symbols = Some(SymbolTable::load(&platform.symbols)?);
        }

        let global_class_excludes = compile_all(&class_excludes)?;
        let exception_patterns = compile_all(&config.transform.exceptions)?;

        let mut byref_spellings = config.transform.byref_types.clone();
        byref_spellings.extend(config.transform.byref_types_smart_ptr.iter().cloned());
        let byref_types = byref::normalize_types(&byref_spellings);

        let mut module_rules = BTreeMap::new();
        for (name, module) in &config.modules {
            let mut rules = ModuleRules {
                exclude_classes: module.exclude_classes.clone(),
                exclude_functions: module.exclude_functions.clone(),
                exclude_typedefs: module.exclude_typedefs.clone(),
                ..Default::default()
            };
            for pattern in &module.exclude_methods {
                let (class_pat, method_pat) = pattern.split_once("::").ok_or_else(|| {
                    Error::config_validation(format!(
                        "module {name}: method exclusion '{pattern}' must be ClassRegex::MethodRegex"
                    ))
                })?;
                rules.exclude_methods.push((
                    exclude::compile_pattern(class_pat)
                        .map_err(|e| Error::pattern(class_pat, e.to_string()))?,
                    exclude::compile_pattern(method_pat)
                        .map_err(|e| Error::pattern(method_pat, e.to_string()))?,
                ));
            }
            module_rules.insert(name.clone(), rules);
        }

        Ok(Self {
            global_class_excludes,
            exception_patterns,
            byref_types,
            module_rules,
            symbols,
        })
    }

    /// Override the symbol table (test and tooling convenience)
    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = Some(symbols);
        self
    }

    /// Apply the full transform to one module, in the fixed step order
    pub fn transform_module(&self, module: &mut ModuleInfo) {
        exclude::exclude_classes_global(module, &self.global_class_excludes);

        let empty = ModuleRules::default();
        let rules = self.module_rules.get(&module.name).unwrap_or(&empty);

        exclude::exclude_classes_exact(module, &rules.exclude_classes);
        exclude::exclude_methods(module, &rules.exclude_methods);
        exclude::exclude_functions(module, &rules.exclude_functions);
        exclude::exclude_typedefs(module, &rules.exclude_typedefs);

        byref::reclassify_module(module, &self.byref_types);
        exceptions::extract_exceptions(module, &self.exception_patterns);

        if let Some(symbols) = &self.symbols {
            symbols::filter_module(module, symbols);
        }
    }

    /// Transform every module, one worker per module. The symbol table is
    /// read-only, so workers share it without synchronization.
    pub fn transform_all(&self, modules: &mut [ModuleInfo]) {
        modules
            .par_iter_mut()
            .for_each(|module| self.transform_module(module));
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| exclude::compile_pattern(p).map_err(|e| Error::pattern(p.clone(), e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleConfig;
    use crate::model::entities::{Argument, Class, Method};

    fn method(name: &str, mangled: Option<&str>) -> Method {
        let mut m = Method::new(name);
        m.mangled_name = mangled.map(str::to_string);
        m
    }

    fn sample_module() -> ModuleInfo {
        let mut foo = Class::new("Foo");
        foo.methods.push(method("Bar", Some("_ZN3Foo3BarEv")));
        foo.methods.push(method("Baz", Some("_ZN3Foo3BazEv")));
        let mut byref = method("GetValue", Some("_ZN3Foo8GetValueERd"));
        byref.args.push(Argument::new("v", "Standard_Real&"));
        foo.methods.push(byref);

        let mut excluded = Class::new("Handle_Foo");
        excluded.methods.push(method("Get", None));

        let exception = Class::new("Foo_Exception");

        ModuleInfo {
            name: "Foo".to_string(),
            classes: vec![foo, excluded, exception],
            ..Default::default()
        }
    }

    fn sample_config() -> Config {
        let mut config = Config::default();
        config.transform.exclude_classes = vec!["Handle_.*".to_string()];
        config.transform.exceptions = vec![".*_Exception".to_string()];
        config.transform.byref_types = vec!["Standard_Real".to_string()];
        config.modules.insert(
            "Foo".to_string(),
            ModuleConfig {
                exclude_methods: vec!["Foo::Baz".to_string()],
                ..Default::default()
            },
        );
        config
    }

    #[test]
    fn test_full_transform_order() {
        let mut module = sample_module();
        let transformer = Transformer::from_config(&sample_config(), None)
            .unwrap()
            .with_symbols(SymbolTable::from_names(vec![
                "_ZN3Foo3BarEv".to_string(),
                "_ZN3Foo8GetValueERd".to_string(),
            ]));

        transformer.transform_module(&mut module);

        // Handle_Foo excluded globally, Foo_Exception re-filed
        let names: Vec<&str> = module.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Foo"]);
        assert_eq!(module.exceptions.len(), 1);

        let foo = &module.classes[0];
        // Baz excluded by pattern, GetValue moved to byref, Bar retained
        assert_eq!(foo.methods.len(), 1);
        assert_eq!(foo.methods[0].name, "Bar");
        assert_eq!(foo.methods_byref.len(), 1);
        assert_eq!(foo.methods_byref[0].name, "GetValue");
    }

    #[test]
    fn test_byref_never_in_methods_and_exactly_once_in_byref() {
        let mut module = sample_module();
        let transformer = Transformer::from_config(&sample_config(), None).unwrap();
        transformer.transform_module(&mut module);

        let foo = module.classes.iter().find(|c| c.name == "Foo").unwrap();
        assert!(foo.methods.iter().all(|m| m.name != "GetValue"));
        assert_eq!(
            foo.methods_byref
                .iter()
                .filter(|m| m.name == "GetValue")
                .count(),
            1
        );
    }

    #[test]
    fn test_transform_deterministic() {
        let transformer = Transformer::from_config(&sample_config(), None)
            .unwrap()
            .with_symbols(SymbolTable::from_names(vec!["_ZN3Foo3BarEv".to_string()]));

        let mut first = sample_module();
        let mut second = sample_module();
        transformer.transform_module(&mut first);
        transformer.transform_module(&mut second);

        let a = serde_json::to_string(&first).unwrap();
        let b = serde_json::to_string(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_transform_all_matches_sequential() {
        let transformer = Transformer::from_config(&sample_config(), None).unwrap();

        let mut parallel = vec![sample_module(), sample_module()];
        transformer.transform_all(&mut parallel);

        let mut sequential = sample_module();
        transformer.transform_module(&mut sequential);

        assert_eq!(parallel[0], sequential);
        assert_eq!(parallel[1], sequential);
    }

    #[test]
    fn test_without_symbols_filter_skipped() {
        let mut module = sample_module();
        let transformer = Transformer::from_config(&sample_config(), None).unwrap();
        transformer.transform_module(&mut module);

        // Bar has no matching table but survives since no platform table
        // was loaded
        let foo = module.classes.iter().find(|c| c.name == "Foo").unwrap();
        assert!(foo.methods.iter().any(|m| m.name == "Bar"));
        assert!(foo.unfiltered.is_none());
    }

    #[test]
    fn test_missing_symbol_file_is_fatal() {
        let mut config = sample_config();
        config.platforms.insert(
            "linux".to_string(),
            crate::config::PlatformConfig {
                symbols: "/nonexistent/symbols.txt".into(),
                ..Default::default()
            },
        );

        let result = Transformer::from_config(&config, Some("linux"));
        assert!(matches!(result, Err(Error::SymbolTable { .. })));
    }

    #[test]
    fn test_unknown_platform_is_fatal() {
        let result = Transformer::from_config(&sample_config(), Some("beos"));
        assert!(matches!(result, Err(Error::UnknownPlatform(_))));
    }
}
