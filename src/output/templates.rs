// Template engine for emitting wrapper glue
//
// Wraps Tera with the embedded glue templates and the custom filters the
// templates rely on. The engine receives finalized, sorted data only; it
// never reshapes the model.

use crate::error::Result;
use crate::model::module::ModuleInfo;
use std::collections::{BTreeMap, HashMap};
use tera::{Context, Tera, Value};

/// Template engine wrapping Tera with embedded templates
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create the engine; `operators` maps C++ operator spellings to
    /// wrapper names (e.g. `operator+` to `add`)
    pub fn new(operators: BTreeMap<String, String>) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("module.cpp", include_str!("../../templates/module.cpp.tera")),
            ("main.cpp", include_str!("../../templates/main.cpp.tera")),
            (
                "CMakeLists.txt",
                include_str!("../../templates/CMakeLists.txt.tera"),
            ),
        ])?;

        tera.register_filter("sanitize", sanitize_filter);
        tera.register_filter("wrapper_name", wrapper_name_filter(operators));

        Ok(Self { tera })
    }

    /// Render one module's glue source
    pub fn render_module(
        &self,
        module: &ModuleInfo,
        class_dict: &BTreeMap<String, String>,
        project_name: &str,
        include_pre: &str,
        include_post: &str,
    ) -> Result<String> {
        let mut context = Context::new();
        context.insert("module", module);
        context.insert("class_dict", class_dict);
        context.insert("project_name", project_name);
        context.insert("include_pre", include_pre);
        context.insert("include_post", include_post);

        Ok(self.tera.render("module.cpp", &context)?)
    }

    /// Render the whole-project entry point
    pub fn render_main(&self, module_names: &[String], project_name: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("modules", module_names);
        context.insert("project_name", project_name);

        Ok(self.tera.render("main.cpp", &context)?)
    }

    /// Render the build-description file
    pub fn render_build(&self, module_names: &[String], project_name: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("modules", module_names);
        context.insert("project_name", project_name);

        Ok(self.tera.render("CMakeLists.txt", &context)?)
    }

    /// Render a custom template with context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Filter mapping an operator spelling to its configured wrapper name,
/// falling back to a sanitized identifier
fn wrapper_name_filter(
    operators: BTreeMap<String, String>,
) -> impl Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync + 'static {
    move |value: &Value, _args: &HashMap<String, Value>| {
        let name = value.as_str().unwrap_or("");
        match operators.get(name) {
            Some(mapped) => Ok(Value::String(mapped.clone())),
            None => Ok(Value::String(sanitize_identifier(name))),
        }
    }
}

/// Filter exposing identifier sanitizing to templates
fn sanitize_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(sanitize_identifier(
        value.as_str().unwrap_or(""),
    )))
}

/// Turn a C++ member name into a usable wrapper identifier
pub fn sanitize_identifier(name: &str) -> String {
    let mut result = if let Some(op) = name.strip_prefix("operator") {
        match op.trim() {
            "=" => "assign".to_string(),
            "==" => "eq".to_string(),
            "!=" => "ne".to_string(),
            "<" => "lt".to_string(),
            ">" => "gt".to_string(),
            "<=" => "le".to_string(),
            ">=" => "ge".to_string(),
            "+" => "add".to_string(),
            "-" => "sub".to_string(),
            "*" => "mul".to_string(),
            "/" => "div".to_string(),
            "[]" => "getitem".to_string(),
            "()" => "call".to_string(),
            other => format!("op_{}", other),
        }
    } else {
        name.to_string()
    };

    result = result
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if result.is_empty() {
        result = "_unnamed".to_string();
    }

    result
}
