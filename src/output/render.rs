// Artifact emission: one glue source per module plus project files
//
// The model handed in is already filtered and topologically sorted; this
// stage only walks it in order and writes text.

use crate::config::Config;
use crate::error::Result;
use crate::model::ModelResult;
use crate::output::templates::TemplateEngine;
use std::path::PathBuf;

/// Renderer settings
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub output_dir: PathBuf,
    pub project_name: String,
    pub include_pre: String,
    pub include_post: String,
    /// Wipe prior output before generating
    pub clean: bool,
}

impl RenderConfig {
    /// Pull the renderer settings out of the main configuration
    pub fn from_config(config: &Config, clean: bool) -> Self {
        Self {
            output_dir: config.output.folder.clone(),
            project_name: config.project.name.clone(),
            include_pre: config.extras.include_pre.clone(),
            include_post: config.extras.include_post.clone(),
            clean,
        }
    }
}

/// Emits the generated wrapper sources
pub struct Renderer {
    engine: TemplateEngine,
    config: RenderConfig,
}

/// What a generation run wrote
#[derive(Debug, Default)]
pub struct RenderReport {
    pub files: Vec<PathBuf>,
}

impl RenderReport {
    pub fn summary(&self) -> String {
        format!("Generated {} files", self.files.len())
    }
}

impl Renderer {
    /// Create a renderer from the main configuration
    pub fn from_config(config: &Config, clean: bool) -> Result<Self> {
        Ok(Self {
            engine: TemplateEngine::new(config.operators.clone())?,
            config: RenderConfig::from_config(config, clean),
        })
    }

    /// Emit one `<module>.cpp` per module, in the order the model carries,
    /// plus the project entry point and build description
    pub fn generate(&self, model: &ModelResult) -> Result<RenderReport> {
        let out = &self.config.output_dir;

        if self.config.clean && out.exists() {
            std::fs::remove_dir_all(out)?;
        }
        std::fs::create_dir_all(out)?;

        let mut report = RenderReport::default();

        for module in &model.modules {
            let rendered = self.engine.render_module(
                module,
                &model.class_dict,
                &self.config.project_name,
                &self.config.include_pre,
                &self.config.include_post,
            )?;
            let path = out.join(format!("{}.cpp", module.name));
            std::fs::write(&path, rendered)?;
            report.files.push(path);
        }

        let module_names: Vec<String> = model.modules.iter().map(|m| m.name.clone()).collect();

        let main = self
            .engine
            .render_main(&module_names, &self.config.project_name)?;
        let main_path = out.join("main.cpp");
        std::fs::write(&main_path, main)?;
        report.files.push(main_path);

        let build = self
            .engine
            .render_build(&module_names, &self.config.project_name)?;
        let build_path = out.join("CMakeLists.txt");
        std::fs::write(&build_path, build)?;
        report.files.push(build_path);

        Ok(report)
    }
}
