// Model building: header discovery, parallel extraction, module assembly
//
// Modules are embarrassingly parallel here: one worker per module, each
// owning its module's data until it returns a completed ModuleInfo. Results
// are joined into the global dictionaries only after all workers complete.

pub mod entities;
pub mod header;
pub mod module;

pub use entities::*;
pub use header::{extract_header, HeaderInfo};
pub use module::ModuleInfo;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::{CppParser, HeaderParser, ParserContext};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The joined result of building the raw model
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ModelResult {
    pub modules: Vec<ModuleInfo>,
    /// Class name to defining module, across the whole run
    pub class_dict: BTreeMap<String, String>,
    pub typedef_dict: BTreeMap<String, String>,
    pub enum_dict: BTreeMap<String, String>,
}

impl ModelResult {
    /// Write the model as a JSON artifact
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a model artifact back
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Builds the raw model from a header tree
pub struct Generator {
    config: Config,
    context: ParserContext,
    verbose: bool,
}

impl Generator {
    /// Create a generator; the parser context is constructed once here and
    /// shared with every worker
    pub fn new(config: Config, platform: Option<&str>) -> Result<Self> {
        let context = ParserContext::from_config(&config, platform)?;
        Ok(Self {
            config,
            context,
            verbose: false,
        })
    }

    /// Create a generator with verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Discover header files under the configured input folder
    pub fn discover_headers(&self) -> Result<Vec<PathBuf>> {
        let root = &self.config.input.folder;
        if !root.exists() {
            return Err(Error::PathNotFound(root.clone()));
        }

        let include: Vec<glob::Pattern> = self
            .config
            .input
            .include
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<_, _>>()?;
        let exclude: Vec<glob::Pattern> = self
            .config
            .input
            .exclude
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<_, _>>()?;

        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if !include.iter().any(|p| p.matches(&name)) {
                continue;
            }
            if exclude.iter().any(|p| p.matches(&name)) {
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Module names derived from the discovered headers, sorted
    pub fn module_names(&self, files: &[PathBuf]) -> Vec<String> {
        let names: BTreeSet<String> = files
            .iter()
            .map(|f| self.config.input.module_naming.module_name(f))
            .filter(|n| !n.is_empty())
            .collect();
        names.into_iter().collect()
    }

    /// Parse all headers and assemble the raw model.
    ///
    /// A header that cannot be read or parsed fails the run: module
    /// dependency order cannot be computed from incomplete data.
    pub fn build_model(&self) -> Result<ModelResult> {
        let files = self.discover_headers()?;
        if files.is_empty() {
            return Err(Error::extraction("No header files found"));
        }

        let module_names = self.module_names(&files);
        let known: BTreeSet<String> = module_names.iter().cloned().collect();

        let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for file in &files {
            let name = self.config.input.module_naming.module_name(file);
            if !name.is_empty() {
                groups.entry(name).or_default().push(file.clone());
            }
        }

        let progress = if self.verbose {
            let pb = ProgressBar::new(groups.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let naming = self.config.input.module_naming;
        let groups: Vec<(String, Vec<PathBuf>)> = groups.into_iter().collect();

        // One worker per module; each owns its module's data exclusively
        // until it returns
        let mut modules: Vec<ModuleInfo> = groups
            .par_iter()
            .map(|(name, paths)| {
                let parser = CppParser::new(self.context.clone());
                let mut headers = Vec::new();
                for path in paths {
                    let tu = parser.parse_header(path)?;
                    headers.push(extract_header(&tu));
                }

                if let Some(pb) = &progress {
                    pb.set_message(name.clone());
                    pb.inc(1);
                }

                Ok(ModuleInfo::assemble(name, headers, &known, naming))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(pb) = progress {
            pb.finish_with_message("Extraction complete");
        }

        // Simple join after all workers completed
        let mut result = ModelResult::default();
        for module in &modules {
            result.class_dict.extend(module.class_dict.clone());
            result.typedef_dict.extend(module.typedef_dict.clone());
            result.enum_dict.extend(module.enum_dict.clone());
        }

        resolve_global_ancestry(&mut modules);
        result.modules = modules;

        Ok(result)
    }

    /// Number of discovered headers, for reporting
    pub fn header_count(&self) -> Result<usize> {
        self.discover_headers().map(|f| f.len())
    }
}

/// Re-resolve ancestor chains against the merged cross-module view, so
/// ancestry spanning modules is visible to the later transform stages
pub fn resolve_global_ancestry(modules: &mut [ModuleInfo]) {
    let mut inheritance: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for module in modules.iter() {
        for class in module.all_classes() {
            inheritance
                .entry(class.name.clone())
                .or_default()
                .extend(class.superclass.iter().cloned());
        }
    }

    for module in modules.iter_mut() {
        for class in module
            .classes
            .iter_mut()
            .chain(module.class_templates.iter_mut().map(|t| &mut t.class))
        {
            class.superclasses = header::ancestor_chain(&class.name, &inheritance);
            class.rootclass = header::root_ancestors(&class.superclasses, &inheritance);
        }
    }
}
