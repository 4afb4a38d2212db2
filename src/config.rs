use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub transform: TransformConfig,
    /// Operator spelling to wrapper-name map (e.g. "operator+" -> "add")
    pub operators: BTreeMap<String, String>,
    pub extras: ExtrasConfig,
    /// Per-module settings keyed by module name
    pub modules: BTreeMap<String, ModuleConfig>,
    /// Per-platform settings keyed by platform name
    pub platforms: BTreeMap<String, PlatformConfig>,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    pub version: Option<String>,
}

/// Input settings: where the headers live and how they map to modules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub folder: PathBuf,
    /// Glob patterns selecting header files
    pub include: Vec<String>,
    /// Glob patterns excluding header files
    pub exclude: Vec<String>,
    /// Strategy mapping a header filename to its module name
    pub module_naming: ModuleNaming,
    /// Extra include directories handed to the parser
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor defines handed to the parser
    pub defines: Vec<String>,
    /// Source text prepended to every header before parsing
    pub parsing_header: String,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub folder: PathBuf,
}

/// Model transform settings applied to every module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Regex patterns removing classes platform-wide
    pub exclude_classes: Vec<String>,
    /// Regex patterns identifying exception classes by name or ancestor
    pub exceptions: Vec<String>,
    /// Types returned through an out-argument instead of the return channel
    pub byref_types: Vec<String>,
    /// Smart-pointer types treated the same way
    pub byref_types_smart_ptr: Vec<String>,
}

/// Extra text snippets passed through to the renderer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrasConfig {
    pub include_pre: String,
    pub include_post: String,
}

/// Per-module exclusion lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Exact class names to drop
    pub exclude_classes: Vec<String>,
    /// `ClassRegex::MethodRegex` patterns removing members
    pub exclude_methods: Vec<String>,
    /// Exact free-function names to drop
    pub exclude_functions: Vec<String>,
    /// Exact typedef names to drop
    pub exclude_typedefs: Vec<String>,
}

/// Per-platform settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Path to the nm-style symbol listing for this platform
    pub symbols: PathBuf,
    /// Modules generated on this platform (empty means all)
    pub modules: Vec<String>,
    /// Extra class exclusion regexes merged into the global list
    pub exclude_classes: Vec<String>,
    /// Platform-specific include directories
    pub include_dirs: Vec<PathBuf>,
    /// Platform-specific preprocessor defines
    pub defines: Vec<String>,
    /// Platform-specific parsing preamble
    pub parsing_header: String,
}

/// Strategy deriving a module name from a header path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleNaming {
    /// `gp_Ax1.hxx` -> `gp`
    #[default]
    PrefixBeforeUnderscore,
    /// `gp_Ax1.hxx` -> `gp_Ax1`
    FileStem,
    /// `include/gp/Ax1.hxx` -> `gp`
    ParentDirectory,
}

impl ModuleNaming {
    /// Derive the module name for a header path
    pub fn module_name(&self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        match self {
            ModuleNaming::PrefixBeforeUnderscore => stem
                .split('_')
                .next()
                .unwrap_or_default()
                .to_string(),
            ModuleNaming::FileStem => stem,
            ModuleNaming::ParentDirectory => path
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or(stem),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "wrapper".to_string(),
            version: None,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            include: vec!["*.hxx".to_string()],
            exclude: vec![],
            module_naming: ModuleNaming::default(),
            include_dirs: vec![],
            defines: vec!["__CODE_GENERATOR__".to_string()],
            parsing_header: String::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("./generated"),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, output: Option<PathBuf>, include: Vec<String>) {
        if let Some(out) = output {
            self.output.folder = out;
        }

        if !include.is_empty() {
            self.input.include = include;
        }
    }

    /// Validate configuration; fails fast before any module processing
    pub fn validate(&self) -> Result<()> {
        if self.project.name.is_empty() {
            return Err(Error::config_validation("project name must not be empty"));
        }

        if self.input.include.is_empty() {
            return Err(Error::config_validation(
                "at least one include pattern required",
            ));
        }

        for pattern in self
            .transform
            .exclude_classes
            .iter()
            .chain(self.transform.exceptions.iter())
            .chain(self.platforms.values().flat_map(|p| p.exclude_classes.iter()))
        {
            regex::Regex::new(pattern)
                .map_err(|e| Error::pattern(pattern.clone(), e.to_string()))?;
        }

        for (name, module) in &self.modules {
            for pattern in &module.exclude_methods {
                let Some((class_pat, method_pat)) = pattern.split_once("::") else {
                    return Err(Error::config_validation(format!(
                        "module {name}: method exclusion '{pattern}' must be ClassRegex::MethodRegex"
                    )));
                };
                regex::Regex::new(class_pat)
                    .map_err(|e| Error::pattern(class_pat, e.to_string()))?;
                regex::Regex::new(method_pat)
                    .map_err(|e| Error::pattern(method_pat, e.to_string()))?;
            }
        }

        for (name, platform) in &self.platforms {
            if platform.symbols.as_os_str().is_empty() {
                return Err(Error::config_validation(format!(
                    "platform {name}: symbols path is required"
                )));
            }
        }

        Ok(())
    }

    /// Look up a platform section by name
    pub fn platform(&self, name: &str) -> Result<&PlatformConfig> {
        self.platforms
            .get(name)
            .ok_or_else(|| Error::UnknownPlatform(name.to_string()))
    }

    /// Per-module settings, falling back to the empty defaults
    pub fn module(&self, name: &str) -> ModuleConfig {
        self.modules.get(name).cloned().unwrap_or_default()
    }
}
