// Parser capability consumed by the extractor
//
// The pipeline never queries a parser library directly. A `HeaderParser`
// turns one header file into an owned `TranslationUnit` snapshot; the
// `ParserContext` carries the compiler-flag-like inputs and is created once
// at startup, then shared by reference with every worker.

pub mod cpp;
pub mod decl;
pub mod mangle;

pub use cpp::CppParser;
pub use decl::{Access, BaseSpecifier, Decl, DeclKind, Location, ParamDecl};

use crate::config::Config;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compiler-flag-like context for parsing headers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserContext {
    /// Include search directories
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor defines
    pub defines: Vec<String>,
    /// Source text prepended to every header before parsing
    pub preamble: String,
}

impl ParserContext {
    /// Build the context from configuration, layering platform settings on top
    pub fn from_config(config: &Config, platform: Option<&str>) -> Result<Self> {
        let mut ctx = Self {
            include_dirs: config.input.include_dirs.clone(),
            defines: config.input.defines.clone(),
            preamble: config.input.parsing_header.clone(),
        };

        if let Some(name) = platform {
            let platform = config.platform(name)?;
            ctx.include_dirs.extend(platform.include_dirs.iter().cloned());
            ctx.defines.extend(platform.defines.iter().cloned());
            if !platform.parsing_header.is_empty() {
                ctx.preamble.push('\n');
                ctx.preamble.push_str(&platform.parsing_header);
            }
        }

        Ok(ctx)
    }
}

/// Parsed snapshot of one header file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Path of the parsed header
    pub path: PathBuf,
    /// Files referenced by the header's preprocessor includes
    pub includes: Vec<PathBuf>,
    /// Top-level declarations
    pub decls: Vec<Decl>,
}

impl TranslationUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            includes: Vec::new(),
            decls: Vec::new(),
        }
    }
}

/// A parser integration that can turn header files into declaration trees
pub trait HeaderParser {
    /// Parse one header; declaration-level breakage must be recovered by
    /// skipping the declaration, not by failing the whole header
    fn parse_header(&self, path: &Path) -> Result<TranslationUnit>;
}
