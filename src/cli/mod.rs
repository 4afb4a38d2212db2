//! CLI dispatch for bindsmith

mod args;

pub use args::{Args, Command};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::graph;
use crate::model::{Generator, ModelResult};
use crate::output::Renderer;
use crate::parser::{CppParser, ParserContext};
use crate::transform::Transformer;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    if let Some(n) = args.njobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| Error::other(format!("Failed to set worker count: {}", e)))?;
    }

    let platform = args.platform.as_deref();

    match args.command {
        Command::Parse { config, output } => {
            let cfg = Config::load(&config)?;
            let model = parse_stage(&cfg, platform, args.verbose)?;
            model.save(&output)?;
            println!("Model written to: {}", output.display());
            Ok(())
        }

        Command::Transform {
            config,
            input,
            output,
        } => {
            let cfg = Config::load(&config)?;
            let mut model = ModelResult::load(&input)?;
            transform_stage(&cfg, platform, &mut model)?;
            model.save(&output)?;
            println!("Transformed model written to: {}", output.display());
            Ok(())
        }

        Command::Generate { config, input } => {
            let cfg = Config::load(&config)?;
            let mut model = ModelResult::load(&input)?;
            generate_stage(&cfg, &mut model, args.clean)?;
            Ok(())
        }

        Command::Validate { config, folder } => {
            let cfg = Config::load(&config)?;
            validate_stage(&cfg, platform, &folder, args.verbose)
        }

        Command::All { config } => {
            let cfg = Config::load(&config)?;
            let mut model = parse_stage(&cfg, platform, args.verbose)?;
            transform_stage(&cfg, platform, &mut model)?;
            generate_stage(&cfg, &mut model, args.clean)?;
            Ok(())
        }
    }
}

/// Discover, extract and assemble the raw model
fn parse_stage(cfg: &Config, platform: Option<&str>, verbose: bool) -> Result<ModelResult> {
    let generator = Generator::new(cfg.clone(), platform)?.with_verbose(verbose);

    println!("Discovering headers...");
    let count = generator.header_count()?;
    println!("Found {} headers", count);

    if verbose {
        println!("Input: {}", cfg.input.folder.display());
        println!("Include: {:?}", cfg.input.include);
        if let Some(p) = platform {
            println!("Platform: {}", p);
        }
    }

    println!("Building model...");
    let model = generator.build_model()?;

    let classes: usize = model.modules.iter().map(|m| m.classes.len()).sum();
    let functions: usize = model.modules.iter().map(|m| m.functions.len()).sum();
    println!(
        "Model complete: {} modules, {} classes, {} functions",
        model.modules.len(),
        classes,
        functions
    );

    Ok(model)
}

/// Apply the fixed-order transform, restricted to the platform's module set
fn transform_stage(cfg: &Config, platform: Option<&str>, model: &mut ModelResult) -> Result<()> {
    if let Some(name) = platform {
        let selected = &cfg.platform(name)?.modules;
        if !selected.is_empty() {
            model.modules.retain(|m| selected.contains(&m.name));
        }
    }

    println!("Transforming {} modules...", model.modules.len());
    let transformer = Transformer::from_config(cfg, platform)?;
    transformer.transform_all(&mut model.modules);
    Ok(())
}

/// Sort the model and emit the wrapper sources
fn generate_stage(cfg: &Config, model: &mut ModelResult, clean: bool) -> Result<()> {
    println!("Sorting dependency graphs...");
    for module in &mut model.modules {
        graph::sort_module_classes(module)?;
    }
    graph::sort_modules(&mut model.modules, &model.class_dict, &model.typedef_dict)?;

    println!("Generating wrapper sources...");
    let renderer = Renderer::from_config(cfg, clean)?;
    let report = renderer.generate(model)?;

    println!("{}", report.summary());
    println!("Output written to: {}", cfg.output.folder.display());
    Ok(())
}

/// Re-parse every generated source and report OK/NOK per file
fn validate_stage(
    cfg: &Config,
    platform: Option<&str>,
    folder: &Path,
    verbose: bool,
) -> Result<()> {
    if !folder.exists() {
        return Err(Error::PathNotFound(folder.to_path_buf()));
    }

    let mut sources: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "cpp").unwrap_or(false))
        .collect();
    sources.sort();

    let context = ParserContext::from_config(cfg, platform)?;
    let results: Vec<(PathBuf, usize)> = sources
        .par_iter()
        .map(|path| {
            let parser = CppParser::new(context.clone());
            let source = std::fs::read_to_string(path)?;
            Ok((path.clone(), parser.error_count(&source)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut failures = 0;
    for (path, errors) in &results {
        if *errors > 0 {
            failures += 1;
            println!("Validation {}: NOK ({} errors)", path.display(), errors);
        } else if verbose {
            println!("Validation {}: OK", path.display());
        }
    }

    println!(
        "Validated {} files, {} with errors",
        results.len(),
        failures
    );
    Ok(())
}
