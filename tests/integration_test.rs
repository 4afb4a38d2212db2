// Integration tests for bindsmith

use bindsmith::config::{Config, ModuleConfig, PlatformConfig};
use bindsmith::graph;
use bindsmith::model::{Generator, ModelResult};
use bindsmith::output::Renderer;
use bindsmith::transform::{SymbolTable, Transformer};
use std::fs;
use tempfile::TempDir;

/// Build a small synthetic header tree: a Standard module with typedefs and
/// an exception, and a gp module deriving from it
fn create_header_tree() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::write(
        dir.path().join("Standard_TypeDef.hxx"),
        r#"
typedef double Standard_Real;
typedef int Standard_Integer;
"#,
    )
    .unwrap();

    fs::write(
        dir.path().join("Standard_Failure.hxx"),
        r#"
#include "Standard_TypeDef.hxx"
class Standard_Failure {
public:
    Standard_Failure();
};
"#,
    )
    .unwrap();

    fs::write(
        dir.path().join("Standard_DomainError.hxx"),
        r#"
#include "Standard_Failure.hxx"
class Standard_DomainError : public Standard_Failure {
public:
    Standard_DomainError();
};
"#,
    )
    .unwrap();

    fs::write(
        dir.path().join("gp_Pnt.hxx"),
        r#"
#include "Standard_TypeDef.hxx"
class gp_Pnt {
public:
    gp_Pnt();
    double X() const;
    void Coord(Standard_Real& X, Standard_Real& Y, Standard_Real& Z);
};
"#,
    )
    .unwrap();

    fs::write(
        dir.path().join("gp_Ax1.hxx"),
        r#"
#include "gp_Pnt.hxx"
class gp_Ax1 {
public:
    gp_Ax1();
    void SetLocation(gp_Pnt P = gp_Pnt());
    void DumpJson();
};
"#,
    )
    .unwrap();

    dir
}

fn config_for(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.project.name = "OCP".to_string();
    config.input.folder = dir.path().to_path_buf();
    config.input.include = vec!["*.hxx".to_string()];
    config.output.folder = dir.path().join("out");
    config.transform.exceptions = vec!["Standard_Failure".to_string()];
    config.transform.byref_types = vec!["Standard_Real".to_string()];
    config.modules.insert(
        "gp".to_string(),
        ModuleConfig {
            exclude_methods: vec!["gp_.*::Dump.*".to_string()],
            ..Default::default()
        },
    );
    config
}

#[test]
fn test_parse_builds_expected_modules() {
    let dir = create_header_tree();
    let generator = Generator::new(config_for(&dir), None).expect("generator");

    let model = generator.build_model().expect("model");

    let names: Vec<&str> = model.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Standard", "gp"]);

    let gp = model.modules.iter().find(|m| m.name == "gp").unwrap();
    assert_eq!(gp.classes.len(), 2);
    assert!(gp.dependencies.contains("Standard"));
    assert_eq!(model.class_dict.get("gp_Pnt").unwrap(), "gp");
    assert_eq!(model.typedef_dict.get("Standard_Real").unwrap(), "Standard");
}

#[test]
fn test_cross_module_ancestry_resolved() {
    let dir = create_header_tree();
    let generator = Generator::new(config_for(&dir), None).expect("generator");
    let model = generator.build_model().expect("model");

    let standard = model.modules.iter().find(|m| m.name == "Standard").unwrap();
    let derived = standard
        .classes
        .iter()
        .find(|c| c.name == "Standard_DomainError")
        .expect("Standard_DomainError");
    assert_eq!(derived.superclasses, vec!["Standard_Failure"]);
    assert_eq!(derived.rootclass, vec!["Standard_Failure"]);
}

#[test]
fn test_transform_applies_fixed_order_rules() {
    let dir = create_header_tree();
    let config = config_for(&dir);
    let generator = Generator::new(config.clone(), None).expect("generator");
    let mut model = generator.build_model().expect("model");

    let transformer = Transformer::from_config(&config, None).expect("transformer");
    transformer.transform_all(&mut model.modules);

    let gp = model.modules.iter().find(|m| m.name == "gp").unwrap();
    let pnt = gp.classes.iter().find(|c| c.name == "gp_Pnt").unwrap();

    // Byref reclassification: Coord moved, X stays
    assert!(pnt.methods.iter().all(|m| m.name != "Coord"));
    assert_eq!(pnt.methods_byref.len(), 1);
    assert_eq!(pnt.methods_byref[0].name, "Coord");
    assert!(pnt.methods.iter().any(|m| m.name == "X"));

    // Method exclusion pattern removed DumpJson from gp_Ax1
    let ax1 = gp.classes.iter().find(|c| c.name == "gp_Ax1").unwrap();
    assert!(ax1.methods.iter().all(|m| m.name != "DumpJson"));

    // Exception extraction by name and by ancestry
    let standard = model.modules.iter().find(|m| m.name == "Standard").unwrap();
    assert!(standard.classes.is_empty());
    let exception_names: Vec<&str> = standard
        .exceptions
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert!(exception_names.contains(&"Standard_Failure"));
    assert!(exception_names.contains(&"Standard_DomainError"));
}

#[test]
fn test_symbol_filter_with_platform_table() {
    let dir = create_header_tree();
    let mut config = config_for(&dir);

    // Only gp_Pnt's constructor and X are compiled into the artifact
    let symbols = dir.path().join("symbols.txt");
    fs::write(
        &symbols,
        "0000000000401000 T _ZN6gp_PntC1Ev\n0000000000401040 T _ZNK6gp_Pnt1XEv\n",
    )
    .unwrap();
    config.platforms.insert(
        "linux".to_string(),
        PlatformConfig {
            symbols,
            ..Default::default()
        },
    );

    let generator = Generator::new(config.clone(), None).expect("generator");
    let mut model = generator.build_model().expect("model");

    let transformer = Transformer::from_config(&config, Some("linux")).expect("transformer");
    transformer.transform_all(&mut model.modules);

    let gp = model.modules.iter().find(|m| m.name == "gp").unwrap();
    let pnt = gp.classes.iter().find(|c| c.name == "gp_Pnt").unwrap();

    assert!(pnt.methods.iter().any(|m| m.name == "X"));
    assert_eq!(pnt.constructors.len(), 1);

    // Everything removed stays visible in the unfiltered snapshot
    let unfiltered = pnt.unfiltered.as_ref().expect("unfiltered snapshot");
    assert!(unfiltered.methods.len() >= pnt.methods.len());

    // gp_Ax1 had no symbols at all
    let ax1 = gp.classes.iter().find(|c| c.name == "gp_Ax1").unwrap();
    assert!(ax1.methods.is_empty());
    assert!(ax1.unfiltered.as_ref().unwrap().methods.len() > 0);
}

#[test]
fn test_generate_emits_sorted_sources() {
    let dir = create_header_tree();
    let config = config_for(&dir);
    let generator = Generator::new(config.clone(), None).expect("generator");
    let mut model = generator.build_model().expect("model");

    let transformer = Transformer::from_config(&config, None).expect("transformer");
    transformer.transform_all(&mut model.modules);

    for module in &mut model.modules {
        graph::sort_module_classes(module).expect("class sort");
    }
    graph::sort_modules(&mut model.modules, &model.class_dict, &model.typedef_dict)
        .expect("module sort");

    let renderer = Renderer::from_config(&config, false).expect("renderer");
    let report = renderer.generate(&model).expect("generate");

    // One source per module plus entry point and build file
    assert_eq!(report.files.len(), model.modules.len() + 2);
    assert!(config.output.folder.join("gp.cpp").exists());
    assert!(config.output.folder.join("main.cpp").exists());
    assert!(config.output.folder.join("CMakeLists.txt").exists());

    let gp_src = fs::read_to_string(config.output.folder.join("gp.cpp")).unwrap();
    assert!(gp_src.contains("py::class_<gp_Pnt>"));

    // gp_Pnt must be registered before gp_Ax1, which references it
    let pnt_pos = gp_src.find("py::class_<gp_Pnt>").unwrap();
    let ax1_pos = gp_src.find("py::class_<gp_Ax1>").unwrap();
    assert!(pnt_pos < ax1_pos);
}

#[test]
fn test_pipeline_is_deterministic() {
    let dir = create_header_tree();
    let config = config_for(&dir);

    let run = || -> String {
        let generator = Generator::new(config.clone(), None).expect("generator");
        let mut model = generator.build_model().expect("model");
        let transformer = Transformer::from_config(&config, None).expect("transformer");
        transformer.transform_all(&mut model.modules);
        for module in &mut model.modules {
            graph::sort_module_classes(module).expect("class sort");
        }
        graph::sort_modules(&mut model.modules, &model.class_dict, &model.typedef_dict)
            .expect("module sort");
        serde_json::to_string(&model.modules).expect("serialize")
    };

    assert_eq!(run(), run());
}

#[test]
fn test_model_artifact_round_trip_between_stages() {
    let dir = create_header_tree();
    let config = config_for(&dir);
    let generator = Generator::new(config.clone(), None).expect("generator");
    let model = generator.build_model().expect("model");

    let artifact = dir.path().join("model.json");
    model.save(&artifact).expect("save");
    let mut loaded = ModelResult::load(&artifact).expect("load");
    assert_eq!(loaded.modules, model.modules);

    // The reloaded artifact feeds the transform stage unchanged
    let transformer = Transformer::from_config(&config, None).expect("transformer");
    transformer.transform_all(&mut loaded.modules);
    assert!(!loaded.modules.is_empty());
}

#[test]
fn test_filter_monotonicity_against_growing_table() {
    let dir = create_header_tree();
    let config = config_for(&dir);
    let generator = Generator::new(config.clone(), None).expect("generator");

    let small = SymbolTable::from_names(vec!["_ZN6gp_PntC1Ev".to_string()]);
    let transformer = Transformer::from_config(&config, None)
        .expect("transformer")
        .with_symbols(small);

    let mut filtered = generator.build_model().expect("model");
    transformer.transform_all(&mut filtered.modules);

    for module in &filtered.modules {
        for class in module.classes.iter().chain(module.exceptions.iter()) {
            let unfiltered = class.unfiltered.as_ref().expect("snapshot");
            assert!(unfiltered.methods.len() >= class.methods.len());
            assert!(unfiltered.constructors.len() >= class.constructors.len());
        }
    }
}

#[test]
fn test_cyclic_default_arguments_error_mentions_participants() {
    let dir = TempDir::new().unwrap();

    // A and B mutually reference each other through default arguments
    fs::write(
        dir.path().join("Cy_A.hxx"),
        r#"
#include "Cy_B.hxx"
class Cy_A {
public:
    void Use(Cy_B b = Cy_B());
};
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("Cy_B.hxx"),
        r#"
#include "Cy_A.hxx"
class Cy_B {
public:
    void Use(Cy_A a = Cy_A());
};
"#,
    )
    .unwrap();

    let mut config = Config::default();
    config.input.folder = dir.path().to_path_buf();

    let generator = Generator::new(config, None).expect("generator");
    let mut model = generator.build_model().expect("model");

    let result = graph::sort_module_classes(&mut model.modules[0]);
    let err = result.expect_err("cycle must be detected");
    let message = err.to_string();
    assert!(message.contains("Cy_A"));
    assert!(message.contains("Cy_B"));
}
