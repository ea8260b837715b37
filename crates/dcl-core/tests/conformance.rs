use dcl_core::catalogs::*;
use dcl_core::document_resolution::*;
use dcl_core::resolution::*;
use dcl_core::schema::*;
use dcl_core::schema_builder::*;
use dcl_core::{resolve_document_source, resolve_source, AnalysisSchema};
use pretty_assertions::assert_eq;

// ---------------------------------------------------------------------------
// Helper: a project-like schema built from host metadata
// ---------------------------------------------------------------------------
fn project_schema() -> AnalysisSchema {
    let restricted = |name: &str, t: DataType| HostProperty::new(name, t).annotated(RESTRICTED);
    let repository = HostTypeRepository::new()
        .with_class(
            HostClass::new("app.Project")
                .with_property(restricted("name", DataType::String))
                .with_property(restricted("description", DataType::String))
                .with_property(restricted("version", DataType::String).immutable())
                .with_property(
                    HostProperty::new("java", DataType::class("app.Java"))
                        .annotated(CONFIGURING)
                        .immutable(),
                )
                .with_function(
                    HostFunction::new("dependencies", DataType::Unit)
                        .annotated(CONFIGURING)
                        .with_configure_lambda(DataType::class("app.Dependencies")),
                )
                .with_function(
                    HostFunction::new("library", DataType::class("app.Library"))
                        .annotated(ADDING)
                        .with_parameter(
                            HostParameter::new("name", DataType::String).annotated(IDENTITY_KEY),
                        )
                        .with_configure_lambda(DataType::class("app.Library")),
                )
                .with_function(
                    HostFunction::new("path", DataType::String)
                        .annotated(RESTRICTED)
                        .with_parameter(HostParameter::new("p", DataType::String)),
                )
                .with_function(
                    HostFunction::new("choose", DataType::String)
                        .annotated(RESTRICTED)
                        .with_parameter(HostParameter::new("a", DataType::Int)),
                )
                .with_function(
                    HostFunction::new("choose", DataType::String)
                        .annotated(RESTRICTED)
                        .with_parameter(HostParameter::new("b", DataType::Int)),
                )
                .with_function(
                    HostFunction::new("tag", DataType::class("app.Project"))
                        .annotated(BUILDER)
                        .with_parameter(HostParameter::new("value", DataType::String)),
                ),
        )
        .with_class(HostClass::new("app.Java").with_property(restricted("release", DataType::Int)))
        .with_class(
            HostClass::new("app.Dependencies").with_function(
                HostFunction::new("implementation", DataType::class("app.Dependency"))
                    .annotated(ADDING)
                    .with_parameter(HostParameter::new("notation", DataType::String)),
            ),
        )
        .with_class(
            HostClass::new("app.Dependency")
                .with_property(restricted("notation", DataType::String).immutable()),
        )
        .with_class(
            HostClass::new("app.Library")
                .with_property(restricted("enabled", DataType::Boolean))
                .with_property(restricted("name", DataType::String).immutable()),
        )
        .with_class(
            HostClass::new("app.Settings")
                .with_property(restricted("debug", DataType::Boolean).immutable()),
        )
        .with_top_level_function(HostTopLevelFunction {
            package_name: "app.util".into(),
            name: "env".into(),
            parameters: vec![HostParameter::new("key", DataType::String)],
            return_type: DataType::String,
            annotations: [RESTRICTED.to_string()].into(),
        });

    let config = SchemaBuilderConfig {
        external_objects: vec![(FqName::parse("app.env.settings"), DataType::class("app.Settings"))],
        ..SchemaBuilderConfig::default()
    };
    schema_from_types(
        &repository,
        &FqName::parse("app.Project"),
        &[FqName::parse("app.Settings")],
        &config,
    )
    .expect("project schema builds")
}

fn resolve(input: &str) -> ResolutionResult {
    let (tree, result) = resolve_source(&project_schema(), input, "build.dcl");
    assert!(tree.diagnostics().is_empty(), "{:?}", tree.diagnostics());
    result
}

fn codes(result: &ResolutionResult) -> Vec<&'static str> {
    result.errors.iter().map(|e| e.reason.code()).collect()
}

// ===========================================================================
// Resolution fixtures
// ===========================================================================

#[test]
fn conformance_full_project() {
    let input = r#"name = "demo"
description = path("docs")
java {
    release = 21
}
dependencies {
    implementation("org.example:lib:1.0")
}
library("core") {
    enabled = true
}
tag("v1")"#;

    let result = resolve(input);
    assert_eq!(codes(&result), Vec::<&str>::new());

    let assigned: Vec<&str> = result
        .assignments
        .iter()
        .map(|a| a.lhs.property.name.as_str())
        .collect();
    assert_eq!(assigned, vec!["name", "description", "release", "enabled", "tag"]);
    assert!(result
        .assignments
        .windows(2)
        .all(|w| w[0].assignment_order < w[1].assignment_order));
    assert_eq!(
        result.assignments[4].method,
        AssignmentMethod::Builder {
            function_name: "tag".into()
        }
    );

    assert_eq!(result.additions.len(), 2);
    let added: Vec<String> = result
        .additions
        .iter()
        .map(|a| a.data_object.data_type().to_string())
        .collect();
    assert_eq!(added, vec!["app.Dependency", "app.Library"]);
}

#[test]
fn conformance_read_only_assignment() {
    let result = resolve("version = \"1.0\"");
    assert_eq!(codes(&result), vec!["DCL-E004"]);
    assert!(result.assignments.is_empty());
}

#[test]
fn conformance_ambiguous_overloads() {
    let result = resolve("name = choose(1)");
    let candidates = result
        .errors
        .iter()
        .find_map(|e| match &e.reason {
            ErrorReason::AmbiguousFunctions { functions } => Some(functions.len()),
            _ => None,
        })
        .expect("ambiguity reported");
    assert_eq!(candidates, 2);
    assert!(result.assignments.is_empty());
}

#[test]
fn conformance_duplicate_local_values() {
    let result = resolve("val a = \"x\"\nval a = \"y\"\nname = a");
    assert_eq!(codes(&result), vec!["DCL-E015"]);
}

#[test]
fn conformance_local_value_origin() {
    let result = resolve("val greeting = env(\"GREETING\")\nname = greeting");
    assert_eq!(codes(&result), Vec::<&str>::new());
    assert!(matches!(
        &result.assignments[0].rhs,
        ObjectOrigin::FromLocalValue { name, .. } if name == "greeting"
    ));
}

#[test]
fn conformance_external_objects() {
    let result = resolve("library(\"x\") {\n    enabled = settings.debug\n}");
    assert_eq!(codes(&result), Vec::<&str>::new());

    let result = resolve("settings.debug = true");
    assert_eq!(codes(&result), vec!["DCL-E010"]);

    let result = resolve("name = settings.debug");
    assert_eq!(codes(&result), vec!["DCL-E011"]);
}

#[test]
fn conformance_errors_do_not_stop_siblings() {
    let result = resolve("missing = 1\nname = \"ok\"\nlibrary(1)\ndescription = \"still ok\"");
    assert_eq!(codes(&result), vec!["DCL-E016", "DCL-E007"]);
    assert_eq!(result.assignments.len(), 2);
}

#[test]
fn conformance_invalid_code_never_panics() {
    let schema = project_schema();
    let inputs = [
        "name = ",
        "= 1",
        "library(",
        "java {",
        "}}}",
        "name = \"unterminated",
        "val = 3",
        "x.y.z = 1",
        "choose(1) {",
        "import",
        "name = 99999999999",
        "@@@",
        "library(1) { enabled = 1 }",
        "this = 1",
        "name = null",
    ];
    for input in inputs {
        let (tree, result) = resolve_source(&schema, input, "bad.dcl");
        assert!(
            !tree.diagnostics().is_empty() || !result.errors.is_empty(),
            "no diagnostics for {:?}",
            input
        );
        let (_, document) = resolve_document_source(&schema, input, "bad.dcl");
        let _ = document.diagnostics();
    }
}

// ===========================================================================
// Document fixtures
// ===========================================================================

#[test]
fn conformance_document_resolution() {
    let input = r#"name = "demo"
java {
    release = 21
}
library("core") {
    enabled = true
}
missing = 1"#;

    let (_, document) = resolve_document_source(&project_schema(), input, "build.dcl");
    assert!(!document.is_successful());
    assert_eq!(document.content.len(), 4);

    assert!(matches!(
        document.content[1].resolution,
        DocumentResolution::Element(ElementResolution::PropertyConfiguringElementResolved { .. })
    ));
    assert!(matches!(
        &document.content[2].resolution,
        DocumentResolution::Element(ElementResolution::ContainerElementResolved {
            is_key_arguments: true,
            ..
        })
    ));
    let codes: Vec<String> = document.diagnostics().into_iter().map(|d| d.code).collect();
    assert_eq!(codes, vec!["DCL-D002"]);
    assert_eq!(document.diagnostics()[0].line, 8);
}

#[test]
fn conformance_document_read_only_property() {
    let (_, document) = resolve_document_source(&project_schema(), "version = \"2\"", "build.dcl");
    assert_eq!(
        document.content[0].resolution,
        DocumentResolution::Property(PropertyResolution::PropertyNotAssigned {
            reasons: vec![PropertyNotAssignedReason::NotAssignable]
        })
    );
}
