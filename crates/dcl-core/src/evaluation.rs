//! Evaluation schemas: an analysis schema plus the runtime pieces needed to
//! map resolution results, assembled from feature components.

use crate::mapping::{RuntimeCustomAccessors, RuntimeMapper};
use crate::schema::{AnalysisSchema, FqName};
use crate::schema_builder::*;

/// One logical feature's contributions to schema building and mapping.
pub trait EvaluationSchemaComponent {
    fn type_discovery(&self) -> Vec<Box<dyn TypeDiscovery>> {
        Vec::new()
    }

    fn function_extractors(&self) -> Vec<Box<dyn FunctionExtractor>> {
        Vec::new()
    }

    fn runtime_custom_accessors(&self) -> Vec<Box<dyn RuntimeCustomAccessors>> {
        Vec::new()
    }
}

pub struct EvaluationSchema {
    pub analysis_schema: AnalysisSchema,
    custom_accessors: Vec<Box<dyn RuntimeCustomAccessors>>,
}

impl EvaluationSchema {
    pub fn new(analysis_schema: AnalysisSchema) -> Self {
        Self {
            analysis_schema,
            custom_accessors: Vec::new(),
        }
    }

    /// A mapper over this schema that knows every component's custom accessors.
    pub fn mapper(&self) -> RuntimeMapper<'_> {
        self.custom_accessors
            .iter()
            .fold(RuntimeMapper::new(&self.analysis_schema), |mapper, accessors| {
                mapper.with_custom_accessors(accessors.as_ref())
            })
    }
}

/// Build a schema from `base` extended by `components`, in order.
pub fn build_evaluation_schema(
    repository: &HostTypeRepository,
    top_level: &FqName,
    components: &[&dyn EvaluationSchemaComponent],
    base: SchemaBuilderConfig,
) -> Result<EvaluationSchema, SchemaBuildError> {
    let mut type_discovery = vec![base.type_discovery];
    let mut function_extractors = vec![base.function_extractor];
    let mut custom_accessors = Vec::new();
    for component in components {
        type_discovery.extend(component.type_discovery());
        function_extractors.extend(component.function_extractors());
        custom_accessors.extend(component.runtime_custom_accessors());
    }

    let config = SchemaBuilderConfig {
        type_discovery: Box::new(CompositeTypeDiscovery::new(type_discovery)),
        function_extractor: Box::new(CompositeFunctionExtractor::new(function_extractors)),
        ..base
    };
    let analysis_schema = schema_from_types(repository, top_level, &[], &config)?;
    log::debug!(
        "evaluation schema for {} with {} components",
        top_level,
        components.len()
    );
    Ok(EvaluationSchema {
        analysis_schema,
        custom_accessors,
    })
}
