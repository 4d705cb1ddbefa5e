//! Strategy lookup and the generation entry point

use kubechart_core::{CoreError, GeneratedChart, GenerateOptions, OutputMode, ResourceGraph};
use tracing::{debug, info};

use crate::error::{GenerateError, Result};
use crate::library::LibraryGenerator;
use crate::scaffold;
use crate::separate::SeparateGenerator;
use crate::umbrella::UmbrellaGenerator;
use crate::universal::UniversalGenerator;

/// One chart layout strategy
pub trait ChartGenerator: Send + Sync {
    fn mode(&self) -> OutputMode;

    fn generate(&self, graph: &ResourceGraph, options: &GenerateOptions) -> Result<Vec<GeneratedChart>>;
}

/// Immutable table of the available strategies
pub struct GeneratorRegistry {
    generators: Vec<Box<dyn ChartGenerator>>,
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::with_generators(vec![
            Box::new(UniversalGenerator),
            Box::new(SeparateGenerator),
            Box::new(LibraryGenerator),
            Box::new(UmbrellaGenerator),
        ])
    }

    pub fn with_generators(generators: Vec<Box<dyn ChartGenerator>>) -> Self {
        Self { generators }
    }

    pub fn lookup(&self, mode: OutputMode) -> Result<&dyn ChartGenerator> {
        self.generators
            .iter()
            .find(|g| g.mode() == mode)
            .map(|g| g.as_ref())
            .ok_or_else(|| GenerateError::unregistered(mode))
    }

    /// Look up a strategy by its command-line name
    pub fn lookup_name(&self, name: &str) -> Result<&dyn ChartGenerator> {
        self.lookup(parse_mode(name)?)
    }

    pub fn modes(&self) -> Vec<OutputMode> {
        self.generators.iter().map(|g| g.mode()).collect()
    }

    /// Validate options, run the strategy for `options.mode` and apply
    /// scaffolding when requested
    pub fn generate(&self, graph: &ResourceGraph, options: &GenerateOptions) -> Result<Vec<GeneratedChart>> {
        options.validate()?;
        let generator = self.lookup(options.mode)?;
        let mut charts = generator.generate(graph, options)?;

        if let Some(scaffold) = &options.scaffold {
            for chart in &mut charts {
                scaffold::apply(chart, scaffold)?;
            }
        }

        for chart in &charts {
            debug!(
                chart = %chart.name,
                location = %chart.location.display(),
                templates = chart.templates.len(),
                "generated chart"
            );
        }
        info!(mode = %options.mode, charts = charts.len(), "generation complete");
        Ok(charts)
    }
}

/// Parse a mode name, suggesting the closest known mode on a typo
pub fn parse_mode(name: &str) -> Result<OutputMode> {
    name.parse().map_err(|err| match err {
        CoreError::UnknownMode { value, suggestion } => GenerateError::UnknownMode {
            mode: value,
            suggestion,
        },
        other => GenerateError::InvalidOption(other),
    })
}

/// Generate with the built-in strategies
pub fn generate(graph: &ResourceGraph, options: &GenerateOptions) -> Result<Vec<GeneratedChart>> {
    GeneratorRegistry::new().generate(graph, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mode_registered() {
        let registry = GeneratorRegistry::new();
        for mode in OutputMode::ALL {
            assert_eq!(registry.lookup(mode).unwrap().mode(), mode);
        }
    }

    #[test]
    fn test_unregistered_mode() {
        let registry = GeneratorRegistry::with_generators(vec![Box::new(UniversalGenerator)]);
        let err = registry.lookup(OutputMode::Umbrella).err().unwrap();
        assert_eq!(err.to_string(), "Unknown output mode 'umbrella'");
        assert_eq!(registry.modes(), vec![OutputMode::Universal]);
    }

    #[test]
    fn test_unknown_mode_name_suggests() {
        let registry = GeneratorRegistry::new();
        assert_eq!(registry.lookup_name("Library").unwrap().mode(), OutputMode::Library);

        match parse_mode("umbrela") {
            Err(GenerateError::UnknownMode { mode, suggestion }) => {
                assert_eq!(mode, "umbrela");
                assert_eq!(suggestion.as_deref(), Some("umbrella"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            parse_mode("helmfile"),
            Err(GenerateError::UnknownMode { suggestion: None, .. })
        ));
    }

    #[test]
    fn test_invalid_version_is_rejected() {
        let mut options = GenerateOptions::new("shop");
        options.chart_version = "one".to_string();
        let err = generate(&ResourceGraph::default(), &options).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidOption(_)));
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GeneratorRegistry>();
    }
}
