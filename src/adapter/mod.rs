//! Source Adapter Framework
//!
//! A source adapter turns user code plus a map selection into landmarks.
//! Adapters are registered once at startup under a unique name; the host
//! dispatches to them through [`SourceAdapter`] and never sees
//! interpreter-specific logic.

pub mod framework;
pub mod sandbox;
pub mod packages;
pub mod script;
pub mod fixture;

pub use framework::{AdapterDescriptor, AdapterParams, AdapterRegistry, SourceAdapter};
pub use sandbox::{ExecutionLimits, ScriptBindings, ScriptEngine};
pub use packages::{PackageLoader, PackageSettings};
pub use script::{RhaiEngine, ScriptAdapter};
pub use fixture::FixtureAdapter;

use crate::config::TesterConfig;
use crate::Result;

/// Create the registry of built-in adapters
///
/// Registration order matters: the first adapter is the default selection.
pub fn default_registry(config: &TesterConfig) -> Result<AdapterRegistry> {
    let mut registry = AdapterRegistry::new();
    registry.register(AdapterDescriptor::new(
        "rhai",
        "rust",
        "rhai",
        ScriptAdapter::rhai(config.limits.clone(), &config.packages),
    ))?;
    registry.register(AdapterDescriptor::new("json", "json", "json", FixtureAdapter::new()))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = default_registry(&TesterConfig::default()).unwrap();
        let names: Vec<_> = registry.adapters().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["rhai", "json"]);
        assert_eq!(registry.default_adapter().unwrap().language, "rhai");
    }
}
