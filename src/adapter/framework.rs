//! Core adapter framework
//!
//! Defines the trait every source adapter implements and the registry the
//! host selects adapters from.

use crate::geo::{BoundingBox, BoundingCircle};
use crate::landmark::LandmarkRecord;
use crate::variables::VariableBag;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything an adapter receives for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterParams {
    pub code: String,
    pub variables: VariableBag,
    pub bounding_box: BoundingBox,
    pub bounding_circle: BoundingCircle,
}

impl AdapterParams {
    /// Build params, deriving the bounding circle from the box.
    pub fn new(code: impl Into<String>, variables: VariableBag, bounding_box: BoundingBox) -> Self {
        Self {
            code: code.into(),
            variables,
            bounding_circle: bounding_box.bounding_circle(),
            bounding_box,
        }
    }
}

/// Trait for source adapters
///
/// An adapter takes user code plus the map selection and produces landmarks.
/// Every call is independent: implementations must not keep state between
/// runs.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Run the code and return validated landmarks
    async fn execute(&self, params: &AdapterParams) -> Result<Vec<LandmarkRecord>>;
}

/// A registered adapter
#[derive(Clone)]
pub struct AdapterDescriptor {
    /// Selection key
    pub name: String,
    /// Syntax highlighting grammar for the editor
    pub grammar: String,
    /// Display language tag
    pub language: String,
    pub adapter: Arc<dyn SourceAdapter>,
}

impl AdapterDescriptor {
    pub fn new(
        name: impl Into<String>,
        grammar: impl Into<String>,
        language: impl Into<String>,
        adapter: impl SourceAdapter + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            grammar: grammar.into(),
            language: language.into(),
            adapter: Arc::new(adapter),
        }
    }

    pub async fn execute(&self, params: &AdapterParams) -> Result<Vec<LandmarkRecord>> {
        self.adapter.execute(params).await
    }
}

impl std::fmt::Debug for AdapterDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterDescriptor")
            .field("name", &self.name)
            .field("grammar", &self.grammar)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

/// Registry of source adapters, in registration order
#[derive(Default, Debug)]
pub struct AdapterRegistry {
    adapters: Vec<AdapterDescriptor>,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter. Names must be unique.
    pub fn register(&mut self, descriptor: AdapterDescriptor) -> Result<()> {
        if self.find_adapter(&descriptor.name).is_some() {
            return Err(Error::DuplicateAdapter(descriptor.name));
        }
        self.adapters.push(descriptor);
        Ok(())
    }

    /// Find an adapter by exact name
    pub fn find_adapter(&self, name: &str) -> Option<&AdapterDescriptor> {
        self.adapters.iter().find(|a| a.name == name)
    }

    /// Position of an adapter in registration order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.adapters.iter().position(|a| a.name == name)
    }

    /// The first registered adapter
    pub fn default_adapter(&self) -> Option<&AdapterDescriptor> {
        self.adapters.first()
    }

    /// Get all registered adapters
    pub fn adapters(&self) -> &[AdapterDescriptor] {
        &self.adapters
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Execute params with the named adapter
    pub async fn execute(&self, name: &str, params: &AdapterParams) -> Result<Vec<LandmarkRecord>> {
        let descriptor = self
            .find_adapter(name)
            .ok_or_else(|| Error::UnknownAdapter(name.to_string()))?;
        descriptor.execute(params).await
    }
}
