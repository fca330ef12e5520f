//! Host session
//!
//! Holds what the harness UI edits (code, variables, map selection, chosen
//! adapter) and the single result slot it displays. Runs are split into
//! [`Session::begin_run`] and [`Session::finish`] so a caller can release the
//! session while the adapter works; each run carries a generation number and
//! only the newest run may write the result slot.

use crate::adapter::{AdapterDescriptor, AdapterParams, AdapterRegistry};
use crate::geo::{BoundingBox, BoundingCircle, Location};
use crate::landmark::LandmarkRecord;
use crate::variables::VariableBag;
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;

/// Result slot text before the first run
pub const INITIAL_RESULT: &str = "Result will be shown here";

/// Render a run outcome the way the result pane shows it
///
/// Landmarks are pretty-printed JSON with two-space indent; errors are their
/// message, verbatim.
pub fn render_outcome(outcome: &Result<Vec<LandmarkRecord>>) -> String {
    match outcome {
        Ok(landmarks) => serde_json::to_string_pretty(landmarks).unwrap_or_else(|e| e.to_string()),
        Err(e) => e.to_string(),
    }
}

/// A run captured from the session, ready to execute without it
#[derive(Debug, Clone)]
pub struct PendingRun {
    pub generation: u64,
    pub adapter: AdapterDescriptor,
    pub params: AdapterParams,
}

impl PendingRun {
    pub async fn execute(&self) -> Result<Vec<LandmarkRecord>> {
        tracing::info!("Run #{} with adapter '{}'", self.generation, self.adapter.name);
        self.adapter.execute(&self.params).await
    }
}

/// Serializable view of the session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub adapter: String,
    pub language: String,
    pub grammar: String,
    pub code: String,
    pub variables: VariableBag,
    pub bounding_box: BoundingBox,
    pub bounding_circle: BoundingCircle,
    pub result: String,
    pub generation: u64,
}

#[derive(Debug)]
pub struct Session {
    registry: Arc<AdapterRegistry>,
    current: usize,
    code: String,
    variables: VariableBag,
    selection: BoundingBox,
    result: String,
    generation: u64,
}

impl Session {
    /// New session selecting the first registered adapter
    pub fn new(registry: Arc<AdapterRegistry>, selection: BoundingBox) -> Result<Self> {
        if registry.is_empty() {
            return Err(Error::UnknownAdapter("no adapters registered".to_string()));
        }
        selection.validate()?;
        Ok(Self {
            registry,
            current: 0,
            code: String::new(),
            variables: VariableBag::new(),
            selection,
            result: INITIAL_RESULT.to_string(),
            generation: 0,
        })
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn current_adapter(&self) -> &AdapterDescriptor {
        &self.registry.adapters()[self.current]
    }

    /// Select an adapter by name.
    ///
    /// Unknown names keep the current selection; returns whether it changed.
    pub fn select_adapter(&mut self, name: &str) -> bool {
        match self.registry.position(name) {
            Some(index) => {
                self.current = index;
                true
            }
            None => {
                tracing::debug!("Ignoring selection of unknown adapter '{}'", name);
                false
            }
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    pub fn variables(&self) -> &VariableBag {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableBag {
        &mut self.variables
    }

    pub fn set_variables(&mut self, variables: VariableBag) {
        self.variables = variables;
    }

    pub fn selection(&self) -> BoundingBox {
        self.selection
    }

    /// Replace the map selection with the rectangle spanned by two corners
    pub fn select_rectangle(&mut self, a: Location, b: Location) -> Result<()> {
        let selection = BoundingBox::from_corners(a, b);
        selection.validate()?;
        self.selection = selection;
        Ok(())
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Capture the current state as a new run
    pub fn begin_run(&mut self) -> PendingRun {
        self.generation += 1;
        PendingRun {
            generation: self.generation,
            adapter: self.current_adapter().clone(),
            params: AdapterParams::new(self.code.clone(), self.variables.clone(), self.selection),
        }
    }

    /// Store a run's outcome unless a newer run has started since.
    ///
    /// Returns whether the result slot was updated.
    pub fn finish(&mut self, generation: u64, outcome: &Result<Vec<LandmarkRecord>>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Discarding stale run #{} (latest is #{})",
                generation,
                self.generation
            );
            return false;
        }
        if let Err(e) = outcome {
            tracing::warn!("Run #{} failed: {}", generation, e);
        }
        self.result = render_outcome(outcome);
        true
    }

    /// Begin, execute and finish a run in one go
    pub async fn run(&mut self) -> Result<Vec<LandmarkRecord>> {
        let pending = self.begin_run();
        let outcome = pending.execute().await;
        self.finish(pending.generation, &outcome);
        outcome
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let adapter = self.current_adapter();
        SessionSnapshot {
            adapter: adapter.name.clone(),
            language: adapter.language.clone(),
            grammar: adapter.grammar.clone(),
            code: self.code.clone(),
            variables: self.variables.clone(),
            bounding_box: self.selection,
            bounding_circle: self.selection.bounding_circle(),
            result: self.result.clone(),
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{default_registry, SourceAdapter};
    use crate::config::TesterConfig;
    use async_trait::async_trait;

    fn session() -> Session {
        let registry = Arc::new(default_registry(&TesterConfig::default()).unwrap());
        Session::new(registry, BoundingBox::around(Location::new(51.5, -0.124), 0.005)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let session = session();
        assert_eq!(session.current_adapter().name, "rhai");
        assert_eq!(session.result(), INITIAL_RESULT);
        assert!(session.variables().is_empty());
    }

    #[test]
    fn test_unknown_adapter_keeps_selection() {
        let mut session = session();
        assert!(session.select_adapter("json"));
        assert!(!session.select_adapter("python"));
        assert_eq!(session.current_adapter().name, "json");
        assert!(!session.select_adapter("python"));
        assert_eq!(session.current_adapter().name, "json");
    }

    #[test]
    fn test_select_rectangle() {
        let mut session = session();
        session
            .select_rectangle(Location::new(10.0, 20.0), Location::new(11.0, 19.0))
            .unwrap();
        assert_eq!(session.selection().top_left, Location::new(11.0, 19.0));

        let before = session.selection();
        assert!(session.select_rectangle(Location::new(100.0, 0.0), Location::new(0.0, 0.0)).is_err());
        assert_eq!(session.selection(), before);
    }

    #[tokio::test]
    async fn test_run_renders_pretty_json() {
        let mut session = session();
        session.select_adapter("json");
        session.set_code(r#"[{"lat": 1.5, "lng": 2.5, "name": "n", "description": "d", "types": ["t"]}]"#);

        let landmarks = session.run().await.unwrap();
        assert_eq!(landmarks.len(), 1);
        assert_eq!(session.result(), serde_json::to_string_pretty(&landmarks).unwrap());
        assert!(session.result().contains("\n  {\n    \"lat\": 1.5"));
    }

    #[tokio::test]
    async fn test_failed_run_keeps_state() {
        let mut session = session();
        session.set_code("let x = ;");
        session.variables_mut().set("apiKey", "secret");
        let selection = session.selection();

        let err = session.run().await.unwrap_err();
        assert_eq!(session.result(), err.to_string());
        assert!(!session.result().is_empty());
        assert_eq!(session.code(), "let x = ;");
        assert_eq!(session.variables().get("apiKey"), Some(&serde_json::json!("secret")));
        assert_eq!(session.selection(), selection);
    }

    #[tokio::test]
    async fn test_stale_run_is_discarded() {
        let mut session = session();
        session.select_adapter("json");

        session.set_code(r#"[{"lat": 1, "lng": 1, "name": "old", "description": "", "types": []}]"#);
        let first = session.begin_run();
        session.set_code(r#"[{"lat": 2, "lng": 2, "name": "new", "description": "", "types": []}]"#);
        let second = session.begin_run();

        let second_outcome = second.execute().await;
        assert!(session.finish(second.generation, &second_outcome));
        let first_outcome = first.execute().await;
        assert!(!session.finish(first.generation, &first_outcome));

        assert!(session.result().contains("new"));
        assert!(!session.result().contains("old"));
        assert_eq!(session.generation(), 2);
    }

    #[tokio::test]
    async fn test_run_passes_session_state() {
        struct Echo;

        #[async_trait]
        impl SourceAdapter for Echo {
            async fn execute(&self, params: &AdapterParams) -> Result<Vec<LandmarkRecord>> {
                let name = params.variables.get("name").and_then(|v| v.as_str()).unwrap_or("?");
                let c = params.bounding_circle.center;
                Ok(vec![LandmarkRecord::new(c.lat, c.lng, name, params.code.clone())])
            }
        }

        let mut registry = AdapterRegistry::new();
        registry.register(AdapterDescriptor::new("echo", "text", "text", Echo)).unwrap();
        let mut session = Session::new(
            Arc::new(registry),
            BoundingBox::new(Location::new(2.0, 0.0), Location::new(0.0, 4.0)),
        )
        .unwrap();
        session.set_code("code");
        session.variables_mut().set("name", "value");

        let landmarks = session.run().await.unwrap();
        assert_eq!(landmarks, vec![LandmarkRecord::new(1.0, 2.0, "value", "code")]);
    }

    #[test]
    fn test_empty_registry_rejected() {
        let selection = BoundingBox::around(Location::new(0.0, 0.0), 1.0);
        assert!(Session::new(Arc::new(AdapterRegistry::new()), selection).is_err());
    }
}
