//! Fixture adapter
//!
//! Treats the code as a JSON literal of landmark records. Useful for checking
//! how the harness renders results without writing a script.

use super::framework::{AdapterParams, SourceAdapter};
use crate::landmark::{validate_landmarks, LandmarkRecord};
use crate::{Error, Result};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureAdapter;

impl FixtureAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceAdapter for FixtureAdapter {
    async fn execute(&self, params: &AdapterParams) -> Result<Vec<LandmarkRecord>> {
        let value: serde_json::Value = serde_json::from_str(&params.code).map_err(|e| {
            Error::ScriptSyntax(format!("{} (line {}, column {})", e, e.line(), e.column()))
        })?;
        validate_landmarks(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{BoundingBox, Location};
    use crate::variables::VariableBag;

    fn params(code: &str) -> AdapterParams {
        let bbox = BoundingBox::new(Location::new(1.0, 0.0), Location::new(0.0, 1.0));
        AdapterParams::new(code, VariableBag::new(), bbox)
    }

    #[tokio::test]
    async fn test_fixture_landmarks() {
        let code = r#"[{"lat": 48.8584, "lng": 2.2945, "name": "Eiffel Tower", "description": "", "types": ["tower"]}]"#;
        let landmarks = FixtureAdapter.execute(&params(code)).await.unwrap();
        assert_eq!(landmarks, vec![LandmarkRecord::new(48.8584, 2.2945, "Eiffel Tower", "").with_type("tower")]);
    }

    #[tokio::test]
    async fn test_invalid_json_is_syntax_error() {
        let err = FixtureAdapter.execute(&params("[{")).await.unwrap_err();
        assert!(matches!(err, Error::ScriptSyntax(ref m) if m.contains("line 1")), "{err}");
    }
}
