//! # Extension Tester - harness for landmark source adapters
//!
//! Lets a developer run a source-adapter script against a map selection and
//! inspect the landmarks it returns.
//!
//! Extension Tester provides:
//! - Bounding box to bounding circle conversion for map selections
//! - A registry of pluggable source adapters keyed by name
//! - A sandboxed Rhai adapter with an allow-listed HTTP package
//! - Validation of script output into typed landmark records
//! - A host session and HTTP API for the browser harness

pub mod geo;
pub mod landmark;
pub mod variables;
pub mod adapter;
pub mod host;
pub mod server;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use geo::{bounding_circle_of, BoundingBox, BoundingCircle, Location};
pub use landmark::{validate_landmarks, LandmarkRecord};
pub use variables::VariableBag;
pub use adapter::{AdapterDescriptor, AdapterParams, AdapterRegistry, SourceAdapter};
pub use host::Session;

/// Result type alias for Extension Tester operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Extension Tester operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SyntaxError: {0}")]
    ScriptSyntax(String),

    #[error("RuntimeError: {0}")]
    ScriptRuntime(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error(
        "Malformed result{}: {reason}",
        .index.map(|i| format!(" at record {i}")).unwrap_or_default()
    )]
    MalformedResult { index: Option<usize>, reason: String },

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Unknown adapter: {0}")]
    UnknownAdapter(String),

    #[error("Adapter already registered: {0}")]
    DuplicateAdapter(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
