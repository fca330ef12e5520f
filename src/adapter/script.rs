//! Script-interpreter adapter backed by Rhai
//!
//! Each run builds a fresh engine and scope on a blocking worker thread, so
//! nothing leaks between runs (or between concurrent runs). Scripts see:
//! - `boundingBox` and `boundingCircle` as constants
//! - `getVariableFromStorage(name)`, returning the variable or `""`
//! - `require(name)` for allow-listed packages
//!
//! The value of the script's last expression (or top-level `return`) is the
//! result, and must be an array of landmark maps.

use super::framework::{AdapterParams, SourceAdapter};
use super::packages::{PackageLoader, PackageSettings};
use super::sandbox::{ExecutionLimits, ScriptBindings, ScriptEngine};
use crate::landmark::{validate_landmarks, LandmarkRecord};
use crate::variables::VariableBag;
use crate::{Error, Result};
use async_trait::async_trait;
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use std::time::Instant;

/// Binding name of the selected rectangle
pub const BOUNDING_BOX: &str = "boundingBox";
/// Binding name of the derived circle
pub const BOUNDING_CIRCLE: &str = "boundingCircle";
/// Host function scripts use to read variables
pub const VARIABLE_ACCESSOR: &str = "getVariableFromStorage";

/// Sandboxed Rhai interpreter
#[derive(Debug, Clone, Default)]
pub struct RhaiEngine {
    limits: ExecutionLimits,
    packages: PackageLoader,
}

impl RhaiEngine {
    pub fn new(limits: ExecutionLimits, packages: PackageLoader) -> Self {
        Self { limits, packages }
    }

    fn build_engine(&self, variables: VariableBag) -> Engine {
        let limits = &self.limits;
        let mut engine = Engine::new();

        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);

        // No file imports, no dynamic eval
        engine.set_module_resolver(DummyModuleResolver::new());
        engine.disable_symbol("eval");

        engine.on_print(|text| tracing::info!(target: "script", "{}", text));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(target: "script", source = source.unwrap_or("main"), "{} ({})", text, pos)
        });

        if let Some(timeout) = limits.timeout() {
            let started = Instant::now();
            engine.on_progress(move |_| {
                if started.elapsed() > timeout {
                    Some(Dynamic::from(timeout.as_millis() as i64))
                } else {
                    None
                }
            });
        }

        self.packages.register(&mut engine);

        engine.register_fn(VARIABLE_ACCESSOR, move |name: Dynamic| -> Dynamic {
            match variables.get(&name.to_string()) {
                None | Some(serde_json::Value::Null) => Dynamic::from(String::new()),
                Some(value) => rhai::serde::to_dynamic(value).unwrap_or_else(|_| Dynamic::from(String::new())),
            }
        });

        engine
    }

    /// Synchronous evaluation; runs on the calling thread.
    pub fn evaluate(&self, script: &str, bindings: ScriptBindings) -> Result<serde_json::Value> {
        let ScriptBindings { constants, variables } = bindings;
        let engine = self.build_engine(variables);

        let mut scope = Scope::new();
        for (name, value) in constants {
            let value = rhai::serde::to_dynamic(value)
                .map_err(|e| Error::ScriptRuntime(format!("cannot bind `{}`: {}", name, e)))?;
            scope.push_constant_dynamic(name, value);
        }

        let result = engine
            .eval_with_scope::<Dynamic>(&mut scope, script)
            .map_err(classify)?;

        rhai::serde::from_dynamic::<serde_json::Value>(&result).map_err(|e| Error::MalformedResult {
            index: None,
            reason: format!("script returned a {} that cannot be converted: {}", result.type_name(), e),
        })
    }
}

#[async_trait]
impl ScriptEngine for RhaiEngine {
    fn language(&self) -> &str {
        "rhai"
    }

    async fn run(&self, script: &str, bindings: ScriptBindings) -> Result<serde_json::Value> {
        let engine = self.clone();
        let script = script.to_string();
        tokio::task::spawn_blocking(move || engine.evaluate(&script, bindings))
            .await
            .map_err(|e| Error::ScriptRuntime(format!("script worker failed: {}", e)))?
    }
}

fn classify(err: Box<EvalAltResult>) -> Error {
    match *err {
        EvalAltResult::ErrorParsing(ref kind, pos) => Error::ScriptSyntax(format!("{} ({})", kind, pos)),
        EvalAltResult::ErrorTerminated(ref limit, _) => {
            Error::LimitExceeded(format!("script exceeded the {} ms time limit", limit))
        }
        EvalAltResult::ErrorTooManyOperations(_)
        | EvalAltResult::ErrorStackOverflow(_)
        | EvalAltResult::ErrorDataTooLarge(..) => Error::LimitExceeded(err.to_string()),
        _ => Error::ScriptRuntime(err.to_string()),
    }
}

/// Adapter that runs user code through a [`ScriptEngine`]
pub struct ScriptAdapter<E> {
    engine: E,
}

impl<E: ScriptEngine> ScriptAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

impl ScriptAdapter<RhaiEngine> {
    /// Rhai adapter with the given limits and package allow-list
    pub fn rhai(limits: ExecutionLimits, packages: &PackageSettings) -> Self {
        Self::new(RhaiEngine::new(limits, PackageLoader::new(packages)))
    }
}

#[async_trait]
impl<E: ScriptEngine + 'static> SourceAdapter for ScriptAdapter<E> {
    async fn execute(&self, params: &AdapterParams) -> Result<Vec<LandmarkRecord>> {
        let bindings = ScriptBindings::new(params.variables.clone())
            .constant(BOUNDING_BOX, serde_json::to_value(params.bounding_box)?)
            .constant(BOUNDING_CIRCLE, serde_json::to_value(params.bounding_circle)?);

        let language = self.engine.language();
        tracing::debug!(
            "Running {} script ({} bytes, {} variables)",
            language,
            params.code.len(),
            params.variables.len()
        );

        let started = Instant::now();
        let landmarks = self
            .engine
            .run(&params.code, bindings)
            .await
            .and_then(validate_landmarks)
            .inspect_err(|e| tracing::warn!("{} script failed: {}", language, e))?;

        tracing::info!(
            "{} script returned {} landmarks in {:?}",
            language,
            landmarks.len(),
            started.elapsed()
        );
        Ok(landmarks)
    }
}
