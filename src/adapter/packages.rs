//! Packages scripts may load with `require(name)`
//!
//! Only packages on the allow-list resolve. Any other name resolves to `()`,
//! so requiring it is harmless and only using it fails.

use rhai::{Dynamic, Engine, EvalAltResult, Map as ScriptMap};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the HTTP client package
pub const HTTP_PACKAGE: &str = "http";

/// Every package the loader knows how to build
pub const KNOWN_PACKAGES: &[&str] = &[HTTP_PACKAGE];

/// Package configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSettings {
    /// Packages scripts may require
    pub allowed: Vec<String>,
    pub http_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            allowed: vec![HTTP_PACKAGE.to_string()],
            http_timeout_secs: 30,
            user_agent: concat!("extension-tester/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Resolves `require(name)` calls against the allow-list
#[derive(Debug, Clone)]
pub struct PackageLoader {
    allowed: Vec<String>,
    http: HttpPackage,
}

impl PackageLoader {
    pub fn new(settings: &PackageSettings) -> Self {
        let allowed = settings
            .allowed
            .iter()
            .filter(|name| {
                let known = KNOWN_PACKAGES.contains(&name.as_str());
                if !known {
                    tracing::warn!("Ignoring unknown package '{}' in allow-list", name);
                }
                known
            })
            .cloned()
            .collect();

        Self {
            allowed,
            http: HttpPackage {
                timeout: Duration::from_secs(settings.http_timeout_secs),
                user_agent: settings.user_agent.clone(),
            },
        }
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed.iter().any(|a| a == name)
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Resolve a package, or `()` when it is not allowed
    pub fn load(&self, name: &str) -> Dynamic {
        if !self.is_allowed(name) {
            tracing::debug!("Script requested unavailable package '{}'", name);
            return Dynamic::UNIT;
        }
        match name {
            HTTP_PACKAGE => Dynamic::from(self.http.clone()),
            _ => Dynamic::UNIT,
        }
    }

    /// Register `require` and the package types with an engine
    pub fn register(&self, engine: &mut Engine) {
        HttpPackage::register(engine);

        let loader = self.clone();
        engine.register_fn("require", move |name: &str| loader.load(name));
    }
}

impl Default for PackageLoader {
    fn default() -> Self {
        Self::new(&PackageSettings::default())
    }
}

/// Blocking HTTP client exposed to scripts as `HttpClient`
///
/// Every method returns `#{ status, data, headers }`. `data` is parsed JSON
/// when the body parses, the raw text otherwise.
#[derive(Debug, Clone)]
pub struct HttpPackage {
    timeout: Duration,
    user_agent: String,
}

type CallResult = Result<Dynamic, Box<EvalAltResult>>;

impl HttpPackage {
    fn register(engine: &mut Engine) {
        engine
            .register_type_with_name::<HttpPackage>("HttpClient")
            .register_fn("get", HttpPackage::get)
            .register_fn("get", HttpPackage::get_with)
            .register_fn("post", HttpPackage::post)
            .register_fn("post", HttpPackage::post_with);
    }

    fn get(&mut self, url: &str) -> CallResult {
        self.get_with(url, ScriptMap::new())
    }

    fn get_with(&mut self, url: &str, options: ScriptMap) -> CallResult {
        let client = self.client()?;
        self.send(client.get(url), &options)
    }

    fn post(&mut self, url: &str, body: Dynamic) -> CallResult {
        self.post_with(url, body, ScriptMap::new())
    }

    fn post_with(&mut self, url: &str, body: Dynamic, options: ScriptMap) -> CallResult {
        let body: serde_json::Value = rhai::serde::from_dynamic(&body)?;
        let client = self.client()?;
        self.send(client.post(url).json(&body), &options)
    }

    fn client(&self) -> Result<reqwest::blocking::Client, Box<EvalAltResult>> {
        reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(http_error)
    }

    fn send(&self, mut request: reqwest::blocking::RequestBuilder, options: &ScriptMap) -> CallResult {
        if let Some(params) = options.get("params") {
            request = request.query(&string_pairs(params, "params")?);
        }
        if let Some(headers) = options.get("headers") {
            for (name, value) in string_pairs(headers, "headers")? {
                request = request.header(name, value);
            }
        }

        let response = request.send().map_err(http_error)?;
        let status = response.status().as_u16() as i64;
        let headers: ScriptMap = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().into(), Dynamic::from(v.to_string())))
            })
            .collect();
        let text = response.text().map_err(http_error)?;
        tracing::debug!("HTTP {} ({} bytes)", status, text.len());

        let data = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(json) => rhai::serde::to_dynamic(json)?,
            Err(_) => Dynamic::from(text),
        };

        let mut result = ScriptMap::new();
        result.insert("status".into(), Dynamic::from(status));
        result.insert("data".into(), data);
        result.insert("headers".into(), Dynamic::from_map(headers));
        Ok(Dynamic::from_map(result))
    }
}

fn http_error(err: reqwest::Error) -> Box<EvalAltResult> {
    format!("http request failed: {}", err).into()
}

fn string_pairs(value: &Dynamic, option: &str) -> Result<Vec<(String, String)>, Box<EvalAltResult>> {
    let map = value
        .read_lock::<ScriptMap>()
        .ok_or_else(|| -> Box<EvalAltResult> { format!("http option `{}` must be a map", option).into() })?;
    Ok(map.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
}
