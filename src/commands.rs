use extension_tester::adapter::default_registry;
use extension_tester::config::{self, TesterConfig};
use extension_tester::output::OutputFormat;
use extension_tester::ui::{self, theme, Icons, Spinner};
use extension_tester::{BoundingBox, LandmarkRecord, Session, VariableBag};
use owo_colors::OwoColorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parse a `key=value` variable argument
pub fn parse_variable(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

pub struct RunOptions {
    pub script: PathBuf,
    pub adapter: Option<String>,
    pub bbox: Option<BoundingBox>,
    pub variables: Vec<(String, String)>,
    pub variables_file: Option<PathBuf>,
    pub format: OutputFormat,
}

fn read_script(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut code = String::new();
        std::io::stdin().read_to_string(&mut code)?;
        return Ok(code);
    }
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read script {}: {}", path.display(), e))
}

fn load_variables(file: Option<&Path>, overrides: Vec<(String, String)>) -> anyhow::Result<VariableBag> {
    let mut variables = match file {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str::<VariableBag>(&contents)
                .map_err(|e| anyhow::anyhow!("{} must hold a JSON object: {}", path.display(), e))?
        }
        None => VariableBag::new(),
    };
    for (key, value) in overrides {
        variables.set(key, value);
    }
    Ok(variables)
}

/// Run a script through the selected adapter. Returns whether it succeeded.
pub async fn run_script(config: &TesterConfig, options: RunOptions) -> anyhow::Result<bool> {
    let registry = Arc::new(default_registry(config)?);
    let selection = match options.bbox {
        Some(bbox) => bbox,
        None => config.selection.bounding_box()?,
    };
    let mut session = Session::new(registry, selection)?;

    for name in config.default_adapter.iter().chain(options.adapter.iter()) {
        if !session.select_adapter(name) {
            ui::warn(&format!(
                "Unknown adapter '{}', keeping '{}'",
                name,
                session.current_adapter().name
            ));
        }
    }

    session.set_code(read_script(&options.script)?);
    session.set_variables(load_variables(options.variables_file.as_deref(), options.variables)?);

    let adapter = session.current_adapter().clone();
    let circle = session.selection().bounding_circle();
    ui::header(Icons::SCROLL, &format!("Running {} with adapter '{}'", options.script.display(), adapter.name));
    ui::info(
        "Bounding circle",
        &format!("({:.5}, {:.5}) r={:.3} km", circle.center.lat, circle.center.lng, circle.radius),
    );
    if !session.variables().is_empty() {
        ui::info("Variables", &session.variables().keys().collect::<Vec<_>>().join(", "));
    }

    let spinner = Spinner::new(&format!("Executing {} script", adapter.language));
    let outcome = session.run().await;
    let elapsed = spinner.finish();

    match outcome {
        Ok(landmarks) => {
            match options.format {
                OutputFormat::Json => println!("{}", session.result()),
                OutputFormat::Text => print_landmarks(&landmarks),
            }
            if !extension_tester::output::is_quiet() {
                ui::success(&format!("{} landmarks in {}", landmarks.len(), elapsed));
            }
            Ok(true)
        }
        Err(_) => {
            ui::error(session.result());
            Ok(false)
        }
    }
}

fn print_landmarks(landmarks: &[LandmarkRecord]) {
    if landmarks.is_empty() {
        println!("{}", ui::muted("No landmarks returned."));
        return;
    }
    for landmark in landmarks {
        println!(
            "{} {} ({:.6}, {:.6})",
            Icons::PIN,
            landmark.name.style(theme().landmark.clone()),
            landmark.lat,
            landmark.lng
        );
        if !landmark.types.is_empty() {
            ui::summary_row("types:", &landmark.types.join(", "));
        }
        if !landmark.description.is_empty() {
            ui::summary_row("about:", &landmark.description);
        }
    }
}

pub fn run_circle(bbox: BoundingBox, format: OutputFormat) -> anyhow::Result<()> {
    let circle = bbox.bounding_circle();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&circle)?),
        OutputFormat::Text => {
            println!("{} center: {}, {}", Icons::CIRCLE, circle.center.lat, circle.center.lng);
            println!("   radius: {} km", circle.radius);
        }
    }
    Ok(())
}

pub fn run_adapters(config: &TesterConfig) -> anyhow::Result<()> {
    let registry = default_registry(config)?;
    let default = config
        .default_adapter
        .as_deref()
        .filter(|name| registry.find_adapter(name).is_some())
        .or_else(|| registry.default_adapter().map(|a| a.name.as_str()))
        .unwrap_or_default()
        .to_string();

    ui::header(Icons::PLUG, "Registered adapters");
    println!("{}", ui::adapter_table(&registry, &default));

    let packages = &config.packages.allowed;
    ui::section("Script packages");
    if packages.is_empty() {
        println!("  {}", ui::muted("none"));
    } else {
        for name in packages {
            ui::summary_row("require:", &format!("\"{}\"", name));
        }
    }
    Ok(())
}

pub fn run_init(path: &Path, force: bool) -> anyhow::Result<()> {
    config::write_config(path, &TesterConfig::default(), force)?;
    ui::success(&format!("Wrote default config to {}", path.display()));
    Ok(())
}
