use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Suppress banners and status lines; results and errors still print
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("EXTENSION_TESTER_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON, as the harness result pane shows it
    #[default]
    Json,
    /// One line per landmark
    Text,
}
