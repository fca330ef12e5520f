use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Spinner shown while a script runs
pub struct Spinner {
    pb: ProgressBar,
    started: Instant,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stderr().is_term() && !crate::output::is_quiet() {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        Self { pb, started: Instant::now() }
    }

    /// Clear the spinner and return how long it ran, human readable
    pub fn finish(&self) -> String {
        self.pb.finish_and_clear();
        HumanDuration(self.started.elapsed()).to_string()
    }
}
