//! Colored status output and progress reporting
//!
//! Uses owo-colors for terminal colors and indicatif for progress bars.
//! Colors are only emitted when stderr is a terminal.
//!
//! Every line goes to stderr: the helper binaries print their result on
//! stdout and CI scripts capture it with `$(...)`.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Stream, Style};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Standard spinner characters
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard tick interval for spinners
const TICK_INTERVAL_MS: u64 = 80;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable `debug` output
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

/// Whether `debug` output is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Apply `style` when stderr supports colors.
///
/// Piped CI logs get plain text.
fn paint(text: &str, style: Style) -> String {
    text.if_supports_color(Stream::Stderr, |t| t.style(style))
        .to_string()
}

/// Print an action header (blue, bold)
/// Example: "==> Converting R-swat-1.6.0.tar.gz"
pub fn action(message: &str) {
    eprintln!(
        "{} {}",
        paint("==>", Style::new().blue().bold()),
        paint(message, Style::new().bold())
    );
}

/// Print an action with a counter (cyan)
/// Example: "(1/5) Building r-base 3.5.1"
pub fn action_numbered(current: usize, total: usize, message: &str) {
    eprintln!(
        "{} {}",
        paint(&format!("({}/{})", current, total), Style::new().cyan()),
        paint(message, Style::new().bold())
    );
}

/// Print a sub-action (cyan arrow)
/// Example: "  -> discover"
pub fn sub_action(phase: &str) {
    eprintln!("  {} {}", paint("->", Style::new().cyan()), phase);
}

/// Print a detail line (dimmed)
pub fn detail(message: &str) {
    eprintln!("     {}", paint(message, Style::new().dimmed()));
}

/// Print a command line about to be executed
/// Example: "> conda build -q --no-test ..."
pub fn command(line: &str) {
    eprintln!("{} {}", paint(">", Style::new().dimmed()), line);
}

/// Print a success message (green)
pub fn success(message: &str) {
    eprintln!(
        "{} {}",
        paint("==>", Style::new().green().bold()),
        paint(message, Style::new().green())
    );
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    eprintln!("{} {}", paint("::", Style::new().cyan()), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        paint("warning:", Style::new().yellow().bold()),
        paint(message, Style::new().yellow())
    );
}

/// Print an error message.
///
/// CI scripts match on `ERROR: <message>`, so only the prefix is colored.
pub fn error(message: &str) {
    eprintln!("{} {}", paint("ERROR:", Style::new().red().bold()), message);
}

/// Print a debug message, only shown in verbose mode
pub fn debug(message: &str) {
    if is_verbose() {
        eprintln!(
            "{} {}",
            paint("debug:", Style::new().magenta()),
            paint(message, Style::new().dimmed())
        );
    }
}

/// Create a spinner with standard styling
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("     {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Switch a spinner to byte tracking once the total size is known.
pub fn upgrade_to_bytes(pb: &ProgressBar, total_bytes: u64) {
    pb.set_length(total_bytes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("     {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸━"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_creation() {
        let pb = spinner("Building");
        pb.finish_and_clear();
    }

    #[test]
    fn test_upgrade_to_bytes_sets_length() {
        let pb = spinner("downloading");
        upgrade_to_bytes(&pb, 1024);
        assert_eq!(pb.length(), Some(1024));
        pb.finish_and_clear();
    }

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
