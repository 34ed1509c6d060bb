// Text Styles
pub static RESET: &str = "\x1b[0m";
pub static BOLD: &str = "\x1b[1m";
pub static DIM: &str = "\x1b[2m";

// Text Colors
pub static RED: &str = "\x1b[31m";
pub static GREEN: &str = "\x1b[32m";
pub static YELLOW: &str = "\x1b[33m";
pub static BRIGHT_CYAN: &str = "\x1b[96m";

/// Wraps text in a style when enabled, returns it untouched otherwise.
pub fn paint(text: &str, style: &str, enabled: bool) -> String {
    if enabled {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}
