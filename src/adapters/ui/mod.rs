pub mod admin_view;
pub mod banner;
pub mod markup;
pub mod progress;
pub mod schedule_view;
pub mod tui;

/// Prints the welcome banner and applies the theme for all subsequent inquire prompts.
/// Call once at startup (e.g. in main after tracing init).
pub fn init_ui(base_url: &str) {
    banner::print_welcome(base_url);
    tui::apply_theme();
}
