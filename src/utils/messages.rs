/// Pure functions for formatting user-facing replies (Discord-agnostic)

/// Format a success message with emoji
pub fn format_success(message: &str) -> String {
    format!("✅ {}", message)
}
