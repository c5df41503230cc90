use crate::config::types::{PositionMode, Theme};

/// Store key holding the settings bundle
pub const SETTINGS_KEY: &str = "tocSettings";

/// Store key holding the last drag-committed overlay position
pub const POSITION_KEY: &str = "tocPosition";

/// Every heading tag the engine knows how to parse a level from
pub const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Default enabled flag
pub fn default_enabled() -> bool {
    true
}

/// Default minimum number of qualifying headings
pub fn default_min_headings() -> usize {
    3
}

/// Default minimum main-content text length, in characters
pub fn default_min_text_length() -> usize {
    1000
}

/// Default heading tags to collect
pub fn default_supported_headings() -> Vec<String> {
    HEADING_TAGS.iter().map(|t| t.to_string()).collect()
}

/// Default collapse state of a freshly built overlay
pub fn default_auto_collapse() -> bool {
    false
}

pub fn default_theme() -> Theme {
    Theme::Auto
}

pub fn default_position() -> PositionMode {
    PositionMode::Smart
}

/// Default rebuild debounce delay in milliseconds
pub fn default_update_delay() -> u64 {
    300
}

/// Default excluded sites: browser-internal schemes, then admin/login/dashboard paths.
///
/// Patterns are searched anywhere in the URL, see `toc::gate::pattern_to_regex`.
pub fn default_excluded_sites() -> Vec<String> {
    vec![
        "chrome://*".to_string(),
        "chrome-extension://*".to_string(),
        "moz-extension://*".to_string(),
        "edge://*".to_string(),
        "about:*".to_string(),
        "*/wp-admin*".to_string(),
        "*/admin/*".to_string(),
        "*/login*".to_string(),
        "*/dashboard*".to_string(),
    ]
}
