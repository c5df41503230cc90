use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Color scheme of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Follow the page / system preference
    #[default]
    Auto,
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Auto => "auto",
            Theme::Light => "light",
            Theme::Dark => "dark",
        };
        write!(f, "{}", name)
    }
}

/// Where the overlay docks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    /// Pick a side by looking at fixed/sticky obstacles
    #[default]
    Smart,
    Left,
    Right,
}

/// User preferences for the table of contents.
///
/// Serialized with the camelCase keys the settings store and the message
/// channel use. Missing keys take their default, so deserializing a partial
/// bundle is a shallow merge over the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Master switch
    #[serde(default = "defaults::default_enabled")]
    pub enabled: bool,

    /// Minimum number of qualifying headings before an overlay is shown
    #[serde(default = "defaults::default_min_headings")]
    pub min_headings: usize,

    /// Minimum main-content text length, in characters
    #[serde(default = "defaults::default_min_text_length")]
    pub min_text_length: usize,

    /// Heading tags to collect, e.g. `["h1", "h2", "h3"]`
    #[serde(default = "defaults::default_supported_headings")]
    pub supported_headings: Vec<String>,

    /// Start freshly built overlays collapsed
    #[serde(default = "defaults::default_auto_collapse")]
    pub auto_collapse: bool,

    #[serde(default = "defaults::default_theme")]
    pub theme: Theme,

    #[serde(default = "defaults::default_position")]
    pub position: PositionMode,

    /// URL patterns where the overlay never activates (`*` is a wildcard)
    #[serde(default = "defaults::default_excluded_sites")]
    pub excluded_sites: Vec<String>,

    /// Rebuild debounce delay in milliseconds
    #[serde(default = "defaults::default_update_delay")]
    pub update_delay: u64,
}

impl Settings {
    pub fn update_delay(&self) -> Duration {
        Duration::from_millis(self.update_delay)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            enabled: defaults::default_enabled(),
            min_headings: defaults::default_min_headings(),
            min_text_length: defaults::default_min_text_length(),
            supported_headings: defaults::default_supported_headings(),
            auto_collapse: defaults::default_auto_collapse(),
            theme: defaults::default_theme(),
            position: defaults::default_position(),
            excluded_sites: defaults::default_excluded_sites(),
            update_delay: defaults::default_update_delay(),
        }
    }
}
