mod analyze;
mod check_url;
mod defaults;
mod settings;

pub use analyze::{analyze_snapshot, handle_analyze_command};
pub use check_url::{check_url, handle_check_url_command};
pub use defaults::{handle_defaults_command, render_settings};
pub use settings::handle_settings_command;

use std::path::PathBuf;

use crate::config::{self, Settings};
use crate::utils::error::TocResult;

/// Settings from an optional file, the defaults otherwise
fn settings_from(config: Option<&PathBuf>) -> TocResult<Settings> {
    match config {
        Some(path) => {
            log::debug!("Loading settings from {}", path.display());
            config::load_settings_file(path)
        }
        None => Ok(Settings::default()),
    }
}
