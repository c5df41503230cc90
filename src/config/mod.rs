mod types;
mod loader;
mod defaults;
mod validation;

pub use types::*;
pub use defaults::{HEADING_TAGS, POSITION_KEY, SETTINGS_KEY};
pub use loader::{load_settings_file, merge_over_defaults};
pub use validation::validate_settings;
