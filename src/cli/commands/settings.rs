use std::path::PathBuf;

use crate::bridge::{load_settings, FileStore, SettingsStore};
use crate::cli::types::{Commands, Format};
use crate::config::{self, SETTINGS_KEY};
use crate::utils::error::TocResult;

pub async fn handle_settings_command(command: &Commands) {
    if let Commands::Settings { store, set } = command {
        match run(store.as_ref(), set.as_ref()).await {
            Ok(output) => println!("{}", output),
            Err(e) => log::error!("Settings command failed: {}", e),
        }
    }
}

async fn run(store: Option<&PathBuf>, set: Option<&PathBuf>) -> TocResult<String> {
    let store = match store {
        Some(path) => FileStore::new(path),
        None => FileStore::default_location()?,
    };

    if let Some(file) = set {
        let settings = config::load_settings_file(file)?;
        store.set(SETTINGS_KEY, serde_json::to_value(&settings)?).await?;
        log::info!("Saved settings to {}", store.path().display());
    }

    let settings = load_settings(&store).await;
    super::render_settings(&settings, Format::Yaml)
}
