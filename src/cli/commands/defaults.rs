use crate::cli::types::{Commands, Format};
use crate::config::Settings;
use crate::utils::error::{TocError, TocResult};

pub fn handle_defaults_command(command: &Commands) {
    if let Commands::Defaults { format } = command {
        match render_settings(&Settings::default(), *format) {
            Ok(output) => println!("{}", output),
            Err(e) => log::error!("Failed to render default settings: {}", e),
        }
    }
}

/// Serialize settings in the requested format
pub fn render_settings(settings: &Settings, format: Format) -> TocResult<String> {
    match format {
        Format::Yaml => serde_yaml::to_string(settings).map_err(|e| TocError::Config(e.to_string())),
        Format::Json => Ok(serde_json::to_string_pretty(settings)?),
        Format::Toml => toml::to_string_pretty(settings).map_err(|e| TocError::Config(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_render_in_every_format() {
        let settings = Settings::default();

        let yaml = render_settings(&settings, Format::Yaml).unwrap();
        assert!(yaml.contains("minHeadings: 3"));
        assert!(yaml.contains("theme: auto"));

        let json = render_settings(&settings, Format::Json).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);

        let toml = render_settings(&settings, Format::Toml).unwrap();
        assert!(toml.contains("updateDelay = 300"));
    }
}
