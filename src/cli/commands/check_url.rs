use crate::cli::types::Commands;
use crate::config::Settings;
use crate::toc::check_site;

pub fn handle_check_url_command(command: &Commands) {
    if let Commands::CheckUrl { url, config } = command {
        match super::settings_from(config.as_ref()) {
            Ok(settings) => println!("{}", check_url(url, &settings)),
            Err(e) => log::error!("Failed to load settings: {}", e),
        }
    }
}

/// One-line verdict of the site gate for `url`
pub fn check_url(url: &str, settings: &Settings) -> String {
    match check_site(url, settings) {
        Some(reason) => format!("{}: inactive, {}", url, reason),
        None => format!("{}: allowed", url),
    }
}
