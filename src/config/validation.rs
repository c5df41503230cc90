use log::warn;

use crate::config::defaults::HEADING_TAGS;
use crate::config::Settings;
use crate::utils::error::{TocError, TocResult};

/// Validate the settings
pub fn validate_settings(settings: &Settings) -> TocResult<()> {
    validate_supported_headings(settings)?;
    validate_thresholds(settings);

    if settings.update_delay == 0 {
        warn!("updateDelay is 0, every relevant page change rebuilds immediately");
    }

    Ok(())
}

/// Every supported tag must be one the extractor can parse a level from
fn validate_supported_headings(settings: &Settings) -> TocResult<()> {
    for tag in &settings.supported_headings {
        if !HEADING_TAGS.contains(&tag.to_lowercase().as_str()) {
            return Err(TocError::Config(format!(
                "Unsupported heading tag: {}", tag
            )));
        }
    }

    if settings.supported_headings.is_empty() {
        warn!("No supported headings configured, the overlay will never activate");
    }

    Ok(())
}

fn validate_thresholds(settings: &Settings) {
    if settings.min_headings == 0 {
        warn!("minHeadings is 0, pages without headings pass the content gate");
    }

    if settings.min_text_length > 100_000 {
        warn!("minTextLength is unusually large: {}", settings.min_text_length);
    }
}
