use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::cli::types::Commands;
use crate::dom::{Document, SnapshotDocument};
use crate::toc::{Side, SmartToc};
use crate::utils::error::TocResult;

pub fn handle_analyze_command(command: &Commands) {
    if let Commands::Analyze { snapshot, config, html, json } = command {
        match analyze_snapshot(snapshot, config.as_ref(), *html, *json) {
            Ok(output) => println!("{}", output),
            Err(e) => log::error!("Failed to analyze {}: {}", snapshot.display(), e),
        }
    }
}

/// Run the full pipeline on a snapshot and describe the outcome
pub fn analyze_snapshot(
    snapshot: &Path,
    config: Option<&PathBuf>,
    html: bool,
    as_json: bool,
) -> TocResult<String> {
    let settings = super::settings_from(config)?;
    let mut doc = SnapshotDocument::load(snapshot)?;
    let mut toc = SmartToc::new(settings);
    toc.rebuild(&mut doc)?;

    let status = toc.status();
    let placement = toc.overlay().map(|overlay| *overlay.placement());
    let markup = if html {
        doc.overlay().map(|mounted| mounted.rendered.html.clone())
    } else {
        None
    };

    if as_json {
        let value = json!({
            "url": doc.url(),
            "status": status,
            "headings": toc.headings(),
            "activeIndex": toc.is_active().then(|| toc.active_index()),
            "placement": placement,
            "html": markup,
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "URL: {}", doc.url());
    match (&status.reason, status.stats) {
        (None, Some(stats)) => {
            let _ = writeln!(
                out,
                "Status: active ({} headings, {} characters)",
                stats.headings_count, stats.text_length
            );
        }
        (Some(reason), _) => {
            let _ = writeln!(out, "Status: inactive, {}", reason);
        }
        (None, None) => {
            let _ = writeln!(out, "Status: inactive");
        }
    }

    if !toc.headings().is_empty() {
        let _ = writeln!(out, "Headings:");
        for heading in toc.headings() {
            let indent = "  ".repeat(heading.level as usize);
            let marker = if heading.index == toc.active_index() { "*" } else { " " };
            let _ = writeln!(out, "{}{}[{}] {} (#{})", indent, marker, heading.index, heading.text, heading.id);
        }
    }

    if let Some(placement) = placement {
        let side = match placement.side {
            Side::Left => "left",
            Side::Right => "right",
        };
        let _ = writeln!(
            out,
            "Placement: {} edge at ({}, {}){}",
            side,
            placement.position.x,
            placement.position.y,
            if placement.floating { ", floating" } else { "" }
        );
    }

    if let Some(markup) = markup {
        let _ = writeln!(out, "\n{}", markup);
    }

    Ok(out.trim_end().to_string())
}
