use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::collectors::SearchQuery;
use crate::record::Source;

/// One `site|keyword|location` line of the sources file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub site: Source,
    pub query: SearchQuery,
    pub line: usize,
}

impl fmt::Display for SourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}",
            self.site,
            display_or_any(&self.query.keyword),
            display_or_any(&self.query.location)
        )
    }
}

fn display_or_any(value: &str) -> &str {
    if value.is_empty() {
        "ANY"
    } else {
        value
    }
}

/// Why a line of the sources file was skipped
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SourceLineError {
    #[error("expected 3 '|'-separated fields, found {0}")]
    FieldCount(usize),

    #[error(transparent)]
    UnknownSite(#[from] crate::record::UnknownSource),
}

fn parse_line(raw: &str, line: usize) -> Result<SourceEntry, SourceLineError> {
    let parts: Vec<&str> = raw.split('|').collect();
    let [site, keyword, location] = parts.as_slice() else {
        return Err(SourceLineError::FieldCount(parts.len()));
    };

    Ok(SourceEntry {
        site: site.parse()?,
        query: SearchQuery::new(keyword.trim(), location.trim()),
        line,
    })
}

/// Parse the sources file format, skipping (and logging) invalid lines
pub fn parse_sources(text: &str) -> Vec<SourceEntry> {
    let mut entries = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let raw = line.trim();

        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        match parse_line(raw, line_number) {
            Ok(entry) => {
                info!("Loaded source: {}", entry);
                entries.push(entry);
            }
            Err(e) => warn!("Skipping invalid source line {}: '{}' ({})", line_number, raw, e),
        }
    }

    entries
}

/// Load the sources file; a missing or unreadable file yields no sources
pub fn load_sources(path: &Path) -> Vec<SourceEntry> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not read sources file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let entries = parse_sources(&text);
    info!("Total sources loaded from {}: {}", path.display(), entries.len());
    entries
}
