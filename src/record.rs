use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Job boards the harvester knows how to collect from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    JobsCh,
    Indeed,
    JobScout24,
    JobAgent,
    CareerJet,
    CantonBern,
    Steze,
    IctJobs,
}

impl Source {
    pub const ALL: [Source; 8] = [
        Source::JobsCh,
        Source::Indeed,
        Source::JobScout24,
        Source::JobAgent,
        Source::CareerJet,
        Source::CantonBern,
        Source::Steze,
        Source::IctJobs,
    ];

    /// Identifier stored in the `source` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::JobsCh => "jobs.ch",
            Source::Indeed => "indeed.ch",
            Source::JobScout24 => "jobscout24.ch",
            Source::JobAgent => "jobagent.ch",
            Source::CareerJet => "careerjet.ch",
            Source::CantonBern => "be.ch",
            Source::Steze => "steze.be.ch",
            Source::IctJobs => "ictjobs.ch",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown job source: {0}")]
pub struct UnknownSource(pub String);

impl FromStr for Source {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Source::ALL
            .into_iter()
            .find(|source| source.as_str() == wanted)
            .ok_or_else(|| UnknownSource(s.trim().to_string()))
    }
}

/// A single job posting as persisted by the record stores
///
/// Field order matches the column order of the CSV store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "timestamp")]
    pub scraped_at: NaiveDateTime,
}

impl JobRecord {
    pub fn new(
        source: Source,
        title: impl Into<String>,
        link: impl Into<String>,
        scraped_at: NaiveDateTime,
    ) -> Self {
        Self {
            title: title.into(),
            company: String::new(),
            location: String::new(),
            link: link.into(),
            source: source.as_str().to_string(),
            description: String::new(),
            scraped_at,
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Current local wall-clock time at second precision
///
/// Local time matches the timestamps already present in imported record
/// files, so old and new rows sort on the same clock.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Collapse runs of whitespace into single spaces and trim both ends
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_description(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// `scraped_at` wire format shared by the CSV file and the JSON API
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Accepts the stored format, fractional seconds, and the ISO `T` separator
    pub fn parse(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
    }
}
