use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::record::JobRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Company,
    Location,
    Link,
    Source,
    Description,
}

impl Field {
    fn value(self, record: &JobRecord) -> &str {
        match self {
            Field::Title => &record.title,
            Field::Company => &record.company,
            Field::Location => &record.location,
            Field::Link => &record.link,
            Field::Source => &record.source,
            Field::Description => &record.description,
        }
    }
}

/// Which fields make two records the same posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupKey {
    /// The posting URL alone
    #[default]
    Link,
    /// title, company, location, source
    Text,
    /// title, company, location, link, source
    TextAndLink,
    /// title, company, location, source, description
    TextAndDescription,
}

impl DedupKey {
    fn fields(self) -> &'static [Field] {
        match self {
            DedupKey::Link => &[Field::Link],
            DedupKey::Text => &[Field::Title, Field::Company, Field::Location, Field::Source],
            DedupKey::TextAndLink => &[
                Field::Title,
                Field::Company,
                Field::Location,
                Field::Link,
                Field::Source,
            ],
            DedupKey::TextAndDescription => &[
                Field::Title,
                Field::Company,
                Field::Location,
                Field::Source,
                Field::Description,
            ],
        }
    }

    /// Identity of `record` under this key; equal identities are duplicates
    pub fn identity(self, record: &JobRecord) -> Vec<String> {
        self.fields()
            .iter()
            .map(|field| field.value(record).to_string())
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DedupKey::Link => "link",
            DedupKey::Text => "text",
            DedupKey::TextAndLink => "text+link",
            DedupKey::TextAndDescription => "text+description",
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown dedup key '{0}', expected one of: link, text, text+link, text+description")]
pub struct UnknownDedupKey(pub String);

impl FromStr for DedupKey {
    type Err = UnknownDedupKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "link" => Ok(DedupKey::Link),
            "text" => Ok(DedupKey::Text),
            "text+link" => Ok(DedupKey::TextAndLink),
            "text+description" => Ok(DedupKey::TextAndDescription),
            other => Err(UnknownDedupKey(other.to_string())),
        }
    }
}

/// Result of merging a batch into an existing record set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    /// Surviving records: existing ones first, then new ones, in input order
    pub records: Vec<JobRecord>,
    /// Records from the batch that were kept
    pub added: usize,
    /// Records dropped from either side
    pub duplicates: usize,
}

impl Merged {
    /// The batch records that survived the merge
    pub fn new_records(&self) -> &[JobRecord] {
        &self.records[self.records.len() - self.added..]
    }
}

/// Concatenate `existing` and `batch`, keeping the first record per identity
pub fn merge(existing: Vec<JobRecord>, batch: Vec<JobRecord>, key: DedupKey) -> Merged {
    let mut seen = HashSet::with_capacity(existing.len() + batch.len());
    let mut records = Vec::with_capacity(existing.len() + batch.len());
    let mut duplicates = 0;

    for record in existing {
        if seen.insert(key.identity(&record)) {
            records.push(record);
        } else {
            duplicates += 1;
        }
    }

    let mut added = 0;
    for record in batch {
        if seen.insert(key.identity(&record)) {
            records.push(record);
            added += 1;
        } else {
            duplicates += 1;
        }
    }

    Merged {
        records,
        added,
        duplicates,
    }
}
