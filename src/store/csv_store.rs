use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use csv::ByteRecord;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{MergeReport, RecordStore, StoreBackend, StoreError};
use crate::dedup::{self, DedupKey};
use crate::record::JobRecord;

/// Column order of the record file
pub const HEADER: [&str; 7] = [
    "title",
    "company",
    "location",
    "link",
    "source",
    "description",
    "scraped_at",
];

/// Contents of a record file as seen by a merge
pub struct RecordFile {
    pub records: Vec<JobRecord>,
    /// Rows that did not parse as records, rearranged into `HEADER` column
    /// order and otherwise untouched
    pub unreadable: Vec<ByteRecord>,
}

/// Read a record file, keeping rows that fail to parse as raw fields
///
/// Columns other than `title` and `scraped_at` may be missing (older files
/// were written without `source` or `description`).
pub fn read_record_file(path: &Path) -> Result<RecordFile, StoreError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.byte_headers()?.clone();
    let mut file = RecordFile {
        records: Vec::new(),
        unreadable: Vec::new(),
    };

    for (index, row) in reader.byte_records().enumerate() {
        let row = row?;
        match row.deserialize::<JobRecord>(Some(&headers)) {
            Ok(record) => file.records.push(record),
            Err(e) => {
                // header is line 1
                warn!("Unreadable row {} of {}: {}", index + 2, path.display(), e);
                file.unreadable.push(in_store_columns(&headers, &row));
            }
        }
    }

    debug!(
        "Read {} records ({} unreadable rows) from {}",
        file.records.len(),
        file.unreadable.len(),
        path.display()
    );
    Ok(file)
}

/// Read every parseable record of a CSV record file; unreadable rows are skipped
pub fn read_records(path: &Path) -> Result<Vec<JobRecord>, StoreError> {
    Ok(read_record_file(path)?.records)
}

fn in_store_columns(headers: &ByteRecord, row: &ByteRecord) -> ByteRecord {
    HEADER
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|header| header == column.as_bytes())
                .and_then(|index| row.get(index))
                .unwrap_or_default()
        })
        .collect()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Replace the file at `path` with `records` followed by `unreadable` rows
///
/// The rows go to a temporary file next to the target which is then renamed
/// over it, so readers never observe a half-written file.
pub fn write_records(path: &Path, records: &[JobRecord], unreadable: &[ByteRecord]) -> Result<(), StoreError> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(&mut file);
        writer.write_record(HEADER)?;
        for record in records {
            writer.serialize(record)?;
        }
        for row in unreadable {
            writer.write_byte_record(row)?;
        }
        writer.flush()?;
    }
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;

    debug!(
        "Wrote {} records and {} kept rows to {}",
        records.len(),
        unreadable.len(),
        path.display()
    );
    Ok(())
}

fn load_or_empty(path: &Path) -> Result<RecordFile, StoreError> {
    if path.exists() {
        read_record_file(path)
    } else {
        Ok(RecordFile {
            records: Vec::new(),
            unreadable: Vec::new(),
        })
    }
}

/// The file must be creatable (nearest existing ancestor is a directory) and,
/// when present, readable up to its header row
fn check_usable(path: &Path) -> Result<(), StoreError> {
    let dir = parent_dir(path);
    if let Some(ancestor) = dir.ancestors().find(|candidate| candidate.exists()) {
        if !std::fs::metadata(ancestor)?.is_dir() {
            return Err(std::io::Error::other(format!("{} is not a directory", ancestor.display())).into());
        }
    }

    if path.exists() {
        csv::Reader::from_path(path)?.byte_headers()?;
    }
    Ok(())
}

/// Record set kept in a single CSV file, rewritten in full on every merge
pub struct CsvStore {
    path: PathBuf,
    key: DedupKey,
    // serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>, key: DedupKey) -> Self {
        Self {
            path: path.into(),
            key,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordStore for CsvStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Csv
    }

    async fn load(&self) -> Result<Vec<JobRecord>, StoreError> {
        let path = self.path.clone();
        let file = tokio::task::spawn_blocking(move || load_or_empty(&path)).await??;
        Ok(file.records)
    }

    async fn merge(&self, batch: Vec<JobRecord>) -> Result<MergeReport, StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        let key = self.key;

        let report = tokio::task::spawn_blocking(move || -> Result<MergeReport, StoreError> {
            let existing = load_or_empty(&path)?;
            if !existing.unreadable.is_empty() {
                warn!(
                    "Keeping {} unreadable rows of {} unchanged at the end of the file",
                    existing.unreadable.len(),
                    path.display()
                );
            }

            let merged = dedup::merge(existing.records, batch, key);
            write_records(&path, &merged.records, &existing.unreadable)?;

            Ok(MergeReport {
                total: merged.records.len() + existing.unreadable.len(),
                added: merged.added,
                duplicates: merged.duplicates,
            })
        })
        .await??;

        info!(
            "CSV store {} updated: {} new, {} duplicates dropped, {} total",
            self.path.display(),
            report.added,
            report.duplicates,
            report.total
        );
        Ok(report)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || check_usable(&path)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{timestamp, Source};
    use crate::store::JobFilter;

    fn job(title: &str, link: &str, scraped_at: &str) -> JobRecord {
        JobRecord::new(Source::JobsCh, title, link, timestamp::parse(scraped_at).unwrap())
            .with_company("Acme AG")
            .with_location("Zürich")
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("jobs.csv"), DedupKey::Link);

        assert!(store.load().await.unwrap().is_empty());
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn merge_persists_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("jobs.csv"), DedupKey::Link);
        let batch = vec![
            job("Engineer", "https://www.jobs.ch/a", "2024-01-01 10:00:00"),
            job("Analyst", "https://www.jobs.ch/b", "2024-01-01 10:00:00"),
        ];

        let first = store.merge(batch.clone()).await.unwrap();
        let second = store.merge(batch.clone()).await.unwrap();

        assert_eq!(first, MergeReport { total: 2, added: 2, duplicates: 0 });
        assert_eq!(second, MergeReport { total: 2, added: 0, duplicates: 2 });
        assert_eq!(store.load().await.unwrap(), batch);
    }

    #[tokio::test]
    async fn scraped_at_never_moves_backwards() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("jobs.csv"), DedupKey::Link);

        store
            .merge(vec![job("Engineer", "https://www.jobs.ch/a", "2024-01-01 10:00:00")])
            .await
            .unwrap();
        store
            .merge(vec![job("Engineer", "https://www.jobs.ch/a", "2024-01-05 10:00:00")])
            .await
            .unwrap();

        let records = store.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].scraped_at, timestamp::parse("2024-01-01 10:00:00").unwrap());
    }

    #[tokio::test]
    async fn writes_header_and_stored_timestamp_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let store = CsvStore::new(&path, DedupKey::Link);

        store
            .merge(vec![job("Engineer, Backend", "https://www.jobs.ch/a", "2024-01-01 10:00:00")])
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("title,company,location,link,source,description,scraped_at")
        );
        assert_eq!(
            lines.next(),
            Some("\"Engineer, Backend\",Acme AG,Zürich,https://www.jobs.ch/a,jobs.ch,,2024-01-01 10:00:00")
        );
    }

    #[tokio::test]
    async fn reads_legacy_file_without_source_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        std::fs::write(
            &path,
            "title,company,location,link,scraped_at\n\
             Engineer,Acme AG,Zurich,https://www.jobs.ch/a,2023-11-02 07:00:00\n\
             Broken,Acme AG,Zurich,https://www.jobs.ch/b,not a date\n",
        )
        .unwrap();

        let store = CsvStore::new(&path, DedupKey::Link);
        let records = store.load().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "");
        assert_eq!(records[0].description, "");
        assert_eq!(records[0].link, "https://www.jobs.ch/a");
    }

    #[tokio::test]
    async fn merge_keeps_rows_it_cannot_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        std::fs::write(
            &path,
            "title,company,location,link,source,description,scraped_at\n\
             Engineer,Acme AG,Zürich,https://www.jobs.ch/a,jobs.ch,,2024-01-01 10:00:00\n\
             Analyst,Acme AG,Zürich,https://www.jobs.ch/b,jobs.ch,,\n",
        )
        .unwrap();
        let store = CsvStore::new(&path, DedupKey::Link);

        let report = store
            .merge(vec![job("Tester", "https://www.jobs.ch/c", "2024-01-02 10:00:00")])
            .await
            .unwrap();

        assert_eq!(report, MergeReport { total: 3, added: 1, duplicates: 0 });
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "Analyst,Acme AG,Zürich,https://www.jobs.ch/b,jobs.ch,,");

        // the kept row survives later merges too
        store
            .merge(vec![job("Tester", "https://www.jobs.ch/c", "2024-01-03 10:00:00")])
            .await
            .unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("https://www.jobs.ch/b"));
        assert_eq!(store.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unreadable_legacy_rows_move_to_current_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        std::fs::write(
            &path,
            "title,company,location,link,scraped_at\n\
             Broken,Acme AG,Zurich,https://www.jobs.ch/b,not a date\n",
        )
        .unwrap();
        let store = CsvStore::new(&path, DedupKey::Link);

        store
            .merge(vec![job("Engineer", "https://www.jobs.ch/a", "2024-01-01 10:00:00")])
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.lines().last(),
            Some("Broken,Acme AG,Zurich,https://www.jobs.ch/b,,,not a date")
        );
    }

    #[tokio::test]
    async fn ping_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = CsvStore::new(blocker.join("jobs.csv"), DedupKey::Link);

        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn ping_accepts_missing_parent_that_can_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("data").join("jobs.csv"), DedupKey::Link);

        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn ping_reads_existing_file_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let store = CsvStore::new(&path, DedupKey::Link);
        store
            .merge(vec![job("Engineer", "https://www.jobs.ch/a", "2024-01-01 10:00:00")])
            .await
            .unwrap();

        assert!(store.ping().await.is_ok());

        // a directory where the file should be cannot be opened
        let shadowed = CsvStore::new(dir.path(), DedupKey::Link);
        assert!(shadowed.ping().await.is_err());
    }

    #[tokio::test]
    async fn search_and_get_use_row_positions() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("jobs.csv"), DedupKey::Link);
        store
            .merge(vec![
                job("Engineer", "https://www.jobs.ch/a", "2024-01-01 10:00:00"),
                job("Analyst", "https://www.jobs.ch/b", "2024-01-02 10:00:00"),
                job("Senior Engineer", "https://www.jobs.ch/c", "2024-01-03 10:00:00"),
            ])
            .await
            .unwrap();

        let filter = JobFilter {
            keyword: Some("engineer".to_string()),
            ..JobFilter::default()
        };
        let found = store.search(&filter).await.unwrap();
        let ids: Vec<_> = found.iter().map(|r| r.id).collect();
        assert_eq!(ids, [3, 1]);

        let second = store.get(2).await.unwrap().unwrap();
        assert_eq!(second.record.title, "Analyst");
        assert!(store.get(0).await.unwrap().is_none());
        assert!(store.get(4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("jobs.csv");
        let store = CsvStore::new(&path, DedupKey::Text);

        store
            .merge(vec![job("Engineer", "https://www.jobs.ch/a", "2024-01-01 10:00:00")])
            .await
            .unwrap();

        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }
}
