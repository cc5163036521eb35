use std::path::Path;

use tracing::info;

use crate::store::{csv_store, MergeReport, RecordStore, StoreError};

/// Merge the records of a CSV record file into `store`
///
/// The file uses the store's own columns; files written before `source`
/// and `description` existed are accepted too.
pub async fn import_csv(path: &Path, store: &dyn RecordStore) -> Result<MergeReport, StoreError> {
    let owned = path.to_path_buf();
    let records = tokio::task::spawn_blocking(move || csv_store::read_records(&owned)).await??;

    info!("Importing {} records from {}", records.len(), path.display());
    let report = store.merge(records).await?;

    info!(
        "Import finished: {} added, {} skipped as duplicates, {} stored",
        report.added, report.duplicates, report.total
    );
    Ok(report)
}
