use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, info, Logger};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;

use super::key_value::KeyValue;
use super::{read_json, write_json};
use crate::dates;
use crate::errors::StorageError;
use crate::ids;
use crate::place::Place;
use crate::statistics::{record_summary, RecordSummary};
use crate::visit::{NewVisitRecord, VisitRecord, VisitRecordUpdate};

pub(crate) const VISIT_RECORDS_KEY: &str = "@visit_records";
const STORAGE_VERSION_KEY: &str = "@storage_version";
const CURRENT_VERSION: &str = "1.0";

/// The shape written by `export` and accepted by `import`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    version: String,

    #[serde(with = "time::serde::rfc3339")]
    export_date: OffsetDateTime,

    visit_records: Vec<VisitRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub records_count: usize,

    /// Size of the stored records, e.g. `1.5 KB`.
    pub storage_size: String,
}

/// Visit records kept on the device.
///
/// Changes made through one store and its clones are serialized. Separate
/// stores over the same storage are not coordinated.
#[derive(Clone)]
pub struct LocalVisitStore {
    logger: Arc<Logger>,
    storage: Arc<dyn KeyValue>,
    writes: Arc<Mutex<()>>,
}

impl LocalVisitStore {
    pub fn new(logger: Arc<Logger>, storage: Arc<dyn KeyValue>) -> Self {
        Self {
            logger,
            storage,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Records the storage version and, on first run, an empty record list.
    pub async fn initialize(&self) -> Result<(), StorageError> {
        let _writing = self.writes.lock().await;
        let version = self.storage.get_item(STORAGE_VERSION_KEY).await?;

        if version.as_deref() == Some(CURRENT_VERSION) {
            return Ok(());
        }

        info!(self.logger, "Initializing local storage"; "previous_version" => ?version);
        self.storage
            .set_item(STORAGE_VERSION_KEY, CURRENT_VERSION.to_owned())
            .await?;

        if version.is_none() {
            self.ensure_records_array().await?;
        }

        Ok(())
    }

    async fn ensure_records_array(&self) -> Result<(), StorageError> {
        if self.storage.get_item(VISIT_RECORDS_KEY).await?.is_none() {
            self.save(&[]).await?;
        }

        Ok(())
    }

    /// Every record, most recent visit first.
    pub async fn visit_records(&self) -> Result<Vec<VisitRecord>, StorageError> {
        let mut records: Vec<VisitRecord> = read_json(&*self.storage, VISIT_RECORDS_KEY)
            .await?
            .unwrap_or_default();

        records.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));
        debug!(self.logger, "Retrieved visit records"; "count" => records.len());

        Ok(records)
    }

    pub async fn create(&self, new: NewVisitRecord) -> Result<VisitRecord, StorageError> {
        let _writing = self.writes.lock().await;
        let mut records = self.visit_records().await?;
        let record = VisitRecord::create(ids::local_record_id(), new);

        records.insert(0, record.clone());
        self.save(&records).await?;

        debug!(self.logger, "Created visit record"; "id" => &record.id);
        Ok(record)
    }

    pub async fn update(
        &self,
        id: &str,
        update: VisitRecordUpdate,
    ) -> Result<VisitRecord, StorageError> {
        let _writing = self.writes.lock().await;
        let mut records = self.visit_records().await?;

        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_owned()))?;
        record.apply(update);
        let updated = record.clone();

        self.save(&records).await?;

        debug!(self.logger, "Updated visit record"; "id" => id);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let _writing = self.writes.lock().await;
        let mut records = self.visit_records().await?;
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == before {
            return Err(StorageError::NotFound(id.to_owned()));
        }

        self.save(&records).await?;

        debug!(self.logger, "Deleted visit record"; "id" => id);
        Ok(())
    }

    pub async fn records_for_place(&self, place_id: &str) -> Result<Vec<VisitRecord>, StorageError> {
        let records = self.visit_records().await?;

        Ok(records
            .into_iter()
            .filter(|r| r.shrine_temple_id == place_id)
            .collect())
    }

    /// Summarizes the stored records, resolving place types against `places`.
    pub async fn summary(&self, places: &[Place]) -> Result<RecordSummary, StorageError> {
        let records = self.visit_records().await?;

        Ok(record_summary(&records, places))
    }

    /// Serializes every record as pretty-printed JSON.
    pub async fn export(&self) -> Result<String, StorageError> {
        let export = Export {
            version: CURRENT_VERSION.to_owned(),
            export_date: dates::now(),
            visit_records: self.visit_records().await?,
        };

        serde_json::to_string_pretty(&export).map_err(|source| StorageError::Serialization { source })
    }

    /// Adds the records in an export whose IDs are not already stored,
    /// after the existing ones. Returns how many were added.
    pub async fn import(&self, data: &str) -> Result<usize, StorageError> {
        let value: serde_json::Value =
            serde_json::from_str(data).map_err(|_| StorageError::InvalidImport)?;

        let incoming: Vec<VisitRecord> = match value.get("visitRecords") {
            Some(records @ serde_json::Value::Array(_)) => {
                serde_json::from_value(records.clone()).map_err(|_| StorageError::InvalidImport)?
            }
            _ => return Err(StorageError::InvalidImport),
        };

        let _writing = self.writes.lock().await;
        let mut records = self.visit_records().await?;
        let mut known: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();

        let added: Vec<VisitRecord> = incoming
            .into_iter()
            .filter(|r| known.insert(r.id.clone()))
            .collect();

        if added.is_empty() {
            return Ok(0);
        }

        let count = added.len();
        records.extend(added);
        self.save(&records).await?;

        info!(self.logger, "Imported visit records"; "count" => count);
        Ok(count)
    }

    pub async fn storage_info(&self) -> Result<StorageInfo, StorageError> {
        let records_count = self.visit_records().await?.len();
        let bytes = self
            .storage
            .get_item(VISIT_RECORDS_KEY)
            .await?
            .map_or(0, |data| data.len());

        Ok(StorageInfo {
            records_count,
            storage_size: format!("{} KB", kilobytes(bytes)),
        })
    }

    /// Removes every record and the storage version.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let _writing = self.writes.lock().await;
        self.storage.remove_item(VISIT_RECORDS_KEY).await?;
        self.storage.remove_item(STORAGE_VERSION_KEY).await?;

        info!(self.logger, "Cleared local visit records");
        Ok(())
    }

    async fn save(&self, records: &[VisitRecord]) -> Result<(), StorageError> {
        write_json(&*self.storage, VISIT_RECORDS_KEY, records).await
    }
}

/// Kilobytes to one decimal.
fn kilobytes(bytes: usize) -> f64 {
    (bytes as f64 / 1024.0 * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use log::null_logger;
    use serde_json::json;

    use super::*;
    use crate::local::key_value::MemoryKeyValue;
    use crate::visit::fixtures::{date, visit};

    fn store() -> (LocalVisitStore, Arc<MemoryKeyValue>) {
        let storage = Arc::new(MemoryKeyValue::new());

        (
            LocalVisitStore::new(Arc::new(null_logger()), storage.clone()),
            storage,
        )
    }

    fn new_record(place: &str, visit_date: &str) -> NewVisitRecord {
        NewVisitRecord {
            shrine_temple_id: place.to_owned(),
            shrine_temple_name: format!("Place {}", place),
            visit_date: date(visit_date),
            notes: Some("quiet".to_owned()),
            rating: None,
            is_favorite: None,
            has_goshuin: true,
        }
    }

    #[tokio::test]
    async fn initialize_writes_version_and_empty_array() {
        let (store, storage) = store();

        store.initialize().await.unwrap();

        assert_eq!(storage.get_item(STORAGE_VERSION_KEY).await.unwrap(), Some("1.0".to_owned()));
        assert_eq!(storage.get_item(VISIT_RECORDS_KEY).await.unwrap(), Some("[]".to_owned()));

        store.create(new_record("a", "2024-01-01")).await.unwrap();
        store.initialize().await.unwrap();
        assert_eq!(store.visit_records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_creates_are_all_kept() {
        let (store, _) = store();

        let creates = (0..20).map(|i| {
            let store = store.clone();
            async move { store.create(new_record(&format!("p{}", i), "2024-01-01")).await }
        });

        for created in futures::future::join_all(creates).await {
            created.unwrap();
        }

        assert_eq!(store.visit_records().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn create_update_delete() {
        let (store, _) = store();

        let first = store.create(new_record("a", "2024-03-01")).await.unwrap();
        let second = store.create(new_record("b", "2024-01-01")).await.unwrap();
        assert!(first.id.starts_with("local_"));

        let ids: Vec<_> = store.visit_records().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id.clone(), second.id.clone()]);

        let update = VisitRecordUpdate {
            rating: Some(Some(5)),
            ..VisitRecordUpdate::default()
        };
        let updated = store.update(&second.id, update).await.unwrap();
        assert_eq!(updated.rating, Some(5));
        assert_eq!(updated.notes.as_deref(), Some("quiet"));

        let missing = store.update("nope", VisitRecordUpdate::default()).await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));

        store.delete(&first.id).await.unwrap();
        assert!(matches!(store.delete(&first.id).await, Err(StorageError::NotFound(_))));

        assert_eq!(store.records_for_place("b").await.unwrap().len(), 1);
        assert!(store.records_for_place("a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_data_is_reported() {
        let (store, storage) = store();
        storage.set_item(VISIT_RECORDS_KEY, "{".to_owned()).await.unwrap();

        assert!(matches!(store.visit_records().await, Err(StorageError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn export_then_import_skips_known_ids() {
        let (source, _) = store();
        source.create(new_record("a", "2024-01-01")).await.unwrap();
        source.create(new_record("b", "2024-02-01")).await.unwrap();

        let exported = source.export().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["visitRecords"].as_array().map(Vec::len), Some(2));

        let (target, _) = store();
        assert_eq!(target.import(&exported).await.unwrap(), 2);
        assert_eq!(target.import(&exported).await.unwrap(), 0);
        assert_eq!(target.visit_records().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn import_appends_after_existing_records() {
        let (store, storage) = store();
        let existing = store.create(new_record("a", "2024-01-01")).await.unwrap();

        let payload = json!({ "visitRecords": [visit("imported", "b", "2024-06-01", false)] });
        assert_eq!(store.import(&payload.to_string()).await.unwrap(), 1);

        let raw: Vec<VisitRecord> =
            serde_json::from_str(&storage.get_item(VISIT_RECORDS_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(raw[0].id, existing.id);
        assert_eq!(raw[1].id, "imported");
    }

    #[tokio::test]
    async fn import_rejects_payloads_without_records() {
        let (store, _) = store();

        for payload in &["{}", r#"{"visitRecords": {}}"#, "not json"] {
            assert!(matches!(store.import(payload).await, Err(StorageError::InvalidImport)));
        }
    }

    #[tokio::test]
    async fn storage_info_and_clear() {
        let (store, _) = store();

        let info = store.storage_info().await.unwrap();
        assert_eq!(info, StorageInfo { records_count: 0, storage_size: "0 KB".to_owned() });

        store.initialize().await.unwrap();
        store.create(new_record("a", "2024-01-01")).await.unwrap();
        assert_eq!(store.storage_info().await.unwrap().records_count, 1);

        store.clear().await.unwrap();
        assert!(store.visit_records().await.unwrap().is_empty());
    }

    #[test]
    fn kilobytes_round_to_one_decimal() {
        assert_eq!(kilobytes(0), 0.0);
        assert_eq!(kilobytes(1536), 1.5);
        assert_eq!(format!("{}", kilobytes(2048)), "2");
    }
}
