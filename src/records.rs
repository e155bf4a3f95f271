use std::path::PathBuf;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;

use crate::errors::BackendError;
use crate::ids;
use crate::visit::{NewVisitRecord, VisitRecord, VisitRecordUpdate};

/// Server-side storage for visit records.
pub trait RecordStore: Send + Sync {
    /// Returns every record, most recent visit first.
    fn list(&self) -> BoxFuture<Result<Vec<VisitRecord>, BackendError>>;

    /// Stores a new record under a fresh ID.
    fn create(&self, new: NewVisitRecord) -> BoxFuture<Result<VisitRecord, BackendError>>;

    fn get(&self, id: &str) -> BoxFuture<Result<Option<VisitRecord>, BackendError>>;

    /// Applies a partial update; `None` if there is no such record.
    fn update(
        &self,
        id: &str,
        update: VisitRecordUpdate,
    ) -> BoxFuture<Result<Option<VisitRecord>, BackendError>>;

    /// Deletes a record. Deleting a missing record is not an error.
    fn delete(&self, id: &str) -> BoxFuture<Result<(), BackendError>>;
}

/// Records kept in memory and, if a path is given, written out as a JSON
/// array after every change. A change that cannot be written is not
/// applied.
pub struct JsonRecordStore {
    path: Option<PathBuf>,
    records: RwLock<Vec<VisitRecord>>,
}

impl JsonRecordStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: RwLock::new(vec![]),
        }
    }

    /// Opens the store backed by `path`, starting empty if the file does
    /// not exist yet.
    pub async fn open(path: PathBuf) -> Result<Self, BackendError> {
        let records = match tokio::fs::read(&path).await {
            Ok(contents) => serde_json::from_slice(&contents).map_err(|source| {
                BackendError::MalformedFile {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => vec![],
            Err(source) => return Err(BackendError::Io { path, source }),
        };

        Ok(Self {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    async fn persist(&self, records: &[VisitRecord]) -> Result<(), BackendError> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        let contents = serde_json::to_vec_pretty(records)
            .map_err(|source| BackendError::Serialization { source })?;

        tokio::fs::write(path, contents)
            .await
            .map_err(|source| BackendError::Io {
                path: path.clone(),
                source,
            })
    }
}

// these can be simplified once async functions in traits are stabilized
impl RecordStore for JsonRecordStore {
    fn list(&self) -> BoxFuture<Result<Vec<VisitRecord>, BackendError>> {
        async move {
            let mut records = self.records.read().await.clone();
            records.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));

            Ok(records)
        }
        .boxed()
    }

    fn create(&self, new: NewVisitRecord) -> BoxFuture<Result<VisitRecord, BackendError>> {
        async move {
            let record = VisitRecord::create(ids::visit_record_id(), new);

            let mut records = self.records.write().await;
            let mut changed = records.clone();
            changed.push(record.clone());

            self.persist(&changed).await?;
            *records = changed;

            Ok(record)
        }
        .boxed()
    }

    fn get(&self, id: &str) -> BoxFuture<Result<Option<VisitRecord>, BackendError>> {
        let id = id.to_owned();

        async move {
            let records = self.records.read().await;

            Ok(records.iter().find(|r| r.id == id).cloned())
        }
        .boxed()
    }

    fn update(
        &self,
        id: &str,
        update: VisitRecordUpdate,
    ) -> BoxFuture<Result<Option<VisitRecord>, BackendError>> {
        let id = id.to_owned();

        async move {
            let mut records = self.records.write().await;
            let mut changed = records.clone();

            let updated = match changed.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    record.apply(update);
                    record.clone()
                }
                None => return Ok(None),
            };

            self.persist(&changed).await?;
            *records = changed;

            Ok(Some(updated))
        }
        .boxed()
    }

    fn delete(&self, id: &str) -> BoxFuture<Result<(), BackendError>> {
        let id = id.to_owned();

        async move {
            let mut records = self.records.write().await;

            if records.iter().all(|r| r.id != id) {
                return Ok(());
            }

            let changed: Vec<VisitRecord> =
                records.iter().filter(|r| r.id != id).cloned().collect();

            self.persist(&changed).await?;
            *records = changed;

            Ok(())
        }
        .boxed()
    }
}
