//! Storage kept on the user's device: visit records and favorites over
//! a string key/value store.

use std::sync::Arc;

use log::Logger;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::StorageError;
use crate::path::{build_paths, GroupBy, VisitPath};
use crate::place::Place;
use crate::statistics::{aggregate, VisitStatistics};
use crate::status::{compute_status, FavoriteMode, VisitStatus};
use crate::visit::{FavoriteItem, VisitRecord};

mod favorites;
mod key_value;
mod visits;

pub use favorites::FavoriteStore;
pub use key_value::{FileKeyValue, KeyValue, MemoryKeyValue};
pub use visits::{LocalVisitStore, StorageInfo};

async fn read_json<T: DeserializeOwned>(
    storage: &dyn KeyValue,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get_item(key).await? {
        Some(data) => serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_owned(),
                source,
            }),
        None => Ok(None),
    }
}

async fn write_json<T: Serialize + ?Sized>(
    storage: &dyn KeyValue,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let data =
        serde_json::to_string(value).map_err(|source| StorageError::Serialization { source })?;

    storage.set_item(key, data).await
}

/// Both device stores over one key/value backend.
#[derive(Clone)]
pub struct LocalStore {
    pub visits: LocalVisitStore,
    pub favorites: FavoriteStore,
}

impl LocalStore {
    pub fn new(logger: Arc<Logger>, storage: Arc<dyn KeyValue>) -> Self {
        Self {
            visits: LocalVisitStore::new(logger.clone(), storage.clone()),
            favorites: FavoriteStore::new(logger, storage),
        }
    }

    /// Reads records and favorites together so that every view derived
    /// from the snapshot agrees.
    pub async fn snapshot(&self) -> Result<Snapshot, StorageError> {
        let visit_records = self.visits.visit_records().await?;
        let favorites = self.favorites.favorites().await?;

        Ok(Snapshot {
            visit_records,
            favorites,
        })
    }
}

/// Records and favorites as read at one moment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub visit_records: Vec<VisitRecord>,
    pub favorites: Vec<FavoriteItem>,
}

impl Snapshot {
    pub fn status<'a>(&'a self, place: &Place) -> VisitStatus<'a> {
        compute_status(place, &self.visit_records, &self.favorites)
    }

    pub fn statistics(&self, places: &[Place], mode: FavoriteMode) -> VisitStatistics {
        aggregate(places, &self.visit_records, &self.favorites, mode)
    }

    pub fn paths<'a>(&'a self, places: &'a [Place], group_by: Option<GroupBy>) -> Vec<VisitPath<'a>> {
        build_paths(&self.visit_records, places, group_by)
    }
}
