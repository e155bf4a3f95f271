use std::sync::Arc;

use log::{debug, Logger};
use tokio::sync::Mutex;

use super::key_value::KeyValue;
use super::{read_json, write_json};
use crate::errors::StorageError;
use crate::ids;
use crate::place::Place;
use crate::visit::FavoriteItem;

pub(crate) const FAVORITES_KEY: &str = "@favorite_items";

/// The favorites set kept on the device, newest first. Changes made
/// through one store and its clones are serialized.
#[derive(Clone)]
pub struct FavoriteStore {
    logger: Arc<Logger>,
    storage: Arc<dyn KeyValue>,
    writes: Arc<Mutex<()>>,
}

impl FavoriteStore {
    pub fn new(logger: Arc<Logger>, storage: Arc<dyn KeyValue>) -> Self {
        Self {
            logger,
            storage,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub async fn favorites(&self) -> Result<Vec<FavoriteItem>, StorageError> {
        Ok(read_json(&*self.storage, FAVORITES_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Adds `place` to the favorites. If it is already there, the existing
    /// item is returned unchanged.
    pub async fn add(&self, place: &Place) -> Result<FavoriteItem, StorageError> {
        let _writing = self.writes.lock().await;
        let mut favorites = self.favorites().await?;

        if let Some(existing) = favorites.iter().find(|f| f.shrine_temple_id == place.id) {
            debug!(self.logger, "Already a favorite"; "place" => &place.id);
            return Ok(existing.clone());
        }

        let item = FavoriteItem::for_place(ids::favorite_id(), place);
        favorites.insert(0, item.clone());
        write_json(&*self.storage, FAVORITES_KEY, &favorites).await?;

        debug!(self.logger, "Added favorite"; "id" => &item.id, "place" => &place.id);
        Ok(item)
    }

    pub async fn remove(&self, place_id: &str) -> Result<(), StorageError> {
        let _writing = self.writes.lock().await;
        let mut favorites = self.favorites().await?;
        favorites.retain(|f| f.shrine_temple_id != place_id);
        write_json(&*self.storage, FAVORITES_KEY, &favorites).await?;

        debug!(self.logger, "Removed favorite"; "place" => place_id);
        Ok(())
    }

    pub async fn is_favorite(&self, place_id: &str) -> Result<bool, StorageError> {
        Ok(self.get(place_id).await?.is_some())
    }

    pub async fn get(&self, place_id: &str) -> Result<Option<FavoriteItem>, StorageError> {
        let favorites = self.favorites().await?;

        Ok(favorites.into_iter().find(|f| f.shrine_temple_id == place_id))
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        let _writing = self.writes.lock().await;
        self.storage.remove_item(FAVORITES_KEY).await
    }
}
