use std::convert::TryFrom;
use std::path::Path;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn, Logger};

use crate::errors::BackendError;
use crate::place::{Place, RawPlace};

/// The place registry. Searches always scan the whole collection.
pub trait Catalog: Send + Sync {
    /// Returns every place.
    fn scan(&self) -> BoxFuture<Result<Arc<Vec<Place>>, BackendError>>;

    /// Returns the place with the given ID, if any.
    fn get(&self, id: &str) -> BoxFuture<Result<Option<Place>, BackendError>>;
}

/// A catalog held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    places: Arc<Vec<Place>>,
}

impl MemoryCatalog {
    pub fn new(places: Vec<Place>) -> Self {
        Self {
            places: Arc::new(places),
        }
    }

    /// Loads a JSON array of catalog rows, skipping (and logging) rows
    /// that do not validate.
    pub async fn from_json_file(
        logger: &Logger,
        path: impl AsRef<Path>,
    ) -> Result<Self, BackendError> {
        let path = path.as_ref();

        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| BackendError::Io {
                path: path.to_owned(),
                source,
            })?;

        let rows: Vec<RawPlace> =
            serde_json::from_slice(&contents).map_err(|source| BackendError::MalformedFile {
                path: path.to_owned(),
                source,
            })?;

        let places = validate_rows(logger, rows);
        debug!(logger, "Loaded catalog"; "path" => %path.display(), "places" => places.len());

        Ok(Self::new(places))
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Converts raw rows into places, dropping the ones that fail validation.
pub fn validate_rows(logger: &Logger, rows: Vec<RawPlace>) -> Vec<Place> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let id = row.id_label();

            match Place::try_from(row) {
                Ok(place) => Some(place),
                Err(e) => {
                    warn!(logger, "Skipping catalog row"; "index" => index, "id" => id, "error" => %e);
                    None
                }
            }
        })
        .collect()
}

impl Catalog for MemoryCatalog {
    fn scan(&self) -> BoxFuture<Result<Arc<Vec<Place>>, BackendError>> {
        let places = self.places.clone();

        async move { Ok(places) }.boxed()
    }

    fn get(&self, id: &str) -> BoxFuture<Result<Option<Place>, BackendError>> {
        let place = self.places.iter().find(|p| p.id == id).cloned();

        async move { Ok(place) }.boxed()
    }
}
