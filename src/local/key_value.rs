use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;

use crate::errors::StorageError;

/// An asynchronous string key/value store, as offered by the device.
pub trait KeyValue: Send + Sync {
    fn get_item(&self, key: &str) -> BoxFuture<Result<Option<String>, StorageError>>;

    fn set_item(&self, key: &str, value: String) -> BoxFuture<Result<(), StorageError>>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> BoxFuture<Result<(), StorageError>>;
}

#[derive(Debug, Default)]
pub struct MemoryKeyValue {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValue for MemoryKeyValue {
    fn get_item(&self, key: &str) -> BoxFuture<Result<Option<String>, StorageError>> {
        let key = key.to_owned();

        async move { Ok(self.items.read().await.get(&key).cloned()) }.boxed()
    }

    fn set_item(&self, key: &str, value: String) -> BoxFuture<Result<(), StorageError>> {
        let key = key.to_owned();

        async move {
            self.items.write().await.insert(key, value);
            Ok(())
        }
        .boxed()
    }

    fn remove_item(&self, key: &str) -> BoxFuture<Result<(), StorageError>> {
        let key = key.to_owned();

        async move {
            self.items.write().await.remove(&key);
            Ok(())
        }
        .boxed()
    }
}

/// Stores each key as a file of the same name in a directory.
#[derive(Clone, Debug)]
pub struct FileKeyValue {
    directory: PathBuf,
}

impl FileKeyValue {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_owned(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(key)
    }
}

fn io_error(key: String) -> impl FnOnce(std::io::Error) -> StorageError {
    move |source| StorageError::Io { key, source }
}

impl KeyValue for FileKeyValue {
    fn get_item(&self, key: &str) -> BoxFuture<Result<Option<String>, StorageError>> {
        let key = key.to_owned();
        let path = self.path_for(&key);

        async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_error(key)(e)),
            }
        }
        .boxed()
    }

    fn set_item(&self, key: &str, value: String) -> BoxFuture<Result<(), StorageError>> {
        let key = key.to_owned();
        let path = self.path_for(&key);
        let directory = self.directory.clone();

        async move {
            tokio::fs::create_dir_all(&directory)
                .await
                .map_err(io_error(key.clone()))?;

            tokio::fs::write(&path, value).await.map_err(io_error(key))
        }
        .boxed()
    }

    fn remove_item(&self, key: &str) -> BoxFuture<Result<(), StorageError>> {
        let key = key.to_owned();
        let path = self.path_for(&key);

        async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(io_error(key)(e)),
            }
        }
        .boxed()
    }
}
