//! `localStorage` behind the core key-value trait.
use accessibility_core::KeyValueStore;
use web_sys::Storage;

use crate::dom;
use crate::error::WebError;

/// Origin storage. Without a backing `Storage` (private mode, disabled
/// storage) reads find nothing and writes fail, so settings last for the
/// page only.
#[derive(Debug, Clone)]
pub struct BrowserStorage {
    storage: Option<Storage>,
}

impl BrowserStorage {
    /// Bind to `localStorage`, or fall back to a detached store.
    #[must_use]
    pub fn local() -> Self {
        match dom::local_storage() {
            Ok(storage) => Self {
                storage: Some(storage),
            },
            Err(err) => {
                log::warn!("settings will not persist: {err}");
                Self { storage: None }
            }
        }
    }

    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    fn storage(&self) -> Result<&Storage, WebError> {
        self.storage.as_ref().ok_or(WebError::Missing("localStorage"))
    }
}

impl KeyValueStore for BrowserStorage {
    type Error = WebError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match &self.storage {
            Some(storage) => Ok(storage.get_item(key)?),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        Ok(self.storage()?.set_item(key, value)?)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        match &self.storage {
            Some(storage) => Ok(storage.remove_item(key)?),
            None => Ok(()),
        }
    }
}
