//! Preference store over a string key-value backend.
use crate::error::StoreError;
use crate::prefs::{AccessibilityPreferences, Record, SpeechPreferences};

/// Trait for abstracting the persistent per-origin key-value store.
/// Platform-specific implementations should provide this.
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Overwrite the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Delete `key`; deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Sole durable owner of both preference records.
///
/// Saves are last-writer-wins: every record is serialized in full and
/// replaces whatever was stored before.
#[derive(Debug, Clone)]
pub struct PreferenceStore<K> {
    backend: K,
    speech_defaults: SpeechPreferences,
}

impl<K: KeyValueStore> PreferenceStore<K> {
    pub fn new(backend: K) -> Self {
        Self {
            backend,
            speech_defaults: SpeechPreferences::default(),
        }
    }

    #[must_use]
    pub const fn with_speech_defaults(mut self, defaults: SpeechPreferences) -> Self {
        self.speech_defaults = defaults;
        self
    }

    pub const fn backend(&self) -> &K {
        &self.backend
    }

    /// Strict load: `Ok(None)` when absent, an error when unreadable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored JSON is malformed.
    pub fn try_load<R: Record>(&self) -> Result<Option<R>, StoreError> {
        let Some(raw) = self
            .backend
            .get(R::KEY)
            .map_err(|e| StoreError::backend(&e))?
        else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                key: R::KEY,
                source,
            })
    }

    /// Lenient load that never fails: absent or unreadable records yield
    /// the record's default.
    pub fn load<R: Record>(&self) -> R {
        match self.try_load::<R>() {
            Ok(Some(record)) => record,
            Ok(None) => R::default(),
            Err(err) => {
                log::warn!("falling back to defaults for `{}`: {err}", R::KEY);
                R::default()
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails or the backend rejects the write.
    pub fn save<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record).map_err(|source| StoreError::Serialize {
            key: R::KEY,
            source,
        })?;
        self.backend
            .set(R::KEY, &raw)
            .map_err(|e| StoreError::backend(&e))
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal.
    pub fn clear<R: Record>(&self) -> Result<(), StoreError> {
        self.backend
            .remove(R::KEY)
            .map_err(|e| StoreError::backend(&e))
    }

    /// Remove both records, logging (not propagating) backend failures.
    pub fn clear_all(&self) {
        if let Err(err) = self.clear::<AccessibilityPreferences>() {
            log::warn!("could not clear accessibility preferences: {err}");
        }
        if let Err(err) = self.clear::<SpeechPreferences>() {
            log::warn!("could not clear speech preferences: {err}");
        }
    }

    pub fn accessibility(&self) -> AccessibilityPreferences {
        self.load()
    }

    /// Speech parameters as they stand right now, clamped into range.
    pub fn speech(&self) -> SpeechPreferences {
        match self.try_load::<SpeechPreferences>() {
            Ok(Some(prefs)) => prefs.clamped(self.speech_defaults),
            Ok(None) => self.speech_defaults,
            Err(err) => {
                log::warn!("falling back to default speech settings: {err}");
                self.speech_defaults
            }
        }
    }

    pub const fn speech_defaults(&self) -> SpeechPreferences {
        self.speech_defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::MemoryStore;
    use crate::prefs::{ACCESSIBILITY_KEY, SPEECH_KEY, SpeechPreset};

    fn full_record() -> AccessibilityPreferences {
        AccessibilityPreferences {
            font_increase_level: 0,
            font_decrease_level: 2,
            high_contrast: true,
            invert_colors: false,
            saturate_colors: true,
            highlight_links: true,
            text_spacing: false,
            line_height: true,
            hide_images: true,
            screen_reader: true,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = PreferenceStore::new(MemoryStore::default());
        store.save(&full_record()).unwrap();
        assert_eq!(store.load::<AccessibilityPreferences>(), full_record());
    }

    #[test]
    fn save_overwrites_wholesale() {
        let store = PreferenceStore::new(MemoryStore::default());
        store.save(&full_record()).unwrap();
        store.save(&AccessibilityPreferences::default()).unwrap();
        assert!(store.accessibility().is_default());
    }

    #[test]
    fn corrupted_value_loads_default_without_failing() {
        let backend = MemoryStore::default();
        backend.insert_raw(ACCESSIBILITY_KEY, "{not json");
        let store = PreferenceStore::new(backend);
        assert_eq!(
            store.load::<AccessibilityPreferences>(),
            AccessibilityPreferences::default()
        );
        assert!(matches!(
            store.try_load::<AccessibilityPreferences>(),
            Err(StoreError::Malformed { key, .. }) if key == ACCESSIBILITY_KEY
        ));
    }

    #[test]
    fn clear_restores_defaults() {
        let store = PreferenceStore::new(MemoryStore::default());
        store.save(&full_record()).unwrap();
        store.clear::<AccessibilityPreferences>().unwrap();
        assert!(store.try_load::<AccessibilityPreferences>().unwrap().is_none());
        assert!(store.accessibility().is_default());
    }

    #[test]
    fn clear_all_removes_both_records() {
        let backend = MemoryStore::default();
        let store = PreferenceStore::new(backend.clone());
        store.save(&full_record()).unwrap();
        store.save(&SpeechPreferences::default()).unwrap();
        store.clear_all();
        assert!(backend.raw(ACCESSIBILITY_KEY).is_none());
        assert!(backend.raw(SPEECH_KEY).is_none());
    }

    #[test]
    fn speech_uses_configured_defaults_and_clamps() {
        let backend = MemoryStore::default();
        let store = PreferenceStore::new(backend.clone())
            .with_speech_defaults(SpeechPreset::Classic.defaults());
        assert_eq!(store.speech(), SpeechPreset::Classic.defaults());

        backend.insert_raw(SPEECH_KEY, r#"{"rate":3.5,"volume":0.4}"#);
        let speech = store.speech();
        assert_eq!(speech.rate, 2.0);
        assert_eq!(speech.volume, 0.4);
    }

    #[test]
    fn backend_failures_surface_as_store_errors() {
        let backend = MemoryStore::default();
        backend.fail_writes(true);
        let store = PreferenceStore::new(backend);
        let err = store.save(&full_record()).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
