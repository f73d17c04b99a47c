//! Persisted settings storage.
//!
//! The registry and the floating widget persist their state through the
//! [`SettingsStore`] seam: a flat key/value surface holding JSON strings,
//! matching the shape of the extension-local storage the data originally
//! lived in. `MemoryStore` is the in-memory implementation used by tests
//! and the demo driver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use envlens_types::error::Result;
use envlens_types::{ComparisonSession, Environment};

/// Key holding the serialized [`Settings`].
pub const KEY_SETTINGS: &str = "settings";

/// Key holding a stashed [`ComparisonSession`] awaiting consumption.
pub const KEY_SESSION: &str = "comparisonSession";

/// Flat key/value storage for JSON strings.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Entirely in-memory [`SettingsStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Everything the registry persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environments: Vec<Environment>,
    /// Whether the floating on-page widget is shown.
    #[serde(default = "default_widget_enabled", rename = "widgetEnabled")]
    pub widget_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environments: Vec::new(),
            widget_enabled: true,
        }
    }
}

fn default_widget_enabled() -> bool {
    true
}

/// Load settings, falling back to defaults when nothing is stored.
pub fn load_settings(store: &dyn SettingsStore) -> Result<Settings> {
    match store.get(KEY_SETTINGS)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(Settings::default()),
    }
}

pub fn save_settings(store: &mut dyn SettingsStore, settings: &Settings) -> Result<()> {
    let json = serde_json::to_string(settings)?;
    store.set(KEY_SETTINGS, &json)
}

/// Stash a comparison session for the comparison page to pick up.
pub fn stash_session(store: &mut dyn SettingsStore, session: &ComparisonSession) -> Result<()> {
    let json = serde_json::to_string(session)?;
    store.set(KEY_SESSION, &json)
}

/// Take the stashed session, removing it so it is consumed exactly once.
pub fn take_session(store: &mut dyn SettingsStore) -> Result<Option<ComparisonSession>> {
    let Some(json) = store.get(KEY_SESSION)? else {
        return Ok(None);
    };
    store.remove(KEY_SESSION)?;
    Ok(Some(serde_json::from_str(&json)?))
}
