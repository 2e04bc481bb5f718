//! Player preferences
//!
//! Persisted separately from progress in the same key-value store.

use serde::{Deserialize, Serialize};

use crate::progress::KeyValueStore;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sound effects on/off
    pub sound_on: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_on: true,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "brickfall_settings";

    /// Flip sound, returning the new state
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_on = !self.sound_on;
        self.sound_on
    }

    /// Label for the menu sound button
    pub fn sound_label(&self) -> &'static str {
        if self.sound_on {
            "Sound: On"
        } else {
            "Sound: Off"
        }
    }

    /// Load settings, falling back to defaults
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        if let Some(json) = store.get_item(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring corrupt settings: {}", e),
            }
        }
        log::info!("Using default settings");
        Self::default()
    }

    pub fn save<S: KeyValueStore>(&self, store: &mut S) {
        if let Ok(json) = serde_json::to_string(self) {
            store.set_item(Self::STORAGE_KEY, &json);
            log::info!("Settings saved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryStore;

    #[test]
    fn test_defaults_when_missing_or_corrupt() {
        let mut store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());

        store.set_item(Settings::STORAGE_KEY, "[1, 2");
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_toggle_persists() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        assert!(!settings.toggle_sound());
        assert_eq!(settings.sound_label(), "Sound: Off");
        settings.save(&mut store);

        let loaded = Settings::load(&store);
        assert!(!loaded.sound_on);
    }
}
