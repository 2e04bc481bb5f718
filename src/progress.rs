//! Per-player progress on a local key-value store
//!
//! Profiles are plain usernames mapped to the highest level they may play.
//! Everything lives in one JSON document under a single key so the whole
//! store is a handful of `localStorage` entries in the browser.
//!
//! Missing or corrupt data is never an error for the game: it reads as "no
//! progress" and the player starts at level 1.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::consts::GAME_VERSION;
use crate::error::BrickfallError;

const USERS_KEY: &str = "users";
const LAST_USER_KEY: &str = "lastUser";
const VERSION_KEY: &str = "gameVersion";

/// String key-value storage (LocalStorage on web)
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str);
    fn remove_item(&mut self, key: &str);
}

/// In-memory store for native builds and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// Browser `window.localStorage`
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable, progress will not persist");
        }
        Self { storage }
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            if storage.set_item(key, value).is_err() {
                log::warn!("Failed to write '{}' to LocalStorage", key);
            }
        }
    }

    fn remove_item(&mut self, key: &str) {
        if let Some(storage) = &self.storage {
            if storage.remove_item(key).is_err() {
                log::warn!("Failed to remove '{}' from LocalStorage", key);
            }
        }
    }
}

/// Stored progress for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    /// One past the last cleared level; `max_level + 1` once every level is cleared
    #[serde(rename = "lastLevel", default = "first_level")]
    pub last_unlocked_level: u32,
}

impl UserProgress {
    /// Level the player should play next
    pub fn frontier(&self, max_level: u32) -> u32 {
        self.last_unlocked_level.clamp(1, max_level.max(1))
    }

    /// Every level has been cleared
    pub fn is_complete(&self, max_level: u32) -> bool {
        self.last_unlocked_level > max_level
    }
}

fn first_level() -> u32 {
    1
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            last_unlocked_level: first_level(),
        }
    }
}

/// Level select classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelStatus {
    /// Already beaten
    Cleared,
    /// The next level to beat
    Frontier,
    /// Not yet reachable; cannot be started
    Locked,
}

impl LevelStatus {
    pub fn is_playable(self) -> bool {
        self != LevelStatus::Locked
    }
}

/// Classify `level` given the player's unlocked frontier
pub fn level_status(level: u32, last_unlocked_level: u32) -> LevelStatus {
    use std::cmp::Ordering;
    match level.cmp(&last_unlocked_level.max(1)) {
        Ordering::Less => LevelStatus::Cleared,
        Ordering::Equal => LevelStatus::Frontier,
        Ordering::Greater => LevelStatus::Locked,
    }
}

/// Status of every level `1..=max_level`
pub fn level_statuses(last_unlocked_level: u32, max_level: u32) -> Vec<(u32, LevelStatus)> {
    (1..=max_level)
        .map(|level| (level, level_status(level, last_unlocked_level)))
        .collect()
}

/// Player profiles and their progress
#[derive(Debug)]
pub struct ProgressStore<S: KeyValueStore> {
    store: S,
    max_level: u32,
}

impl<S: KeyValueStore> ProgressStore<S> {
    /// Wrap a store, stamping the current game version
    pub fn new(mut store: S, max_level: u32) -> Self {
        if store.get_item(VERSION_KEY).as_deref() != Some(GAME_VERSION) {
            log::info!("Registering game version {}", GAME_VERSION);
            store.set_item(VERSION_KEY, GAME_VERSION);
        }
        Self {
            store,
            max_level: max_level.max(1),
        }
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decode every profile, reporting corruption
    pub fn try_users(&self) -> Result<BTreeMap<String, UserProgress>, BrickfallError> {
        match self.store.get_item(USERS_KEY) {
            None => Ok(BTreeMap::new()),
            Some(json) => serde_json::from_str(&json).map_err(|source| {
                BrickfallError::CorruptStore {
                    key: USERS_KEY,
                    source,
                }
            }),
        }
    }

    /// Decode every profile; corrupt data reads as no profiles
    pub fn users(&self) -> BTreeMap<String, UserProgress> {
        self.try_users().unwrap_or_else(|e| {
            log::warn!("{}; treating as no progress", e);
            BTreeMap::new()
        })
    }

    fn save_users(&mut self, users: &BTreeMap<String, UserProgress>) {
        match serde_json::to_string(users) {
            Ok(json) => self.store.set_item(USERS_KEY, &json),
            Err(e) => log::warn!("Failed to encode progress: {}", e),
        }
    }

    /// Stored values range over `1..=max_level + 1`
    fn clamp_progress(&self, level: u32) -> u32 {
        level.clamp(1, self.max_level.saturating_add(1))
    }

    /// Progress for `username`, level 1 when unknown
    pub fn get(&self, username: &str) -> UserProgress {
        let mut progress = self.users().get(username).copied().unwrap_or_default();
        progress.last_unlocked_level = self.clamp_progress(progress.last_unlocked_level);
        progress
    }

    /// Overwrite the unlocked level for `username`
    pub fn set(&mut self, username: &str, level: u32) {
        let mut users = self.users();
        users.insert(
            username.to_string(),
            UserProgress {
                last_unlocked_level: self.clamp_progress(level),
            },
        );
        self.save_users(&users);
    }

    /// Unlock the level after `cleared_level`; never moves progress backwards
    pub fn record_clear(&mut self, username: &str, cleared_level: u32) -> UserProgress {
        let existing = self.get(username).last_unlocked_level;
        let unlocked = self.clamp_progress(existing.max(cleared_level.saturating_add(1)));
        if unlocked != existing || !self.users().contains_key(username) {
            self.set(username, unlocked);
            if unlocked > self.max_level {
                log::info!("{} cleared every level", username);
            } else {
                log::info!("{} unlocked level {}", username, unlocked);
            }
        }
        UserProgress {
            last_unlocked_level: unlocked,
        }
    }

    /// Create a profile starting at level 1
    pub fn register(&mut self, username: &str) -> Result<(), BrickfallError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(BrickfallError::EmptyUsername);
        }
        let mut users = self.users();
        if users.contains_key(username) {
            return Err(BrickfallError::UsernameTaken(username.to_string()));
        }
        users.insert(username.to_string(), UserProgress::default());
        self.save_users(&users);
        log::info!("Created profile '{}'", username);
        Ok(())
    }

    /// Select a profile and remember it for auto-login
    pub fn login(&mut self, username: &str) -> Result<UserProgress, BrickfallError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(BrickfallError::EmptyUsername);
        }
        if !self.users().contains_key(username) {
            return Err(BrickfallError::UnknownUser(username.to_string()));
        }
        self.store.set_item(LAST_USER_KEY, username);
        Ok(self.get(username))
    }

    /// Forget the auto-login profile
    pub fn logout(&mut self) {
        self.store.remove_item(LAST_USER_KEY);
    }

    /// Last logged-in profile, if it still exists
    pub fn last_user(&self) -> Option<String> {
        let name = self.store.get_item(LAST_USER_KEY)?;
        self.users().contains_key(&name).then_some(name)
    }
}
