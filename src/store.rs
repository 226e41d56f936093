//! Persisted local state, the desktop stand-in for the widget's
//! browser-local storage keys.
//!
//! Every key lives in one versioned JSON file. A missing, corrupt or
//! mis-versioned file is never fatal: it reads as the default empty state.
//! Writes are read-merge-write: reload the file, overlay only the fields the
//! caller owns, write back. Two app instances sharing the file get
//! last-write-wins per write, with no locking.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;

use bevy::prelude::*;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};

use crate::state::{GardenState, GRID_SIZE};

pub const STORE_VERSION: u32 = 1;
pub const DEFAULT_STORE_FILE: &str = "garden_state.json";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoredState {
    pub version: u32,
    /// Cumulative XP ledger, written by the poll screen.
    pub total_xp: i64,
    /// Watering gauge, written by the garden screen.
    pub current_water_xp: i64,
    pub plants: [Option<u8>; GRID_SIZE],
    pub seeds_used: u8,
    /// Coarse level last shown on the poll screen. Independent of `plants`.
    pub plant_level: u8,
}

impl Default for StoredState {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            total_xp: 0,
            current_water_xp: 0,
            plants: [None; GRID_SIZE],
            seeds_used: 0,
            plant_level: 0,
        }
    }
}

impl StoredState {
    /// In-memory garden view of the persisted keys.
    pub fn garden_state(&self) -> GardenState {
        GardenState::from_saved(
            self.plants,
            self.total_xp,
            self.current_water_xp,
            self.seeds_used,
        )
    }
}

#[derive(Resource, Clone)]
pub struct GardenStore {
    path: PathBuf,
}

impl GardenStore {
    pub fn from_env() -> Self {
        let path = std::env::var("GARDEN_STATE_FILE")
            .unwrap_or_else(|_| DEFAULT_STORE_FILE.to_string());
        Self::new(path)
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> StoredState {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return StoredState::default(),
        };
        match serde_json::from_str::<StoredState>(&raw) {
            Ok(state) if state.version == STORE_VERSION => state,
            Ok(state) => {
                warn!(
                    "Garden store has unknown version {}, starting fresh",
                    state.version
                );
                StoredState::default()
            }
            Err(e) => {
                warn!("Failed to parse garden store, starting fresh: {}", e);
                StoredState::default()
            }
        }
    }

    /// Read-merge-write. Returns the state as written.
    pub fn update(&self, mutate: impl FnOnce(&mut StoredState)) -> StoredState {
        let mut state = self.load();
        mutate(&mut state);
        self.save(&state);
        state
    }

    fn save(&self, state: &StoredState) {
        match serde_json::to_string_pretty(state) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!("Failed to save garden store: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize garden store: {}", e),
        }
    }

    /// Full wipe: the next load sees the default empty state.
    pub fn reset(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to clear garden store: {}", e);
            }
        }
    }
}

/// Change subscription on the store file, so ledger writes from the poll
/// screen (or a second app instance) reach the garden without waiting for
/// the fallback timer. Lives as a non-send resource; the platform watcher
/// is not guaranteed thread-safe.
pub struct StoreWatcher {
    rx: Mutex<Receiver<()>>,
    _watcher: RecommendedWatcher,
}

impl StoreWatcher {
    /// None when the platform watcher cannot be set up. The garden then
    /// falls back to timer-driven sync with identical delta semantics.
    pub fn new(store: &GardenStore) -> Option<Self> {
        let file_name = store.path().file_name()?.to_owned();
        let (tx, rx) = mpsc::channel();

        let result = notify::recommended_watcher(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_ref()))
                    {
                        let _ = tx.send(());
                    }
                }
                Err(e) => warn!("Garden store watch error: {:?}", e),
            },
        );
        let mut watcher = match result {
            Ok(watcher) => watcher,
            Err(e) => {
                warn!("Store watcher unavailable, using timer sync: {}", e);
                return None;
            }
        };

        let dir = store
            .path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
            warn!("Store watcher unavailable, using timer sync: {}", e);
            return None;
        }

        info!("Watching {} for changes", store.path().display());
        Some(Self {
            rx: Mutex::new(rx),
            _watcher: watcher,
        })
    }

    /// Drains pending change events. True if the file changed since the
    /// last call.
    pub fn changed(&self) -> bool {
        let rx = match self.rx.lock() {
            Ok(rx) => rx,
            Err(_) => return false,
        };
        let mut changed = false;
        while rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(dir: &tempfile::TempDir) -> GardenStore {
        GardenStore::new(dir.path().join(DEFAULT_STORE_FILE))
    }

    #[test]
    fn missing_file_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        assert_eq!(store.load(), StoredState::default());
    }

    #[test]
    fn update_round_trips_the_grid_and_seed_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        store.update(|s| {
            s.total_xp = 120;
            s.current_water_xp = 20;
            s.plants = [Some(1), None, Some(4), None, Some(2), None];
            s.seeds_used = 3;
            s.plant_level = 2;
        });

        let loaded = store.load();
        assert_eq!(loaded.total_xp, 120);
        assert_eq!(loaded.current_water_xp, 20);
        assert_eq!(loaded.plants, [Some(1), None, Some(4), None, Some(2), None]);
        assert_eq!(loaded.seeds_used, 3);
        assert_eq!(loaded.plant_level, 2);
    }

    #[test]
    fn corrupt_json_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        std::fs::write(store.path(), "{not json at all").unwrap();
        assert_eq!(store.load(), StoredState::default());
    }

    #[test]
    fn unknown_version_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        let mut state = StoredState::default();
        state.version = 99;
        state.total_xp = 500;
        std::fs::write(store.path(), serde_json::to_string(&state).unwrap()).unwrap();
        assert_eq!(store.load(), StoredState::default());
    }

    #[test]
    fn reset_wipes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        store.update(|s| {
            s.total_xp = 70;
            s.seeds_used = 2;
        });
        store.reset();
        assert_eq!(store.load(), StoredState::default());
        // Resetting an already clean store is fine too.
        store.reset();
    }

    #[test]
    fn merge_keeps_fields_the_caller_does_not_own() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        // Poll screen writes the ledger.
        store.update(|s| s.total_xp = 35);
        // Garden screen writes its own keys and must not clobber the ledger.
        store.update(|s| {
            s.current_water_xp = 35;
            s.seeds_used = 1;
            s.plants[0] = Some(1);
        });

        let loaded = store.load();
        assert_eq!(loaded.total_xp, 35);
        assert_eq!(loaded.current_water_xp, 35);
        assert_eq!(loaded.plants[0], Some(1));
    }

    #[test]
    fn stored_state_converts_into_a_garden_state() {
        let mut stored = StoredState::default();
        stored.total_xp = 60;
        stored.current_water_xp = 50;
        stored.plants[1] = Some(3);
        stored.seeds_used = 1;

        let garden = stored.garden_state();
        assert_eq!(garden.total_points, 60);
        assert_eq!(garden.current_water_points, 50);
        assert_eq!(garden.plants[1], Some(3));
        assert_eq!(garden.seeds_used, 1);
        assert!(garden.can_water());
    }
}
