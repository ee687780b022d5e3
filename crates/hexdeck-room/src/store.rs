//! Persistence of room snapshots and the games-played counter.
//!
//! Storage is a mirror, not the source of truth: the orchestrator logs a
//! failed write and keeps going with its in-memory state.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use hexdeck_protocol::RoomId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{RoomData, StoreError};

/// Where room snapshots and global stats live.
pub trait RoomStore: Send + Sync + 'static {
    /// Every stored room that has not ended.
    fn load_active_rooms(&self) -> Result<Vec<RoomData>, StoreError>;

    /// Inserts or replaces the snapshot of one room.
    fn upsert_room(&self, room: &RoomData) -> Result<(), StoreError>;

    fn increment_games_played(&self) -> Result<(), StoreError>;

    fn games_played(&self) -> Result<u64, StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Keeps everything in process memory. Used when no data directory is
/// configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: Mutex<HashMap<RoomId, RoomData>>,
    games_played: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored snapshot of one room, if any.
    pub fn room(&self, room_id: RoomId) -> Option<RoomData> {
        self.rooms.lock().get(&room_id).cloned()
    }
}

impl RoomStore for MemoryStore {
    fn load_active_rooms(&self) -> Result<Vec<RoomData>, StoreError> {
        Ok(self
            .rooms
            .lock()
            .values()
            .filter(|room| !room.game_state.is_ended())
            .cloned()
            .collect())
    }

    fn upsert_room(&self, room: &RoomData) -> Result<(), StoreError> {
        self.rooms.lock().insert(room.room_id, room.clone());
        Ok(())
    }

    fn increment_games_played(&self) -> Result<(), StoreError> {
        self.games_played.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn games_played(&self) -> Result<u64, StoreError> {
        Ok(self.games_played.load(Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
struct GlobalStats {
    games_played: u64,
}

/// One JSON document per room under `<dir>/rooms/`, plus `<dir>/stats.json`.
///
/// Writes go to a temporary file that is renamed into place, so a crash
/// leaves either the old or the new document.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    stats_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (and creates if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(dir.join("rooms"))?;
        tracing::info!(dir = %dir.display(), "json room store opened");
        Ok(Self {
            dir,
            stats_lock: Mutex::new(()),
        })
    }

    fn room_path(&self, room_id: RoomId) -> PathBuf {
        self.dir.join("rooms").join(format!("{:016x}.json", room_id.0))
    }

    fn stats_path(&self) -> PathBuf {
        self.dir.join("stats.json")
    }

    fn read_stats(&self) -> Result<GlobalStats, StoreError> {
        match fs::read(self.stats_path()) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(GlobalStats::default()),
            Err(e) => Err(e.into()),
        }
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl RoomStore for JsonFileStore {
    fn load_active_rooms(&self) -> Result<Vec<RoomData>, StoreError> {
        let mut rooms = Vec::new();
        for entry in fs::read_dir(self.dir.join("rooms"))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            match serde_json::from_slice::<RoomData>(&bytes) {
                Ok(room) if !room.game_state.is_ended() => rooms.push(room),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable room document");
                }
            }
        }
        Ok(rooms)
    }

    fn upsert_room(&self, room: &RoomData) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(room)?;
        write_atomically(&self.room_path(room.room_id), &bytes)
    }

    fn increment_games_played(&self) -> Result<(), StoreError> {
        let _guard = self.stats_lock.lock();
        let mut stats = self.read_stats()?;
        stats.games_played += 1;
        write_atomically(&self.stats_path(), &serde_json::to_vec(&stats)?)
    }

    fn games_played(&self) -> Result<u64, StoreError> {
        let _guard = self.stats_lock.lock();
        Ok(self.read_stats()?.games_played)
    }
}
