//! Per-room mutual exclusion.
//!
//! The check-then-write sequence of every mutation is not atomic against the
//! store, so all mutations touching a room serialize on that room's async
//! mutex, held from before the first conflict query until after the last
//! write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

type LockMap = HashMap<Uuid, Arc<AsyncMutex<()>>>;

#[derive(Debug, Default)]
pub struct RoomLocks {
    rooms: Mutex<LockMap>,
}

impl RoomLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Acquires the critical section for a room, creating its lock on first
    /// use. The guard owns the lock and may be held across await points.
    pub async fn acquire(&self, room_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut rooms = lock_map(&self.rooms);
            Arc::clone(rooms.entry(room_id).or_default())
        };
        lock.lock_owned().await
    }
}

/// Locks the registry map and recovers from poisoning.
fn lock_map(map: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    match map.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            map.clear_poison();
            poisoned.into_inner()
        }
    }
}
