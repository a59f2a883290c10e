use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

/// Serialises writers of the same storage key within this process.
///
/// Clones share their slots. A slot exists only while someone holds or awaits it.
#[derive(Debug, Clone, Default)]
pub struct WriteSequencer {
    slots: Arc<Mutex<FxHashMap<String, Slot>>>,
}

impl WriteSequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other holder of `key` remains and returns the turn.
    pub async fn acquire(&self, key: &str) -> Turn {
        let slot = Arc::clone(self.slots.lock().entry(key.to_owned()).or_default());
        let guard = Arc::clone(&slot).lock_owned().await;
        Turn { key: key.to_owned(), slot, slots: Arc::clone(&self.slots), guard: Some(guard) }
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn active(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Exclusive access to one key; released on drop.
#[derive(Debug)]
pub struct Turn {
    key: String,
    slot: Slot,
    slots: Arc<Mutex<FxHashMap<String, Slot>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for Turn {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        self.guard.take();
        // Map entry plus ours: nobody is waiting.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}
