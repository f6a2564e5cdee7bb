//! One-shot per-room timers.
//!
//! Arming a room replaces (aborts) any timer already armed for it, so bursts
//! never stack callbacks.  A fired timer removes itself before running its
//! callback; the callback should hand long work to its own task so that a
//! later re-arm cannot abort it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;

#[derive(Default)]
struct Slot {
    generation: u64,
    handle: Option<AbortHandle>,
}

#[derive(Default, Clone)]
pub struct DebounceTimers {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl DebounceTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` once `delay` has elapsed, unless re-armed first.
    pub fn arm<F>(&self, room_id: &str, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slots = self.slots.lock();
        let slot = slots.entry(room_id.to_owned()).or_default();
        if let Some(previous) = slot.handle.take() {
            previous.abort();
        }
        slot.generation += 1;
        let generation = slot.generation;

        let slots_ref = self.slots.clone();
        let room = room_id.to_owned();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slots = slots_ref.lock();
                match slots.get(&room) {
                    Some(slot) if slot.generation == generation => {
                        slots.remove(&room);
                    }
                    // Superseded between wake-up and lock.
                    _ => return,
                }
            }
            callback();
        });
        slot.handle = Some(task.abort_handle());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        (fired, move || {
            let f = f.clone();
            Box::new(move || {
                f.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let timers = DebounceTimers::new();
        let (fired, cb) = counter();
        timers.arm("lobby", Duration::from_millis(500), cb());

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(timers.slots.lock().is_empty());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_pending_timer() {
        let timers = DebounceTimers::new();
        let (fired, cb) = counter();
        timers.arm("lobby", Duration::from_millis(500), cb());
        tokio::time::sleep(Duration::from_millis(300)).await;
        timers.arm("lobby", Duration::from_millis(500), cb());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
