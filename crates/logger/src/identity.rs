//! Weak identity tables.
//!
//! Both tables key entries by the address of an `Arc` allocation and keep only
//! a `Weak` next to it, so they observe a value without extending its life.
//! An entry whose value has been dropped is treated as absent and is replaced
//! on the next lookup at the same address.

use crate::value::{DisplayType, Inspect};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Size at which a table first sweeps out dead entries.
const PRUNE_THRESHOLD: usize = 64;

fn address(value: &Arc<dyn Inspect>) -> usize {
    Arc::as_ptr(value).cast::<()>() as usize
}

struct Slot<T> {
    value: Weak<dyn Inspect>,
    data: T,
}

impl<T> Slot<T> {
    fn is_alive(&self) -> bool {
        self.value.strong_count() > 0
    }
}

/// Address-keyed table of weakly held values.
struct WeakTable<T> {
    slots: HashMap<usize, Slot<T>>,
    prune_at: usize,
}

impl<T> WeakTable<T> {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
            prune_at: PRUNE_THRESHOLD,
        }
    }

    fn get(&self, value: &Arc<dyn Inspect>) -> Option<&T> {
        self.slots
            .get(&address(value))
            .filter(|slot| slot.is_alive())
            .map(|slot| &slot.data)
    }

    fn insert(&mut self, value: &Arc<dyn Inspect>, data: T) {
        if self.slots.len() >= self.prune_at {
            self.slots.retain(|_, slot| slot.is_alive());
            self.prune_at = (self.slots.len() * 2).max(PRUNE_THRESHOLD);
        }
        self.slots.insert(
            address(value),
            Slot {
                value: Arc::downgrade(value),
                data,
            },
        );
    }

    fn remove(&mut self, value: &Arc<dyn Inspect>) -> Option<T> {
        self.slots
            .remove(&address(value))
            .filter(Slot::is_alive)
            .map(|slot| slot.data)
    }

    fn live_len(&self) -> usize {
        self.slots.values().filter(|slot| slot.is_alive()).count()
    }
}

impl<T> Default for WeakTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Bucket {
    next_id: u64,
    ids: WeakTable<u64>,
}

impl Bucket {
    fn id_for(&mut self, value: &Arc<dyn Inspect>) -> u64 {
        if let Some(id) = self.ids.get(value) {
            return *id;
        }
        self.next_id += 1;
        self.ids.insert(value, self.next_id);
        self.next_id
    }
}

/// Mints stable per-type integer ids for identity-bearing values.
///
/// Ids are assigned once per live identity and increase monotonically within
/// a display type.
#[derive(Default)]
pub struct IdentityRegistry {
    buckets: Mutex<HashMap<DisplayType, Bucket>>,
}

impl IdentityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `value` within `display_type`, minting one on first
    /// sight.
    pub fn id(&self, display_type: DisplayType, value: &Arc<dyn Inspect>) -> u64 {
        self.buckets
            .lock()
            .entry(display_type)
            .or_default()
            .id_for(value)
    }

    /// Number of live identities tracked for `display_type`.
    pub fn live(&self, display_type: DisplayType) -> usize {
        self.buckets
            .lock()
            .get(&display_type)
            .map_or(0, |bucket| bucket.ids.live_len())
    }
}

/// User-assigned display names for identity-bearing values.
#[derive(Default)]
pub struct NameOverrides {
    names: Mutex<WeakTable<String>>,
}

impl NameOverrides {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `name` with `value` for as long as the value lives.
    pub fn assign(&self, value: &Arc<dyn Inspect>, name: impl Into<String>) {
        self.names.lock().insert(value, name.into());
    }

    /// Removes the name of `value`, returning it.
    pub fn clear(&self, value: &Arc<dyn Inspect>) -> Option<String> {
        self.names.lock().remove(value)
    }

    /// Looks up the name of `value`.
    pub fn get(&self, value: &Arc<dyn Inspect>) -> Option<String> {
        self.names.lock().get(value).cloned()
    }
}

/// Identity of the thread a log call runs on.
struct TaskMarker;

impl Inspect for TaskMarker {
    fn display_type(&self) -> Option<DisplayType> {
        Some(DisplayType::Task)
    }
}

thread_local! {
    static CURRENT_TASK: Arc<dyn Inspect> = Arc::new(TaskMarker);
}

/// Returns the identity handle of the calling thread.
///
/// The handle lives as long as the thread, so a thread keeps one token for its
/// whole life and a new thread never inherits a dead one. During thread
/// teardown a fresh, unnamed handle is returned.
#[must_use]
pub fn current_task() -> Arc<dyn Inspect> {
    CURRENT_TASK
        .try_with(Arc::clone)
        .unwrap_or_else(|_| Arc::new(TaskMarker) as Arc<dyn Inspect>)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Conn;

    impl Inspect for Conn {
        fn display_type(&self) -> Option<DisplayType> {
            Some(DisplayType::Native)
        }
    }

    fn handle() -> Arc<dyn Inspect> {
        Arc::new(Conn)
    }

    #[test]
    fn test_ids_are_stable_and_distinct() {
        let registry = IdentityRegistry::new();
        let a = handle();
        let b = handle();

        let id_a = registry.id(DisplayType::Native, &a);
        let id_b = registry.id(DisplayType::Native, &b);

        assert_eq!(id_a, registry.id(DisplayType::Native, &a));
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn test_buckets_count_independently() {
        let registry = IdentityRegistry::new();
        let a = handle();

        assert_eq!(registry.id(DisplayType::Native, &a), 1);
        assert_eq!(registry.id(DisplayType::Callable, &a), 1);
    }

    #[test]
    fn test_registry_does_not_keep_values_alive() {
        let registry = IdentityRegistry::new();
        let a = handle();
        let weak = Arc::downgrade(&a);

        registry.id(DisplayType::Native, &a);
        assert_eq!(registry.live(DisplayType::Native), 1);

        drop(a);
        assert!(weak.upgrade().is_none());
        assert_eq!(registry.live(DisplayType::Native), 0);
    }

    #[test]
    fn test_dead_identity_is_not_resurrected() {
        let registry = IdentityRegistry::new();
        let first = handle();
        let first_id = registry.id(DisplayType::Native, &first);
        drop(first);

        // Whatever address the allocator hands out next, a new identity never
        // reuses a live id and never goes backwards.
        let second = handle();
        assert!(registry.id(DisplayType::Native, &second) > first_id);
    }

    #[test]
    fn test_names_follow_value_lifetime() {
        let names = NameOverrides::new();
        let a = handle();

        names.assign(&a, "main");
        assert_eq!(names.get(&a).as_deref(), Some("main"));
        assert_eq!(names.clear(&a).as_deref(), Some("main"));
        assert_eq!(names.get(&a), None);
    }

    #[test]
    fn test_current_task_differs_between_threads() {
        let here = current_task();
        let there = std::thread::spawn(|| address(&current_task()))
            .join()
            .unwrap();

        assert!(Arc::ptr_eq(&here, &current_task()));
        assert_ne!(address(&here), there);
    }
}
