use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, warn};

use super::decl::BindingDecl;
use super::key::BindingKey;
use crate::task::{Handle, HandleId, TaskError};

/// Handles registered under one canonical key
struct Slot {
    key: BindingKey,
    handles: DashMap<HandleId, Handle>,
}

impl Slot {
    fn new(key: BindingKey) -> Self {
        Self {
            key,
            handles: DashMap::new(),
        }
    }
}

/// Append-only map from binding keys to deduplicated handle sets
///
/// Constructed once at startup and shared by reference; there is no removal
/// path, so handles live as long as the registry does.
#[derive(Default)]
pub struct Registry {
    slots: DashMap<String, Arc<Slot>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `key`.
    ///
    /// Idempotent: if a handle with the same identity is already registered for
    /// this key, the existing one is returned and `handle` is dropped.
    pub fn register(&self, key: BindingKey, handle: Handle) -> Handle {
        let canonical = key.canonical();
        let slot = self
            .slots
            .entry(canonical.clone())
            .or_insert_with(|| Arc::new(Slot::new(key.clone())))
            .value()
            .clone();

        if slot.key != key {
            warn!(
                key = %key,
                existing = %slot.key,
                canonical = %canonical,
                "Binding key collides with a different triple"
            );
        }

        match slot.handles.entry(handle.id().clone()) {
            Entry::Occupied(existing) => {
                let kept = existing.get().clone();
                if kept.same_callable(&handle) || kept.id().owner().is_some() {
                    debug!(key = %key, handle = %handle.id(), "Handle already registered");
                } else {
                    warn!(
                        key = %key,
                        handle = %handle.id(),
                        "Different callable shares an already registered identity, keeping the first"
                    );
                }
                kept
            }
            Entry::Vacant(vacant) => {
                debug!(key = %key, handle = %handle.id(), "Handle registered");
                vacant.insert(handle.clone());
                handle
            }
        }
    }

    /// Register every handler declared in `decl`
    pub fn register_binding(&self, decl: BindingDecl) -> Vec<Handle> {
        decl.into_bindings()
            .map(|(key, handle)| self.register(key, handle))
            .collect()
    }

    /// Snapshot of the handles registered under `key`, in no particular order
    pub fn lookup(&self, key: &BindingKey) -> Vec<Handle> {
        self.slots
            .get(&key.canonical())
            .map(|slot| {
                slot.handles
                    .iter()
                    .map(|entry| entry.value().clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn lookup_exactly_one(&self, key: &BindingKey) -> Result<Handle, TaskError> {
        let mut handles = self.lookup(key);
        match handles.len() {
            0 => Err(TaskError::LookupNotFound(key.clone())),
            1 => Ok(handles.remove(0)),
            count => Err(TaskError::AmbiguousLookup {
                key: key.clone(),
                count,
            }),
        }
    }

    pub fn contains(&self, key: &BindingKey) -> bool {
        self.slots
            .get(&key.canonical())
            .is_some_and(|slot| !slot.handles.is_empty())
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total handles across all keys
    pub fn handle_count(&self) -> usize {
        self.slots.iter().map(|slot| slot.handles.len()).sum()
    }

    /// Keys as first registered for each slot
    pub fn keys(&self) -> Vec<BindingKey> {
        self.slots.iter().map(|slot| slot.key.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Orders;

    impl Orders {
        fn create(&self) -> i64 {
            42
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = Registry::new();
        let owner = Arc::new(Orders);
        let key = BindingKey::new("orders", "", "create");

        for _ in 0..5 {
            registry.register(key.clone(), Handle::method(&owner, "create", Orders::create));
        }

        assert_eq!(registry.lookup(&key).len(), 1);
        assert_eq!(registry.handle_count(), 1);
    }

    #[test]
    fn test_same_handle_under_two_keys() {
        let registry = Registry::new();
        let owner = Arc::new(Orders);
        let handle = Handle::method(&owner, "create", Orders::create);

        registry.register(BindingKey::new("orders", "", "create"), handle.clone());
        registry.register(BindingKey::new("orders", "legacy", "create"), handle);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.handle_count(), 2);
    }

    #[test]
    fn test_lookup_missing_key_is_empty() {
        let registry = Registry::new();
        let key = BindingKey::new("orders", "", "create");

        assert!(registry.lookup(&key).is_empty());
        assert!(!registry.contains(&key));
        assert!(matches!(
            registry.lookup_exactly_one(&key),
            Err(TaskError::LookupNotFound(_))
        ));
    }

    #[test]
    fn test_lookup_exactly_one_rejects_ambiguity() {
        let registry = Registry::new();
        let key = BindingKey::new("orders", "", "create");

        registry.register(key.clone(), Handle::function("create_a", || 42));
        assert!(registry.lookup_exactly_one(&key).is_ok());

        registry.register(key.clone(), Handle::function("create_b", || 7));
        assert!(matches!(
            registry.lookup_exactly_one(&key),
            Err(TaskError::AmbiguousLookup { count: 2, .. })
        ));
    }

    #[test]
    fn test_register_returns_existing_handle() {
        let registry = Registry::new();
        let key = BindingKey::new("orders", "", "create");

        let first = registry.register(key.clone(), Handle::function("create", || 42));
        let second = registry.register(key.clone(), Handle::function("create", || 0));

        assert_eq!(first, second);
        assert!(second.same_callable(&first));
        // the first callable wins
        let value = registry.lookup_exactly_one(&key).unwrap().invoke(vec![]).unwrap();
        assert_eq!(value, serde_json::json!(42));
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(Registry::new());
        let owner = Arc::new(Orders);
        let key = BindingKey::new("orders", "", "create");

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let owner = Arc::clone(&owner);
                let key = key.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        registry.register(
                            key.clone(),
                            Handle::method(&owner, "create", Orders::create),
                        );
                        registry.register(
                            key.clone(),
                            Handle::function(format!("worker-{i}"), || 0),
                        );
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        // one shared method handle + one free function per worker
        assert_eq!(registry.lookup(&key).len(), 9);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_colliding_keys_share_a_slot() {
        let registry = Registry::new();
        registry.register(BindingKey::new("a-b", "c", ""), Handle::function("left", || 1));
        registry.register(BindingKey::new("a", "b-c", ""), Handle::function("right", || 2));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(&BindingKey::new("a", "b-c", "")).len(), 2);
    }
}
