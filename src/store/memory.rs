//! In-memory `ObjectStore` reference implementation, backing both the
//! engine's own tests and any embedder that doesn't (yet) have a real
//! cluster to talk to.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{HasMeta, ObjectStore, StoreError, WatchEvent};

/// All critical sections below are synchronous and non-blocking, so a plain
/// `std::sync::Mutex` (never held across an `.await`) is enough here.
pub struct MemoryStore<R> {
    objects: Mutex<HashMap<(String, String), R>>,
    events: broadcast::Sender<WatchEvent<R>>,
}

impl<R: Clone> Default for MemoryStore<R> {
    fn default() -> Self {
        let (tx, _rx) = broadcast::channel(1024);
        Self { objects: Mutex::new(HashMap::new()), events: tx }
    }
}

impl<R: Clone> MemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<R> ObjectStore<R> for MemoryStore<R>
where
    R: Clone + HasMeta + Send + Sync + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Option<R> {
        self.objects.lock().unwrap().get(&(namespace.to_string(), name.to_string())).cloned()
    }

    async fn list(&self, namespace: Option<&str>) -> Vec<R> {
        self.objects
            .lock()
            .unwrap()
            .values()
            .filter(|o| namespace.is_none_or(|ns| o.meta().namespace == ns))
            .cloned()
            .collect()
    }

    async fn create(&self, obj: R) -> Result<R, StoreError> {
        let key = obj.meta().key();
        let mut guard = self.objects.lock().unwrap();
        if guard.contains_key(&key) {
            return Err(StoreError::Conflict { expected: 0, found: 1 });
        }
        let mut obj = obj;
        obj.meta_mut().resource_version = 1;
        guard.insert(key, obj.clone());
        drop(guard);
        let _ = self.events.send(WatchEvent::Applied(obj.clone()));
        Ok(obj)
    }

    async fn update(&self, obj: R) -> Result<R, StoreError> {
        let key = obj.meta().key();
        let mut guard = self.objects.lock().unwrap();
        let current = guard.get(&key).ok_or(StoreError::NotFound)?;
        if current.meta().resource_version != obj.meta().resource_version {
            return Err(StoreError::Conflict {
                expected: obj.meta().resource_version,
                found: current.meta().resource_version,
            });
        }
        let mut obj = obj;
        obj.meta_mut().resource_version += 1;
        guard.insert(key, obj.clone());
        drop(guard);
        let _ = self.events.send(WatchEvent::Applied(obj.clone()));
        Ok(obj)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let key = (namespace.to_string(), name.to_string());
        let removed = self.objects.lock().unwrap().remove(&key).ok_or(StoreError::NotFound)?;
        let _ = self.events.send(WatchEvent::Deleted(removed));
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<WatchEvent<R>> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::kinds::environment::{Environment, EnvironmentSpec};
    use crate::model::meta::ObjectMeta;
    use crate::model::resource::Kind;

    fn env(name: &str) -> Environment {
        Environment::new(Kind::Environment, ObjectMeta::new("", name, Utc::now()), EnvironmentSpec::default())
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store: MemoryStore<Environment> = MemoryStore::new();
        let created = store.create(env("test")).await.unwrap();
        assert_eq!(created.metadata.resource_version, 1);
        let fetched = store.get("", "test").await.unwrap();
        assert_eq!(fetched.metadata.name, "test");
    }

    #[tokio::test]
    async fn create_twice_conflicts() {
        let store: MemoryStore<Environment> = MemoryStore::new();
        store.create(env("test")).await.unwrap();
        assert!(matches!(store.create(env("test")).await, Err(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn stale_update_conflicts() {
        let store: MemoryStore<Environment> = MemoryStore::new();
        let created = store.create(env("test")).await.unwrap();
        store.update(created.clone()).await.unwrap();
        // `created` still carries resource_version 1, but the store is now at 2.
        assert!(matches!(store.update(created).await, Err(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn delete_removes_and_emits_event() {
        let store: MemoryStore<Environment> = MemoryStore::new();
        let mut rx = store.watch();
        store.create(env("test")).await.unwrap();
        store.delete("", "test").await.unwrap();
        assert!(store.get("", "test").await.is_none());
        let _applied = rx.recv().await.unwrap();
        let deleted = rx.recv().await.unwrap();
        assert!(matches!(deleted, WatchEvent::Deleted(_)));
    }
}
