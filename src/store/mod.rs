//! The object store: the sole source of truth reconcilers read from and
//! write to. A real deployment backs this with a Kubernetes-like
//! object/watch runtime (explicitly out of scope -- see crate root docs);
//! `memory::MemoryStore` is the in-process reference implementation used by
//! the engine's own tests and by anyone embedding it without a cluster.

pub mod memory;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::model::resource::Resource;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found")]
    NotFound,
    #[error("resource version conflict: expected {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },
}

/// Extracted from `Resource<Spec, Status>` so store code can stay generic
/// over metadata without caring about `Spec`/`Status`.
pub trait HasMeta {
    fn meta(&self) -> &crate::model::meta::ObjectMeta;
    fn meta_mut(&mut self) -> &mut crate::model::meta::ObjectMeta;
}

impl<Spec, Status> HasMeta for Resource<Spec, Status> {
    fn meta(&self) -> &crate::model::meta::ObjectMeta {
        &self.metadata
    }
    fn meta_mut(&mut self) -> &mut crate::model::meta::ObjectMeta {
        &mut self.metadata
    }
}

#[derive(Debug, Clone)]
pub enum WatchEvent<R> {
    Applied(R),
    Deleted(R),
}

/// A minimal CRUD+watch contract for a single kind. Optimistic concurrency:
/// `update` compares `resource_version` and returns `StoreError::Conflict`
/// on a stale write, which the runtime treats as `Error::Transient` and
/// retries.
#[async_trait]
pub trait ObjectStore<R>: Send + Sync
where
    R: Clone + HasMeta + Send + Sync + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Option<R>;
    async fn list(&self, namespace: Option<&str>) -> Vec<R>;
    async fn create(&self, obj: R) -> Result<R, StoreError>;
    async fn update(&self, obj: R) -> Result<R, StoreError>;
    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError>;
    fn watch(&self) -> broadcast::Receiver<WatchEvent<R>>;
}
