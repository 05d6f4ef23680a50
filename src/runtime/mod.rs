//! The reconciler runtime (§4.1, §5, §9): a channel-fed worker pool that owns
//! per-key ordering, retry/backoff and periodic requeue, generalized from the
//! teacher's `kube-runtime` `Controller` loop since the Kubernetes-like
//! apiserver it watched is an external collaborator this crate does not talk
//! to directly (see the crate root docs).

pub mod context;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{error, info};

use crate::errors::{Error, Result};
use crate::model::meta::ObjectRef;
use crate::store::{HasMeta, ObjectStore};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// What the runtime does once a reconcile returns successfully.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    /// Requeue after the given delay (the teacher's `Action::requeue`) --
    /// used for drift-correcting reconciles of objects with `Processing=True`.
    Requeue(Duration),
    /// Don't requeue; wait for the next watch event (the teacher's
    /// `Action::await_change`).
    AwaitChange,
}

impl Action {
    pub fn requeue_after_secs(secs: u64) -> Self {
        Action::Requeue(Duration::from_secs(secs))
    }
}

/// Implemented once per reconciled kind. `R` is the object type, `C` is
/// whatever shared context (stores, clients) the handler needs to reconcile
/// it.
#[async_trait]
pub trait Handler<R, C>: Send + Sync {
    async fn reconcile(&self, obj: R, ctx: Arc<C>) -> Result<Action>;
}

const BASE_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const MAX_RETRY_ATTEMPTS: u32 = 20;

/// Exponential backoff with full jitter up to 25% of the capped delay, so a
/// thundering herd of same-generation failures doesn't retry in lockstep.
fn backoff_with_jitter(attempt: u32) -> Duration {
    let capped = BASE_BACKOFF.saturating_mul(1u32.checked_shl(attempt.min(20)).unwrap_or(u32::MAX)).min(MAX_BACKOFF);
    let jitter_cap = (capped.as_millis() as u64 / 4).max(1);
    let jitter_ms = rand::rng().random_range(0..=jitter_cap);
    capped + Duration::from_millis(jitter_ms)
}

struct QueueState<R> {
    order: VecDeque<ObjectRef>,
    pending: HashMap<ObjectRef, R>,
    in_flight: HashSet<ObjectRef>,
    dirty: HashSet<ObjectRef>,
}

/// A per-key FIFO queue: enqueuing a key already in flight marks it dirty
/// instead of running it concurrently with itself, and the dirty key is
/// re-enqueued the moment the in-flight reconcile completes. Distinct keys
/// reconcile concurrently, bounded by however many workers poll `next`.
pub struct WorkQueue<R> {
    state: Mutex<QueueState<R>>,
    notify: Notify,
}

impl<R: Clone + Send + 'static> WorkQueue<R> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState {
                order: VecDeque::new(),
                pending: HashMap::new(),
                in_flight: HashSet::new(),
                dirty: HashSet::new(),
            }),
            notify: Notify::new(),
        })
    }

    /// Enqueues `object` under `key`, coalescing with any not-yet-processed
    /// copy already queued for the same key.
    pub fn enqueue(&self, key: ObjectRef, object: R) {
        let mut s = self.state.lock().unwrap();
        let already_queued = s.pending.contains_key(&key) && !s.in_flight.contains(&key);
        s.pending.insert(key.clone(), object);
        if s.in_flight.contains(&key) {
            s.dirty.insert(key);
        } else if !already_queued {
            s.order.push_back(key);
        }
        drop(s);
        self.notify.notify_one();
    }

    async fn next(&self) -> (ObjectRef, R) {
        loop {
            {
                let mut s = self.state.lock().unwrap();
                if let Some(key) = s.order.pop_front() {
                    if let Some(obj) = s.pending.remove(&key) {
                        s.in_flight.insert(key.clone());
                        return (key, obj);
                    }
                }
            }
            self.notify.notified().await;
        }
    }

    fn complete(&self, key: &ObjectRef) {
        let mut s = self.state.lock().unwrap();
        s.in_flight.remove(key);
        if s.dirty.remove(key) {
            s.order.push_back(key.clone());
            drop(s);
            self.notify.notify_one();
        }
    }
}

/// Spawns `concurrency` workers draining `queue`, each running `handler`
/// reconciles with retry-with-backoff on `Error::Transient` and scheduling a
/// delayed re-enqueue on `Action::Requeue`.
pub fn spawn_worker_pool<R, C, H>(
    queue: Arc<WorkQueue<R>>,
    handler: Arc<H>,
    ctx: Arc<C>,
    concurrency: usize,
) -> Vec<tokio::task::JoinHandle<()>>
where
    R: Clone + Send + Sync + 'static,
    C: Send + Sync + 'static,
    H: Handler<R, C> + 'static,
{
    (0..concurrency)
        .map(|_| {
            let queue = queue.clone();
            let handler = handler.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                loop {
                    let (key, object) = queue.next().await;
                    let requeue = process_one(&key, object, handler.as_ref(), &ctx).await;
                    queue.complete(&key);
                    if let Some((delay, obj)) = requeue {
                        let queue = queue.clone();
                        let key = key.clone();
                        tokio::spawn(async move {
                            sleep(delay).await;
                            queue.enqueue(key, obj);
                        });
                    }
                }
            })
        })
        .collect()
}

async fn process_one<R, C, H>(key: &ObjectRef, object: R, handler: &H, ctx: &Arc<C>) -> Option<(Duration, R)>
where
    R: Clone,
    H: Handler<R, C>,
{
    let mut attempt = 0u32;
    loop {
        match handler.reconcile(object.clone(), ctx.clone()).await {
            Ok(Action::Requeue(delay)) => {
                info!(%key, ?delay, "✅ reconciled, requeuing");
                return Some((delay, object));
            }
            Ok(Action::AwaitChange) => {
                info!(%key, "✅ reconciled");
                return None;
            }
            Err(e) => {
                let retryable = e.downcast_ref::<Error>().map(Error::is_retryable).unwrap_or(false);
                if retryable && attempt < MAX_RETRY_ATTEMPTS {
                    let delay = backoff_with_jitter(attempt);
                    error!(%key, attempt, ?delay, "transient error, retrying: {e:#}");
                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                error!(%key, "❌ reconcile failed: {e:#}");
                return None;
            }
        }
    }
}

pub fn is_deleting<R: HasMeta>(obj: &R) -> bool {
    obj.meta().deletion_timestamp.is_some()
}

/// Adds `finalizer` if missing and persists the change. Mirrors the
/// teacher's `ensure_finalizer(present = true)`.
pub async fn ensure_finalizer<R>(store: &dyn ObjectStore<R>, obj: &mut R, finalizer: &str) -> Result<()>
where
    R: Clone + HasMeta + Send + Sync + 'static,
{
    if obj.meta_mut().add_finalizer(finalizer) {
        *obj = store.update(obj.clone()).await.map_err(|e| Error::Transient(e.to_string()))?;
    }
    Ok(())
}

/// Removes `finalizer`; once the finalizer set is empty and the object has a
/// `deletion_timestamp`, deletes it outright. Mirrors the teacher's
/// `ensure_finalizer(present = false)` plus the implicit apiserver GC a real
/// cluster would otherwise perform.
pub async fn release_finalizer<R>(store: &dyn ObjectStore<R>, obj: &mut R, finalizer: &str) -> Result<()>
where
    R: Clone + HasMeta + Send + Sync + 'static,
{
    if obj.meta_mut().remove_finalizer(finalizer) {
        let deleting = obj.meta().deletion_timestamp.is_some();
        let (ns, name) = obj.meta().key();
        *obj = store.update(obj.clone()).await.map_err(|e| Error::Transient(e.to_string()))?;
        if deleting && obj.meta().finalizers.is_empty() {
            store.delete(&ns, &name).await.map_err(|e| Error::Transient(e.to_string()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let small = backoff_with_jitter(0);
        let large = backoff_with_jitter(30);
        assert!(small >= BASE_BACKOFF);
        assert!(large <= MAX_BACKOFF + Duration::from_millis(MAX_BACKOFF.as_millis() as u64 / 4 + 1));
    }

    #[tokio::test]
    async fn enqueue_coalesces_same_key() {
        let queue: Arc<WorkQueue<i32>> = WorkQueue::new();
        let key = ObjectRef::new("Zone", "ns", "z1");
        queue.enqueue(key.clone(), 1);
        queue.enqueue(key.clone(), 2);
        let (got_key, obj) = queue.next().await;
        assert_eq!(got_key, key);
        assert_eq!(obj, 2);
    }

    #[tokio::test]
    async fn enqueue_while_in_flight_marks_dirty_and_requeues_on_complete() {
        let queue: Arc<WorkQueue<i32>> = WorkQueue::new();
        let key = ObjectRef::new("Zone", "ns", "z1");
        queue.enqueue(key.clone(), 1);
        let (_, _) = queue.next().await;
        queue.enqueue(key.clone(), 2);
        queue.complete(&key);
        let (got_key, obj) = queue.next().await;
        assert_eq!(got_key, key);
        assert_eq!(obj, 2);
    }
}
