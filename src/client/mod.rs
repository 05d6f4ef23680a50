//! The scoped mutating client (§4.2): every reconciler talks to its children
//! exclusively through this wrapper, never through the raw `ObjectStore`.

use std::cell::Cell;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{Error, Result};
use crate::model::meta::{labels as label_keys, owned_by_label, ObjectMeta, OwnerReference};
use crate::model::resource::Resource;
use crate::store::{HasMeta, ObjectStore, StoreError};

/// Wraps a single kind's store with environment-scoping and ownership
/// stamping. One `ScopedClient` is constructed per reconcile, per child
/// kind the handler touches.
pub struct ScopedClient<'a, Spec, Status> {
    store: &'a dyn ObjectStore<Resource<Spec, Status>>,
    environment: String,
    any_changed: Cell<bool>,
}

impl<'a, Spec, Status> ScopedClient<'a, Spec, Status>
where
    Spec: Serialize + Clone + Send + Sync + 'static,
    Status: Serialize + Clone + Send + Sync + 'static,
{
    pub fn new(store: &'a dyn ObjectStore<Resource<Spec, Status>>, environment: impl Into<String>) -> Self {
        Self { store, environment: environment.into(), any_changed: Cell::new(false) }
    }

    pub fn any_changed(&self) -> bool {
        self.any_changed.get()
    }

    /// Fetches the child if present, lets `build` compute the fully desired
    /// object (the caller decides what to keep from `existing`, typically
    /// preserving `status`), stamps ownership/environment labels, and writes
    /// only if the normalized content differs. Returns `(object, wrote)`.
    pub async fn create_or_update<F>(
        &self,
        namespace: &str,
        name: &str,
        owner: &OwnerReference,
        now: DateTime<Utc>,
        build: F,
    ) -> Result<(Resource<Spec, Status>, bool)>
    where
        F: FnOnce(Option<Resource<Spec, Status>>) -> Resource<Spec, Status>,
    {
        let existing = self.store.get(namespace, name).await;
        let mut desired = build(existing.clone());

        desired.metadata.namespace = namespace.to_string();
        desired.metadata.name = name.to_string();
        stamp(&mut desired.metadata, &self.environment, owner);

        match existing {
            None => {
                desired.metadata = ObjectMeta::new(namespace, name, now);
                stamp(&mut desired.metadata, &self.environment, owner);
                let created = self.store.create(desired).await.map_err(store_err)?;
                self.any_changed.set(true);
                Ok((created, true))
            }
            Some(existing) => {
                if content_eq(&existing, &desired) {
                    Ok((existing, false))
                } else {
                    desired.metadata.resource_version = existing.metadata.resource_version;
                    desired.metadata.generation = existing.metadata.generation + 1;
                    desired.metadata.creation_timestamp = existing.metadata.creation_timestamp;
                    desired.metadata.uid = existing.metadata.uid;
                    desired.metadata.finalizers = existing.metadata.finalizers.clone();
                    let updated = self.store.update(desired).await.map_err(store_err)?;
                    self.any_changed.set(true);
                    Ok((updated, true))
                }
            }
        }
    }

    /// Deletes every child labelled `owned-by = owner` whose key is not in
    /// `desired_keys`.
    pub async fn cleanup(&self, owner: &OwnerReference, desired_keys: &[(String, String)]) -> Result<usize> {
        let owned_by = owned_by_label(&owner.kind, &owner.namespace, &owner.name);
        let mut removed = 0;
        for obj in self.store.list(None).await {
            let meta = obj.meta();
            if meta.owned_by() == Some(owned_by.as_str())
                && !desired_keys.iter().any(|(ns, n)| *ns == meta.namespace && *n == meta.name)
            {
                self.store.delete(&meta.namespace, &meta.name).await.map_err(store_err)?;
                self.any_changed.set(true);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Deletes every child labelled `owned-by = owner`, regardless of the
    /// desired set -- used when the owner itself is being deleted.
    pub async fn cleanup_all(&self, owner: &OwnerReference) -> Result<usize> {
        self.cleanup(owner, &[]).await
    }
}

fn stamp(meta: &mut ObjectMeta, environment: &str, owner: &OwnerReference) {
    meta.labels.insert(label_keys::ENVIRONMENT.to_string(), environment.to_string());
    meta.labels
        .insert(label_keys::OWNED_BY.to_string(), owned_by_label(&owner.kind, &owner.namespace, &owner.name));
    meta.owner_references = vec![owner.clone()];
}

fn store_err(e: StoreError) -> anyhow::Error {
    match e {
        StoreError::Conflict { .. } => Error::Transient(e.to_string()).into(),
        StoreError::NotFound => Error::not_found("ChildNotFound", e.to_string()).into(),
    }
}

/// Normalized comparison ignoring status and managed metadata (resource
/// version, generation, timestamps, uid): only `spec` and the labels/
/// finalizers we don't stamp ourselves are compared.
fn content_eq<Spec: Serialize, Status>(a: &Resource<Spec, Status>, b: &Resource<Spec, Status>) -> bool {
    let spec_a = serde_json::to_value(&a.spec).expect("spec serializes");
    let spec_b = serde_json::to_value(&b.spec).expect("spec serializes");
    if spec_a != spec_b {
        return false;
    }
    let caller_labels = |m: &ObjectMeta| -> Vec<(&String, &String)> {
        m.labels.iter().filter(|(k, _)| ![label_keys::ENVIRONMENT, label_keys::OWNED_BY].contains(&k.as_str())).collect()
    };
    caller_labels(&a.metadata) == caller_labels(&b.metadata) && a.metadata.finalizers == b.metadata.finalizers
}
