//! Object metadata shared by every resource kind.
//!
//! This mirrors the shape Kubernetes gives `ObjectMeta`/`Condition`, but is
//! owned by this crate rather than borrowed from a real apiserver client:
//! the Kubernetes-like object/watch runtime is an external collaborator here
//! (see the crate root docs), so we define our own small, serde-friendly
//! version of the parts we actually need.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Well-known label keys. Bit-exact strings matter: external tooling queries
/// by these keys.
pub mod labels {
    pub const ENVIRONMENT: &str = "cp.ei.telekom.de/environment";
    pub const BASEPATH: &str = "cp.ei.telekom.de/basepath";
    pub const OWNED_BY: &str = "cp.ei.telekom.de/owned-by";
    pub const APPLICATION: &str = "cp.ei.telekom.de/application";
    pub const TYPE: &str = "cp.ei.telekom.de/type";
    pub const ORG_ID: &str = "cp.ei.telekom.de/org-id";
}

/// A reference to an owning object. `controller = true` means deleting the
/// owner cascades into deleting this object once its finalizers clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub uid: Uuid,
    pub controller: bool,
    pub block_owner_deletion: bool,
}

impl OwnerReference {
    pub fn controller(kind: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>, uid: Uuid) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
            uid,
            controller: true,
            block_owner_deletion: true,
        }
    }
}

/// A non-owning pointer to another object, used for peer links (e.g. an
/// ApprovalRequest's target, a Route's originating exposure).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(kind: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { kind: kind.into(), namespace: namespace.into(), name: name.into() }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// The two canonical condition types plus `Blocked`, used across every kind.
pub const COND_PROCESSING: &str = "Processing";
pub const COND_READY: &str = "Ready";
pub const COND_BLOCKED: &str = "Blocked";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    pub observed_generation: i64,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    pub fn new(type_: &str, status: ConditionStatus, reason: &str, message: impl Into<String>, observed_generation: i64, now: DateTime<Utc>) -> Self {
        Self {
            type_: type_.to_string(),
            status,
            reason: reason.to_string(),
            message: message.into(),
            observed_generation,
            last_transition_time: now,
        }
    }
}

/// Ordered-by-insertion, keyed-by-type condition set. Upserting preserves the
/// `last_transition_time` of a condition whose status did not change, and
/// only bumps it when `status` flips -- matching the teacher's `upsert_condition`
/// helper, generalized with a transition-time guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions(pub Vec<Condition>);

impl Conditions {
    pub fn get(&self, type_: &str) -> Option<&Condition> {
        self.0.iter().find(|c| c.type_ == type_)
    }

    pub fn is_true(&self, type_: &str) -> bool {
        matches!(self.get(type_), Some(c) if c.status == ConditionStatus::True)
    }

    pub fn upsert(&mut self, mut new: Condition) {
        if let Some(existing) = self.0.iter().position(|c| c.type_ == new.type_) {
            if self.0[existing].status == new.status {
                new.last_transition_time = self.0[existing].last_transition_time;
            }
            self.0[existing] = new;
        } else {
            self.0.push(new);
        }
    }

    pub fn remove(&mut self, type_: &str) {
        self.0.retain(|c| c.type_ != type_);
    }
}

/// Shared metadata block. `labels`/`annotations` use `BTreeMap` so comparisons
/// and serialized output are deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub owner_references: Vec<OwnerReference>,
    #[serde(default)]
    pub finalizers: Vec<String>,
    #[serde(default)]
    pub generation: i64,
    #[serde(default)]
    pub resource_version: u64,
    pub creation_timestamp: DateTime<Utc>,
    pub deletion_timestamp: Option<DateTime<Utc>>,
    pub uid: Uuid,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            owner_references: Vec::new(),
            finalizers: Vec::new(),
            generation: 1,
            resource_version: 0,
            creation_timestamp: now,
            deletion_timestamp: None,
            uid: Uuid::new_v4(),
        }
    }

    pub fn key(&self) -> (String, String) {
        (self.namespace.clone(), self.name.clone())
    }

    pub fn environment(&self) -> Option<&str> {
        self.labels.get(labels::ENVIRONMENT).map(String::as_str)
    }

    pub fn owned_by(&self) -> Option<&str> {
        self.labels.get(labels::OWNED_BY).map(String::as_str)
    }

    pub fn has_finalizer(&self, f: &str) -> bool {
        self.finalizers.iter().any(|x| x == f)
    }

    pub fn add_finalizer(&mut self, f: &str) -> bool {
        if self.has_finalizer(f) {
            false
        } else {
            self.finalizers.push(f.to_string());
            true
        }
    }

    pub fn remove_finalizer(&mut self, f: &str) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|x| x != f);
        self.finalizers.len() != before
    }

    pub fn controller_owner(&self) -> Option<&OwnerReference> {
        self.owner_references.iter().find(|o| o.controller)
    }
}

/// `owned-by` label value, e.g. `apiexposure.dev--team-a.checkout-v1`.
pub fn owned_by_label(kind: &str, namespace: &str, name: &str) -> String {
    format!("{}.{}.{}", kind.to_ascii_lowercase(), namespace, name)
}
