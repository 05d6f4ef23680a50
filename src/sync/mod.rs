//! Cross-control-plane synchronization (§4.9): the transport a consumer-
//! scenario `RemoteApiSubscription` uses to ship itself to, and receive
//! status back from, the remote control plane that owns the target
//! organization. The remote CP itself is an external collaborator; this
//! trait is the only contract this crate depends on.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;

/// Outcome of shipping an object (or its status) to the remote side.
/// `updated = false` means the remote already held this exact content --
/// the idempotence requirement from §8.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub updated: bool,
    pub canonical_form: Value,
}

#[async_trait]
pub trait SyncerClient: Send + Sync {
    /// Consumer → provider: ship a `RemoteApiSubscription` request.
    async fn send(&self, target_organization: &str, payload: &Value) -> Result<SyncResult>;

    /// Provider → consumer: mirror status (approval/approval request/route)
    /// back to the origin.
    async fn send_status(&self, source_organization: &str, payload: &Value) -> Result<SyncResult>;
}

/// In-process reference transport: two control planes sharing one process
/// would hand each other `Value`s directly; this fake stores the last
/// payload per target and replays idempotently by comparing content.
#[derive(Default)]
pub struct MemorySyncerClient {
    sent: std::sync::Mutex<std::collections::HashMap<String, Value>>,
    statuses: std::sync::Mutex<std::collections::HashMap<String, Value>>,
}

#[async_trait]
impl SyncerClient for MemorySyncerClient {
    async fn send(&self, target_organization: &str, payload: &Value) -> Result<SyncResult> {
        let mut sent = self.sent.lock().unwrap();
        let updated = sent.get(target_organization) != Some(payload);
        sent.insert(target_organization.to_string(), payload.clone());
        Ok(SyncResult { updated, canonical_form: payload.clone() })
    }

    async fn send_status(&self, source_organization: &str, payload: &Value) -> Result<SyncResult> {
        let mut statuses = self.statuses.lock().unwrap();
        let updated = statuses.get(source_organization) != Some(payload);
        statuses.insert(source_organization.to_string(), payload.clone());
        Ok(SyncResult { updated, canonical_form: payload.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replaying_identical_content_is_not_an_update() {
        let client = MemorySyncerClient::default();
        let payload = json!({"apiBasePath": "/eni/x/v1"});
        let first = client.send("org-1", &payload).await.unwrap();
        assert!(first.updated);
        let second = client.send("org-1", &payload).await.unwrap();
        assert!(!second.updated);
    }
}
