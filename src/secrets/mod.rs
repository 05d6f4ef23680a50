//! Secret indirection (§4.10): opaque reference tokens that decouple values
//! from object bodies. Handlers resolve references to values only for the
//! duration of a reconcile and never persist raw values.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::{Error, Result};

/// Sentinel a Team/Rover's secret field may carry at admission time, asking
/// the defaulter to mint a freshly rotated reference instead.
pub const ROTATE_SENTINEL: &str = "rotate";

/// An opaque reference token: `$<envId:teamId:appId:key:version>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRef {
    pub env_id: String,
    pub team_id: String,
    pub app_id: String,
    pub key: String,
    pub version: u32,
}

impl SecretRef {
    pub fn new(env_id: impl Into<String>, team_id: impl Into<String>, app_id: impl Into<String>, key: impl Into<String>, version: u32) -> Self {
        Self { env_id: env_id.into(), team_id: team_id.into(), app_id: app_id.into(), key: key.into(), version }
    }

    /// `$<envId:teamId:appId:key:version>` -- the only shape a value is
    /// ever allowed to carry in a persisted spec.
    pub fn is_reference(value: &str) -> bool {
        value.starts_with("$<") && value.ends_with('>')
    }

    /// Onboarding key this reference is gated behind: team-scoped when
    /// `app_id` is empty (Team secrets have no owning Application), else
    /// application-scoped.
    pub fn onboarding_path(&self) -> String {
        if self.app_id.is_empty() {
            format!("{}/{}", self.env_id, self.team_id)
        } else {
            format!("{}/{}/{}", self.env_id, self.team_id, self.app_id)
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let inner = value.strip_prefix("$<")?.strip_suffix(">")?;
        let parts: Vec<&str> = inner.split(':').collect();
        let [env_id, team_id, app_id, key, version] = parts[..] else { return None };
        Some(Self {
            env_id: env_id.to_string(),
            team_id: team_id.to_string(),
            app_id: app_id.to_string(),
            key: key.to_string(),
            version: version.parse().ok()?,
        })
    }
}

impl std::fmt::Display for SecretRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "$<{}:{}:{}:{}:{}>", self.env_id, self.team_id, self.app_id, self.key, self.version)
    }
}

/// The well-known secret keys onboarding (§4.10/§4.7) creates references
/// for automatically.
pub const WELL_KNOWN_KEY_CLIENT_SECRET: &str = "clientSecret";

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, r: &SecretRef) -> Result<String>;
    async fn set(&self, r: &SecretRef, value: &str) -> Result<SecretRef>;
    async fn rotate(&self, r: &SecretRef) -> Result<SecretRef>;

    async fn upsert_environment(&self, env_id: &str) -> Result<()>;
    async fn upsert_team(&self, env_id: &str, team_id: &str) -> Result<()>;
    async fn upsert_application(&self, env_id: &str, team_id: &str, app_id: &str) -> Result<()>;
    async fn delete_environment(&self, env_id: &str) -> Result<()>;
    async fn delete_team(&self, env_id: &str, team_id: &str) -> Result<()>;
    async fn delete_application(&self, env_id: &str, team_id: &str, app_id: &str) -> Result<()>;
}

/// Reference implementation used by tests and by embedders without a real
/// Vault/Secrets-Manager-style backend yet.
#[derive(Default)]
pub struct MemorySecretStore {
    values: Mutex<HashMap<SecretRef, String>>,
    onboarded: Mutex<std::collections::HashSet<String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn require_onboarded(&self, path: &str) -> Result<()> {
        if self.onboarded.lock().unwrap().contains(path) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!("{path} is not onboarded")).into())
        }
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, r: &SecretRef) -> Result<String> {
        self.values
            .lock()
            .unwrap()
            .get(r)
            .cloned()
            .ok_or_else(|| Error::not_found("SecretNotFound", format!("no value for {r}")).into())
    }

    async fn set(&self, r: &SecretRef, value: &str) -> Result<SecretRef> {
        self.values.lock().unwrap().insert(r.clone(), value.to_string());
        Ok(r.clone())
    }

    async fn rotate(&self, r: &SecretRef) -> Result<SecretRef> {
        self.require_onboarded(&r.onboarding_path())?;
        let new_ref = SecretRef { version: r.version + 1, ..r.clone() };
        let new_value = uuid::Uuid::new_v4().to_string();
        self.values.lock().unwrap().insert(new_ref.clone(), new_value);
        Ok(new_ref)
    }

    async fn upsert_environment(&self, env_id: &str) -> Result<()> {
        self.onboarded.lock().unwrap().insert(env_id.to_string());
        Ok(())
    }

    async fn upsert_team(&self, env_id: &str, team_id: &str) -> Result<()> {
        self.onboarded.lock().unwrap().insert(format!("{env_id}/{team_id}"));
        Ok(())
    }

    async fn upsert_application(&self, env_id: &str, team_id: &str, app_id: &str) -> Result<()> {
        self.onboarded.lock().unwrap().insert(format!("{env_id}/{team_id}/{app_id}"));
        Ok(())
    }

    async fn delete_environment(&self, env_id: &str) -> Result<()> {
        self.onboarded.lock().unwrap().remove(env_id);
        Ok(())
    }

    async fn delete_team(&self, env_id: &str, team_id: &str) -> Result<()> {
        self.onboarded.lock().unwrap().remove(&format!("{env_id}/{team_id}"));
        Ok(())
    }

    async fn delete_application(&self, env_id: &str, team_id: &str, app_id: &str) -> Result<()> {
        self.onboarded.lock().unwrap().remove(&format!("{env_id}/{team_id}/{app_id}"));
        Ok(())
    }
}

/// Resolves `value` in place if it is a reference, running `f` with the
/// resolved value, then restores the original reference string -- handlers
/// never persist the resolved value, only the token.
pub async fn with_resolved<'a, F, Fut, T>(store: &dyn SecretStore, value: &'a str, f: F) -> Result<T>
where
    F: FnOnce(String) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let resolved = match SecretRef::parse(value) {
        Some(r) => store.get(&r).await?,
        None => value.to_string(),
    };
    f(resolved).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_reference_tokens() {
        let token = "$<env1:team1:app1:clientSecret:3>";
        let r = SecretRef::parse(token).unwrap();
        assert_eq!(r, SecretRef::new("env1", "team1", "app1", "clientSecret", 3));
        assert_eq!(r.to_string(), token);
    }

    #[test]
    fn rejects_non_reference_values() {
        assert!(SecretRef::parse("plain-value").is_none());
        assert!(!SecretRef::is_reference("plain-value"));
        assert!(SecretRef::is_reference("$<a:b:c:d:1>"));
    }

    #[tokio::test]
    async fn rotate_requires_onboarding_and_bumps_version() {
        let store = MemorySecretStore::new();
        let r = SecretRef::new("env1", "team1", "app1", "clientSecret", 1);
        assert!(store.rotate(&r).await.is_err());
        store.upsert_application("env1", "team1", "app1").await.unwrap();
        let rotated = store.rotate(&r).await.unwrap();
        assert_eq!(rotated.version, 2);
        assert!(store.get(&rotated).await.is_ok());
    }
}
