//! Identity provider admin API contract (§1): the concrete IdP (Keycloak)
//! is an external collaborator. Handlers that materialize
//! `IdentityProvider`/`IdentityRealm`/`IdentityClient` objects do so
//! through this trait.

use async_trait::async_trait;

use crate::errors::Result;
use crate::model::kinds::identity::{IdentityClient, IdentityProvider, IdentityRealm};

#[async_trait]
pub trait IdentityAdminClient: Send + Sync {
    async fn apply_provider(&self, provider: &IdentityProvider) -> Result<()>;
    async fn apply_realm(&self, realm: &IdentityRealm) -> Result<()>;
    async fn apply_client(&self, client: &IdentityClient) -> Result<()>;
    async fn delete_client(&self, namespace: &str, name: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryIdentityAdminClient {
    pub applied_providers: std::sync::Mutex<Vec<String>>,
    pub applied_realms: std::sync::Mutex<Vec<String>>,
    pub applied_clients: std::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl IdentityAdminClient for MemoryIdentityAdminClient {
    async fn apply_provider(&self, provider: &IdentityProvider) -> Result<()> {
        self.applied_providers.lock().unwrap().push(provider.metadata.key().1);
        Ok(())
    }

    async fn apply_realm(&self, realm: &IdentityRealm) -> Result<()> {
        self.applied_realms.lock().unwrap().push(realm.metadata.key().1);
        Ok(())
    }

    async fn apply_client(&self, client: &IdentityClient) -> Result<()> {
        self.applied_clients.lock().unwrap().push(client.metadata.key().1);
        Ok(())
    }

    async fn delete_client(&self, _namespace: &str, name: &str) -> Result<()> {
        self.applied_clients.lock().unwrap().retain(|n| n != name);
        Ok(())
    }
}
