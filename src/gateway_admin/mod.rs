//! Gateway admin API contract (§1): the concrete gateway (Kong) is an
//! external collaborator. Handlers that materialize `Route`/`Realm`/
//! `Consumer` objects into an actual gateway do so through this trait; the
//! in-memory reference implementation is good enough to exercise and test
//! the engine without one.

use async_trait::async_trait;

use crate::errors::Result;
use crate::model::kinds::gateway::{Consumer, Realm, Route};

#[async_trait]
pub trait GatewayAdminClient: Send + Sync {
    async fn apply_route(&self, route: &Route) -> Result<()>;
    async fn delete_route(&self, namespace: &str, name: &str) -> Result<()>;
    async fn apply_realm(&self, realm: &Realm) -> Result<()>;
    async fn delete_realm(&self, namespace: &str, name: &str) -> Result<()>;
    async fn apply_consumer(&self, consumer: &Consumer) -> Result<()>;
    async fn delete_consumer(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Records every call instead of talking to a real gateway; the object
/// store already holds the canonical Route/Realm/Consumer state, so this
/// reference client only needs to track that it was asked.
#[derive(Default)]
pub struct MemoryGatewayAdminClient {
    pub applied_routes: std::sync::Mutex<Vec<String>>,
    pub applied_realms: std::sync::Mutex<Vec<String>>,
    pub applied_consumers: std::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl GatewayAdminClient for MemoryGatewayAdminClient {
    async fn apply_route(&self, route: &Route) -> Result<()> {
        self.applied_routes.lock().unwrap().push(route.metadata.key().1);
        Ok(())
    }

    async fn delete_route(&self, _namespace: &str, name: &str) -> Result<()> {
        self.applied_routes.lock().unwrap().retain(|n| n != name);
        Ok(())
    }

    async fn apply_realm(&self, realm: &Realm) -> Result<()> {
        self.applied_realms.lock().unwrap().push(realm.metadata.key().1);
        Ok(())
    }

    async fn delete_realm(&self, _namespace: &str, name: &str) -> Result<()> {
        self.applied_realms.lock().unwrap().retain(|n| n != name);
        Ok(())
    }

    async fn apply_consumer(&self, consumer: &Consumer) -> Result<()> {
        self.applied_consumers.lock().unwrap().push(consumer.metadata.key().1);
        Ok(())
    }

    async fn delete_consumer(&self, _namespace: &str, name: &str) -> Result<()> {
        self.applied_consumers.lock().unwrap().retain(|n| n != name);
        Ok(())
    }
}
