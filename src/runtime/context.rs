//! The typed context bag every handler receives (§9: "global mutable
//! singletons -> explicit capability passed in context"). One `EngineContext`
//! is constructed per running engine instance (conventionally one per
//! `Environment`) and shared behind an `Arc` across every worker.

use std::sync::Arc;

use crate::gateway_admin::GatewayAdminClient;
use crate::identity_admin::IdentityAdminClient;
use crate::model::kinds::api::Api;
use crate::model::kinds::api_exposure::ApiExposure;
use crate::model::kinds::api_specification::ApiSpecification;
use crate::model::kinds::api_subscription::ApiSubscription;
use crate::model::kinds::application::Application;
use crate::model::kinds::approval::{Approval, ApprovalRequest};
use crate::model::kinds::environment::Environment;
use crate::model::kinds::gateway::{Consumer, Gateway, Realm, Route};
use crate::model::kinds::identity::{IdentityClient, IdentityProvider, IdentityRealm};
use crate::model::kinds::notification::{Notification, NotificationChannel};
use crate::model::kinds::remote_api_subscription::RemoteApiSubscription;
use crate::model::kinds::remote_organization::RemoteOrganization;
use crate::model::kinds::rover::Rover;
use crate::model::kinds::team::Team;
use crate::model::kinds::zone::Zone;
use crate::notifications::ChannelDelivery;
use crate::secrets::SecretStore;
use crate::store::memory::MemoryStore;
use crate::sync::SyncerClient;

/// Every kind's store plus the external-collaborator clients, scoped to one
/// environment. `env_from_context`/`client_from_context` equivalents are the
/// `environment` field and the `*_client` methods below.
pub struct EngineContext {
    pub environment: String,

    pub environments: MemoryStore<Environment>,
    pub teams: MemoryStore<Team>,
    pub zones: MemoryStore<Zone>,
    pub applications: MemoryStore<Application>,
    pub api_specifications: MemoryStore<ApiSpecification>,
    pub apis: MemoryStore<Api>,
    pub api_exposures: MemoryStore<ApiExposure>,
    pub api_subscriptions: MemoryStore<ApiSubscription>,
    pub remote_organizations: MemoryStore<RemoteOrganization>,
    pub remote_api_subscriptions: MemoryStore<RemoteApiSubscription>,
    pub rovers: MemoryStore<Rover>,
    pub approvals: MemoryStore<Approval>,
    pub approval_requests: MemoryStore<ApprovalRequest>,
    pub notifications: MemoryStore<Notification>,
    pub notification_channels: MemoryStore<NotificationChannel>,
    pub routes: MemoryStore<Route>,
    pub realms: MemoryStore<Realm>,
    pub consumers: MemoryStore<Consumer>,
    pub identity_providers: MemoryStore<IdentityProvider>,
    pub identity_realms: MemoryStore<IdentityRealm>,
    pub identity_clients: MemoryStore<IdentityClient>,
    pub gateways: MemoryStore<Gateway>,

    pub secrets: Arc<dyn SecretStore>,
    pub gateway_admin: Arc<dyn GatewayAdminClient>,
    pub identity_admin: Arc<dyn IdentityAdminClient>,
    pub syncer: Arc<dyn SyncerClient>,
    pub delivery: Arc<dyn ChannelDelivery>,
}

impl EngineContext {
    pub fn new(
        environment: impl Into<String>,
        secrets: Arc<dyn SecretStore>,
        gateway_admin: Arc<dyn GatewayAdminClient>,
        identity_admin: Arc<dyn IdentityAdminClient>,
        syncer: Arc<dyn SyncerClient>,
        delivery: Arc<dyn ChannelDelivery>,
    ) -> Self {
        Self {
            environment: environment.into(),
            environments: MemoryStore::new(),
            teams: MemoryStore::new(),
            zones: MemoryStore::new(),
            applications: MemoryStore::new(),
            api_specifications: MemoryStore::new(),
            apis: MemoryStore::new(),
            api_exposures: MemoryStore::new(),
            api_subscriptions: MemoryStore::new(),
            remote_organizations: MemoryStore::new(),
            remote_api_subscriptions: MemoryStore::new(),
            rovers: MemoryStore::new(),
            approvals: MemoryStore::new(),
            approval_requests: MemoryStore::new(),
            notifications: MemoryStore::new(),
            notification_channels: MemoryStore::new(),
            routes: MemoryStore::new(),
            realms: MemoryStore::new(),
            consumers: MemoryStore::new(),
            identity_providers: MemoryStore::new(),
            identity_realms: MemoryStore::new(),
            identity_clients: MemoryStore::new(),
            gateways: MemoryStore::new(),
            secrets,
            gateway_admin,
            identity_admin,
            syncer,
            delivery,
        }
    }
}
