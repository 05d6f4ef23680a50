//! `RemoteApiSubscription`: bridges two control planes (§4.9).

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::{Conditions, ObjectRef};
use crate::model::resource::Resource;

/// Identifies who is asking, on the *consumer* side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requester {
    pub application: String,
    pub team: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteApiSubscriptionSpec {
    pub api_base_path: String,
    /// Name of the `RemoteOrganization` this is addressed to. If one exists
    /// locally by this name, this object is a consumer-scenario request;
    /// otherwise it is the provider-side materialization shipped in from a
    /// remote consumer.
    pub target_organization: String,
    /// Filled in when this object arrived here as a provider-scenario
    /// payload: the organization id the request originated from.
    #[serde(default)]
    pub source_organization: Option<String>,
    pub requester: Requester,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteApiSubscriptionStatus {
    #[serde(default)]
    pub conditions: Conditions,
    pub application: Option<ObjectRef>,
    pub api_subscription: Option<ObjectRef>,
    pub approval_request: Option<ObjectRef>,
    pub approval: Option<ObjectRef>,
    pub route: Option<ObjectRef>,
}

impl_has_conditions!(RemoteApiSubscriptionStatus);

pub type RemoteApiSubscription = Resource<RemoteApiSubscriptionSpec, RemoteApiSubscriptionStatus>;
