//! `RemoteOrganization`: a peer control plane addressable from here. Its mere
//! existence (by name, within an environment) is what selects the consumer
//! scenario for a `RemoteApiSubscription` (§4.9).

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::Conditions;
use crate::model::resource::Resource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrganizationSpec {
    pub id: String,
    pub organization_name: String,
    pub gateway_zone: String,
    pub issuer_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteOrganizationStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(RemoteOrganizationStatus);

pub type RemoteOrganization = Resource<RemoteOrganizationSpec, RemoteOrganizationStatus>;
