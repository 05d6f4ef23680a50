//! `Application`: a team's deployable unit, bound to a primary zone and
//! optional failover zones.

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::{Conditions, ObjectRef};
use crate::model::resource::Resource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSpec {
    pub team: String,
    pub zone: String,
    #[serde(default)]
    pub failover_zones: Vec<String>,
    #[serde(default)]
    pub needs_client: bool,
    #[serde(default)]
    pub needs_consumer: bool,
    /// Present when onboarded via a RemoteApiSubscription provider scenario;
    /// carries the originating organization id for labeling.
    #[serde(default)]
    pub org_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationStatus {
    #[serde(default)]
    pub conditions: Conditions,
    pub identity_client: Option<ObjectRef>,
    pub gateway_consumer: Option<ObjectRef>,
}

impl_has_conditions!(ApplicationStatus);

pub type Application = Resource<ApplicationSpec, ApplicationStatus>;
