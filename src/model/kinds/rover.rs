//! `Rover`: the user-facing orchestrator resource (§4.7). One Rover expands
//! into one Application plus one ApiSubscription per subscription entry and
//! one ApiExposure per exposure entry.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::approval_fsm::Strategy;
use crate::impl_has_conditions;
use crate::model::meta::{Conditions, ObjectRef};
use crate::model::resource::Resource;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RoverSubscriptionEntry {
    pub api_base_path: String,
    #[serde(default = "default_strategy")]
    pub approval_strategy: Strategy,
    #[serde(default)]
    pub trusted_teams: Vec<String>,
}

fn default_strategy() -> Strategy {
    Strategy::Simple
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RoverExposureEntry {
    pub api_base_path: String,
    pub upstream_url: String,
    #[serde(default)]
    pub failover_zones: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RoverSpec {
    pub team: String,
    pub group: String,
    pub zone: String,
    /// Secret fields may carry `$<envId:teamId:appId:key:version>` or a
    /// plain value that admission rewrites into one (§4.10).
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub subscriptions: Vec<RoverSubscriptionEntry>,
    #[serde(default)]
    pub exposures: Vec<RoverExposureEntry>,
    #[serde(default)]
    pub remote_organization: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoverStatus {
    #[serde(default)]
    pub conditions: Conditions,
    pub application: Option<ObjectRef>,
    #[serde(default)]
    pub subscriptions: Vec<ObjectRef>,
    #[serde(default)]
    pub exposures: Vec<ObjectRef>,
}

impl_has_conditions!(RoverStatus);

pub type Rover = Resource<RoverSpec, RoverStatus>;
