//! `ApiSubscription`: consumes an Api at a basePath through a Zone,
//! gated by an ApprovalRequest decided by the owning team of the active
//! exposure.

use serde::{Deserialize, Serialize};

use crate::approval_fsm::Strategy;
use crate::impl_has_conditions;
use crate::model::meta::{Conditions, ObjectRef};
use crate::model::resource::Resource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSubscriptionSpec {
    pub application: String,
    pub api_base_path: String,
    pub zone: String,
    #[serde(default = "default_strategy")]
    pub approval_strategy: Strategy,
    /// For `Auto`-strategy subscriptions the caller may only create the
    /// request pre-granted, not transition it later.
    #[serde(default)]
    pub trusted_teams: Vec<String>,
}

fn default_strategy() -> Strategy {
    Strategy::Simple
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSubscriptionStatus {
    #[serde(default)]
    pub conditions: Conditions,
    pub approval_request: Option<ObjectRef>,
    pub route: Option<ObjectRef>,
}

impl_has_conditions!(ApiSubscriptionStatus);

pub type ApiSubscription = Resource<ApiSubscriptionSpec, ApiSubscriptionStatus>;
