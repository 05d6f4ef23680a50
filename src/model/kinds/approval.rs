//! `Approval` / `ApprovalRequest` (§4.4).

use serde::{Deserialize, Serialize};

use crate::approval_fsm::{State, Strategy, Transition};
use crate::impl_has_conditions;
use crate::model::meta::{Conditions, ObjectRef};
use crate::model::resource::Resource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequestSpec {
    pub strategy: Strategy,
    pub state: State,
    pub requester: String,
    pub decider: String,
    pub target: ObjectRef,
    pub action: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalRequestStatus {
    #[serde(default)]
    pub conditions: Conditions,
    pub last_state: Option<State>,
    #[serde(default)]
    pub available_transitions: Vec<Transition>,
    #[serde(default)]
    pub notification_refs: Vec<ObjectRef>,
}

impl_has_conditions!(ApprovalRequestStatus);

pub type ApprovalRequest = Resource<ApprovalRequestSpec, ApprovalRequestStatus>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalSpec {
    pub target: ObjectRef,
    pub approved_request: ObjectRef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(ApprovalStatus);

pub type Approval = Resource<ApprovalSpec, ApprovalStatus>;
