//! `Notification` / `NotificationChannel` (§4.8).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::{Conditions, ObjectRef};
use crate::model::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purpose {
    ApprovalRequestCreated,
    ApprovalRequestDecided,
    ApprovalRequestPending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSpec {
    pub purpose: Purpose,
    pub channels: Vec<ObjectRef>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelState {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub sent: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationStatus {
    #[serde(default)]
    pub conditions: Conditions,
    #[serde(default)]
    pub states: BTreeMap<String, ChannelState>,
}

impl_has_conditions!(NotificationStatus);

pub type Notification = Resource<NotificationSpec, NotificationStatus>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelTransport {
    Email,
    MsTeams,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationChannelSpec {
    pub transport: ChannelTransport,
    pub address: String,
    #[serde(default)]
    pub ignore_purposes: Vec<Purpose>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationChannelStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(NotificationChannelStatus);

pub type NotificationChannel = Resource<NotificationChannelSpec, NotificationChannelStatus>;
