//! `Zone`: the per-environment gateway+IdP footprint (§4.5).

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::{Conditions, ObjectRef};
use crate::model::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    World,
    Enterprise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdpConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub url: String,
}

/// A platform-operated API surfaced through every zone without going through
/// the exposure/subscription machinery (e.g. the LMS API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamApi {
    pub name: String,
    /// Path exposed to team consumers, e.g. `/test/team/api/v1`.
    pub path: String,
    /// Upstream URL the route proxies to.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub visibility: Visibility,
    pub idp: IdpConfig,
    pub gateway: GatewayConfig,
    pub redis: RedisConfig,
    #[serde(default)]
    pub team_apis: Vec<TeamApi>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneLinks {
    pub gateway_issuer: String,
    pub gateway_url: String,
    /// Host component of `gateway_url`, parsed once here so handlers
    /// building a Route's `downstream` don't each reimplement the parse.
    pub gateway_host: String,
    pub stargate_lms_issuer: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneStatus {
    #[serde(default)]
    pub conditions: Conditions,
    #[serde(default)]
    pub links: ZoneLinks,
    /// The nine required children, filled in once created so the handler can
    /// cheaply recheck readiness without re-deriving their names.
    #[serde(default)]
    pub children: Vec<ObjectRef>,
}

impl_has_conditions!(ZoneStatus);

pub type Zone = Resource<ZoneSpec, ZoneStatus>;
