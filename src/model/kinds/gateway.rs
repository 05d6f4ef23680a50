//! Gateway-layer kinds materialized by handlers: `Route`, `Realm`,
//! `Consumer`. These model the *shape* the platform hands to the gateway
//! admin API; the Kong-specific client is an external collaborator (§1).

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::Conditions;
use crate::model::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteType {
    Real,
    Proxy,
    Failover,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upstream {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub weight: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Downstream {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub issuer_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteSecurity {
    #[serde(default)]
    pub disable_access_control: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    pub zone: String,
    pub realm: String,
    #[serde(rename = "type")]
    pub route_type: RouteType,
    pub upstreams: Vec<Upstream>,
    pub downstream: Downstream,
    #[serde(default)]
    pub security: RouteSecurity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(RouteStatus);

pub type Route = Resource<RouteSpec, RouteStatus>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmSpec {
    pub gateway: String,
    #[serde(default)]
    pub default_consumers: Vec<String>,
    pub issuer_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(RealmStatus);

pub type Realm = Resource<RealmSpec, RealmStatus>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerSpec {
    pub realm: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsumerStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(ConsumerStatus);

pub type Consumer = Resource<ConsumerSpec, ConsumerStatus>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySpec {
    pub identity_provider: String,
    pub identity_realm: String,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: String,
    pub admin_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(GatewayStatus);

pub type Gateway = Resource<GatewaySpec, GatewayStatus>;
