//! `ApiExposure`: publishes an Api at a basePath through a Zone (§4.6).

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::{Conditions, ObjectRef};
use crate::model::resource::Resource;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailoverConfig {
    #[serde(default)]
    pub zones: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrafficConfig {
    #[serde(default)]
    pub failover: FailoverConfig,
}

/// Declares a machine-to-machine OAuth2 client-credentials requirement on
/// the exposure, validated against the Api's declared scopes unless an
/// external IdP is configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct M2mSecurity {
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub external_idp: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExposureSecurity {
    #[serde(default)]
    pub m2m: Option<M2mSecurity>,
    #[serde(default)]
    pub disable_access_control: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiExposureSpec {
    pub application: String,
    pub api_base_path: String,
    pub zone: String,
    /// Upstream this exposure's Route forwards to.
    pub upstream_url: String,
    #[serde(default)]
    pub traffic: TrafficConfig,
    #[serde(default)]
    pub security: ExposureSecurity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiExposureStatus {
    #[serde(default)]
    pub conditions: Conditions,
    #[serde(default)]
    pub active: bool,
    pub route: Option<ObjectRef>,
    pub failover_route: Option<ObjectRef>,
}

impl_has_conditions!(ApiExposureStatus);

pub type ApiExposure = Resource<ApiExposureSpec, ApiExposureStatus>;
