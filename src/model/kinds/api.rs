//! `Api`: unique per basePath (case-insensitive), the contention point for
//! exposures and the scope source for M2M subscriptions.

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::Conditions;
use crate::model::resource::Resource;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSpec {
    pub base_path: String,
    pub version: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub oauth2_scopes: Vec<String>,
    #[serde(default)]
    pub x_vendor: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub conditions: Conditions,
    #[serde(default)]
    pub active: bool,
}

impl_has_conditions!(ApiStatus);

pub type Api = Resource<ApiSpec, ApiStatus>;
