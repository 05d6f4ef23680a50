//! `Environment`: the logical deployment every other resource is labelled
//! with. Ready as soon as it is created -- there is nothing to materialize.

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::Conditions;
use crate::model::resource::Resource;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    /// Human-readable description only; the identity of an Environment is
    /// its resource name.
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(EnvironmentStatus);

pub type Environment = Resource<EnvironmentSpec, EnvironmentStatus>;
