//! `Team`: owns Applications and decides on ApiSubscriptions against the
//! APIs it exposes. `spec.secret` carries either a secret reference or the
//! admission-time sentinel `"rotate"` (see `secrets::ROTATE_SENTINEL`).

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::Conditions;
use crate::model::resource::Resource;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamSpec {
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub secret: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(TeamStatus);

pub type Team = Resource<TeamSpec, TeamStatus>;
