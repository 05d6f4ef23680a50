//! `ApiSpecification`: the OpenAPI document a team publishes; reconciles
//! into a normalized `Api` child (§3).

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::{Conditions, ObjectRef};
use crate::model::resource::Resource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSpecificationSpec {
    pub team: String,
    /// The raw OpenAPI 2/3 document, kept opaque here -- parsing its
    /// `basePath`/`info.version`/vendor extensions is naming.rs + handler
    /// concern, not a model concern.
    pub open_api_document: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSpecificationStatus {
    #[serde(default)]
    pub conditions: Conditions,
    pub api: Option<ObjectRef>,
    /// sha256 of the raw document, so operators can tell at a glance whether
    /// `status.api` reflects the latest upload without diffing the whole body.
    #[serde(default)]
    pub document_fingerprint: String,
}

impl_has_conditions!(ApiSpecificationStatus);

pub type ApiSpecification = Resource<ApiSpecificationSpec, ApiSpecificationStatus>;

/// Normalized projection of an OpenAPI document, used both to populate `Api`
/// and to validate exposures/subscriptions against declared scopes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedApi {
    pub name: String,
    pub base_path: String,
    pub version: String,
    pub category: String,
    pub oauth2_scopes: Vec<String>,
    pub x_vendor: bool,
}
