//! Identity-provider-layer kinds materialized by the Zone handler:
//! `IdentityProvider`, `IdentityRealm`, `IdentityClient`. The concrete IdP
//! (Keycloak) is an external collaborator (§1).

use serde::{Deserialize, Serialize};

use crate::impl_has_conditions;
use crate::model::meta::Conditions;
use crate::model::resource::Resource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProviderSpec {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityProviderStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(IdentityProviderStatus);

pub type IdentityProvider = Resource<IdentityProviderSpec, IdentityProviderStatus>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRealmSpec {
    pub identity_provider: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityRealmStatus {
    #[serde(default)]
    pub conditions: Conditions,
    pub issuer_url: Option<String>,
}

impl_has_conditions!(IdentityRealmStatus);

pub type IdentityRealm = Resource<IdentityRealmSpec, IdentityRealmStatus>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClientSpec {
    pub realm: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityClientStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

impl_has_conditions!(IdentityClientStatus);

pub type IdentityClient = Resource<IdentityClientSpec, IdentityClientStatus>;

/// Issuer URL the Zone publishes for a realm living under an identity
/// provider, e.g. `https://test-iris.de/auth/realms/team-test`.
pub fn issuer_url(idp_url: &str, realm_name: &str) -> String {
    format!("{}/auth/realms/{}", idp_url.trim_end_matches('/'), realm_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_issuer_url() {
        assert_eq!(
            issuer_url("https://test-iris.de/", "team-test"),
            "https://test-iris.de/auth/realms/team-test"
        );
    }
}
