//! Representative admission rules (§4.3).

use std::collections::HashSet;
use std::net::IpAddr;

use url::Url;

use crate::errors::{FieldError, Result};
use crate::model::kinds::gateway::RouteSpec;
use crate::model::kinds::rover::RoverSpec;
use crate::model::kinds::team::TeamSpec;
use crate::model::kinds::zone::{Visibility, Zone};
use crate::naming::normalize_base_path;
use crate::secrets::{SecretRef, SecretStore, ROTATE_SENTINEL, WELL_KNOWN_KEY_CLIENT_SECRET};
use crate::store::ObjectStore;

/// `metadata.name == "{spec.group}--{spec.name}"`.
pub fn validate_team_name(name: &str, spec: &TeamSpec) -> Vec<FieldError> {
    let expected = format!("{}--{}", spec.group, spec.name);
    if name == expected {
        vec![]
    } else {
        vec![FieldError::new("metadata.name", "NameConvention", format!("name must be {expected:?}, was {name:?}"))]
    }
}

fn is_localhost(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost") || host.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}

/// Upstream URLs must be absolute `http(s)` and must not target localhost.
pub fn validate_upstream_url(field: &str, raw: &str) -> Vec<FieldError> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => match url.host_str() {
            Some(host) if is_localhost(host) => {
                vec![FieldError::new(field, "LocalhostNotAllowed", format!("{raw:?} must not target localhost"))]
            }
            Some(_) => vec![],
            None => vec![FieldError::new(field, "NoHost", format!("{raw:?} has no host"))],
        },
        Ok(_) => vec![FieldError::new(field, "SchemeNotAllowed", format!("{raw:?} must use http or https"))],
        Err(e) => vec![FieldError::new(field, "NotAbsoluteUrl", format!("{raw:?} is not a valid absolute url: {e}"))],
    }
}

/// All upstream weights are set, or none are.
pub fn validate_route_weights(spec: &RouteSpec) -> Vec<FieldError> {
    let weighted = spec.upstreams.iter().filter(|u| u.weight.is_some()).count();
    if weighted != 0 && weighted != spec.upstreams.len() {
        vec![FieldError::new(
            "spec.upstreams[].weight",
            "PartialWeights",
            "all upstream weights must be set, or none",
        )]
    } else {
        vec![]
    }
}

/// Duplicate `apiBasePath` is forbidden within a Rover's own subscriptions,
/// and separately within its own exposures.
pub fn validate_rover_duplicates(spec: &RoverSpec) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (i, s) in spec.subscriptions.iter().enumerate() {
        let key = normalize_base_path(&s.api_base_path);
        if !seen.insert(key.clone()) {
            errors.push(FieldError::new(
                format!("spec.subscriptions[{i}].apiBasePath"),
                "Duplicate",
                format!("duplicate subscription for basePath {key:?}"),
            ));
        }
    }
    let mut seen = HashSet::new();
    for (i, e) in spec.exposures.iter().enumerate() {
        let key = normalize_base_path(&e.api_base_path);
        if !seen.insert(key.clone()) {
            errors.push(FieldError::new(
                format!("spec.exposures[{i}].apiBasePath"),
                "Duplicate",
                format!("duplicate exposure for basePath {key:?}"),
            ));
        }
    }
    errors
}

/// Authorization-header removal (`disable_access_control`) is only allowed
/// on zones with visibility `World`. Needs a store lookup, unlike the other
/// rules here, since it is cross-resource.
pub async fn validate_world_only_auth_removal(
    zones: &dyn ObjectStore<Zone>,
    zone_namespace: &str,
    zone_name: &str,
    disable_access_control: bool,
) -> Vec<FieldError> {
    if !disable_access_control {
        return vec![];
    }
    match zones.get(zone_namespace, zone_name).await {
        Some(zone) if zone.spec.visibility == Visibility::World => vec![],
        Some(_) => vec![FieldError::new(
            "spec.security.disableAccessControl",
            "WorldOnly",
            "Authorization header removal is only allowed on zones with visibility World",
        )],
        None => vec![FieldError::new("spec.zone", "ZoneNotFound", format!("zone {zone_name:?} not found"))],
    }
}

/// Team secret defaulting (§4.10): the literal `rotate` sentinel mints a
/// fresh reference, a plain value is stored and replaced by its reference,
/// and an existing reference is left untouched.
pub async fn default_team_secret(secrets: &dyn SecretStore, environment: &str, spec: &mut TeamSpec) -> Result<()> {
    if spec.secret == ROTATE_SENTINEL {
        let reference = SecretRef::new(environment, &spec.name, "", WELL_KNOWN_KEY_CLIENT_SECRET, 0);
        let rotated = secrets.rotate(&reference).await?;
        spec.secret = rotated.to_string();
    } else if !spec.secret.is_empty() && !SecretRef::is_reference(&spec.secret) {
        let reference = SecretRef::new(environment, &spec.name, "", WELL_KNOWN_KEY_CLIENT_SECRET, 1);
        let stored = secrets.set(&reference, &spec.secret).await?;
        spec.secret = stored.to_string();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::kinds::rover::{RoverExposureEntry, RoverSpec, RoverSubscriptionEntry};

    #[test]
    fn team_name_must_match_convention() {
        let spec = TeamSpec { group: "eni".into(), name: "checkout".into(), secret: String::new() };
        assert!(validate_team_name("eni--checkout", &spec).is_empty());
        assert_eq!(validate_team_name("wrong", &spec).len(), 1);
    }

    #[test]
    fn upstream_url_rejects_localhost_and_bad_scheme() {
        assert!(validate_upstream_url("f", "https://example.com/api").is_empty());
        assert_eq!(validate_upstream_url("f", "https://localhost/api").len(), 1);
        assert_eq!(validate_upstream_url("f", "https://127.0.0.1/api").len(), 1);
        assert_eq!(validate_upstream_url("f", "ftp://example.com").len(), 1);
        assert_eq!(validate_upstream_url("f", "not a url").len(), 1);
    }

    #[test]
    fn rover_duplicate_base_paths_are_rejected() {
        let spec = RoverSpec {
            team: "t".into(),
            group: "g".into(),
            zone: "z".into(),
            client_secret: String::new(),
            subscriptions: vec![
                RoverSubscriptionEntry {
                    api_base_path: "/Eni/X/v1".into(),
                    approval_strategy: crate::approval_fsm::Strategy::Simple,
                    trusted_teams: vec![],
                },
                RoverSubscriptionEntry {
                    api_base_path: "/eni/x/v1".into(),
                    approval_strategy: crate::approval_fsm::Strategy::Simple,
                    trusted_teams: vec![],
                },
            ],
            exposures: vec![],
            remote_organization: None,
        };
        assert_eq!(validate_rover_duplicates(&spec).len(), 1);
    }

    #[test]
    fn rover_without_duplicates_is_valid() {
        let spec = RoverSpec {
            team: "t".into(),
            group: "g".into(),
            zone: "z".into(),
            client_secret: String::new(),
            subscriptions: vec![],
            exposures: vec![RoverExposureEntry {
                api_base_path: "/eni/x/v1".into(),
                upstream_url: "https://upstream.example.com".into(),
                failover_zones: vec![],
            }],
            remote_organization: None,
        };
        assert!(validate_rover_duplicates(&spec).is_empty());
    }
}
