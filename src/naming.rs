//! Name/label conventions that must stay bit-exact across the platform.

/// Locale-independent lowercase, `/` -> `-`, strip leading/trailing `-`.
///
/// ```
/// use rover_engine::naming::normalize_base_path;
/// assert_eq!(normalize_base_path("/Eni/X/v1"), "eni-x-v1");
/// assert_eq!(normalize_base_path("/checkout/"), "checkout");
/// ```
pub fn normalize_base_path(base_path: &str) -> String {
    let lowered: String = base_path.chars().flat_map(|c| c.to_lowercase()).collect();
    let dashed: String = lowered.chars().map(|c| if c == '/' { '-' } else { c }).collect();
    dashed.trim_matches('-').to_string()
}

/// A generic slug used for resource names derived from free text (basePath,
/// kind names, ...). Distinct from `normalize_base_path` only in name; kept
/// as its own function because the spec treats "slug" as the general notion
/// and basePath normalization as a specific instance of it.
pub fn slug(input: &str) -> String {
    normalize_base_path(input)
}

/// Namespace housing a Zone's materialized children: `{env}--{zone}`.
pub fn zone_namespace(environment: &str, zone: &str) -> String {
    format!("{environment}--{zone}")
}

/// Namespace housing a Team's (and its Applications') resources:
/// `{env}--{group}--{team}`.
pub fn team_namespace(environment: &str, group: &str, team: &str) -> String {
    format!("{environment}--{group}--{team}")
}

/// Approval name for a target object: `slug(targetKind)--targetName`.
pub fn approval_name(target_kind: &str, target_name: &str) -> String {
    format!("{}--{}", slug(target_kind), target_name)
}

/// Name of the shared Route created by a consumer-side RemoteApiSubscription:
/// `{remoteOrgId}--slug(basePath)`.
pub fn remote_route_name(remote_org_id: &str, base_path: &str) -> String {
    format!("{remote_org_id}--{}", normalize_base_path(base_path))
}

/// Team-API realm name for a Zone: `team-{env}`.
pub fn team_api_realm_name(environment: &str) -> String {
    format!("team-{environment}")
}

/// Team-API route name for a Zone: `team-{env}--{apiName}`.
pub fn team_api_route_name(environment: &str, api_name: &str) -> String {
    format!("team-{environment}--{api_name}")
}

/// Route name for an ApiExposure's real route: `{application}--slug(basePath)`.
pub fn exposure_route_name(application: &str, base_path: &str) -> String {
    format!("{application}--{}", normalize_base_path(base_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_slashes_and_trims() {
        assert_eq!(normalize_base_path("/Eni/X/v1"), "eni-x-v1");
        assert_eq!(normalize_base_path("CHECKOUT"), "checkout");
        assert_eq!(normalize_base_path("/-weird-/"), "weird");
    }

    #[test]
    fn builds_conventional_names() {
        assert_eq!(zone_namespace("test", "test-zone"), "test--test-zone");
        assert_eq!(team_namespace("test", "eni", "checkout"), "test--eni--checkout");
        assert_eq!(approval_name("ApiSubscription", "my-sub"), "apisubscription--my-sub");
        assert_eq!(remote_route_name("org-42", "/Eni/X/v1"), "org-42--eni-x-v1");
        assert_eq!(team_api_realm_name("test"), "team-test");
        assert_eq!(team_api_route_name("test", "test-team-api1"), "team-test--test-team-api1");
        assert_eq!(exposure_route_name("checkout-app", "/Checkout/v1"), "checkout-app--checkout-v1");
    }
}
