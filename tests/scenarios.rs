//! End-to-end reconciliation scenarios driving handlers directly against an
//! `EngineContext` backed by the in-memory reference stores/clients, the way
//! the engine's own unit tests drive a single handler but spanning the
//! handful of kinds each scenario actually touches.

use std::sync::Arc;

use serde_json::json;

use rover_engine::admission::rules::default_team_secret;
use rover_engine::approval_fsm::{State, Strategy, TransitionAction};
use rover_engine::gateway_admin::MemoryGatewayAdminClient;
use rover_engine::handlers::api_exposure::ApiExposureHandler;
use rover_engine::handlers::api_specification::ApiSpecificationHandler;
use rover_engine::handlers::approval_request::ApprovalRequestHandler;
use rover_engine::handlers::remote_api_subscription::RemoteApiSubscriptionHandler;
use rover_engine::handlers::zone::ZoneHandler;
use rover_engine::identity_admin::MemoryIdentityAdminClient;
use rover_engine::model::kinds::api_exposure::{ApiExposureSpec, ExposureSecurity, TrafficConfig};
use rover_engine::model::kinds::api_specification::ApiSpecificationSpec;
use rover_engine::model::kinds::api_subscription::ApiSubscriptionSpec;
use rover_engine::model::kinds::approval::ApprovalRequestSpec;
use rover_engine::model::kinds::remote_api_subscription::{RemoteApiSubscriptionSpec, Requester};
use rover_engine::model::kinds::remote_organization::RemoteOrganizationSpec;
use rover_engine::model::kinds::team::TeamSpec;
use rover_engine::model::kinds::zone::{GatewayConfig, IdpConfig, RedisConfig, TeamApi, Visibility, ZoneSpec};
use rover_engine::model::meta::{ObjectMeta, COND_BLOCKED, COND_READY};
use rover_engine::model::resource::{Kind, Resource};
use rover_engine::naming::approval_name;
use rover_engine::notifications::LoggingChannelDelivery;
use rover_engine::runtime::context::EngineContext;
use rover_engine::runtime::{now, Handler};
use rover_engine::secrets::{MemorySecretStore, SecretStore, ROTATE_SENTINEL};
use rover_engine::store::ObjectStore;
use rover_engine::sync::{MemorySyncerClient, SyncerClient};

fn test_ctx(environment: &str) -> Arc<EngineContext> {
    Arc::new(EngineContext::new(
        environment.to_string(),
        Arc::new(MemorySecretStore::new()),
        Arc::new(MemoryGatewayAdminClient::default()),
        Arc::new(MemoryIdentityAdminClient::default()),
        Arc::new(MemorySyncerClient::default()),
        Arc::new(LoggingChannelDelivery),
    ))
}

#[tokio::test]
async fn zone_materializes_children_and_becomes_ready() {
    let ctx = test_ctx("test-env");
    let spec = ZoneSpec {
        visibility: Visibility::World,
        idp: IdpConfig { url: "https://idp.example.com".to_string() },
        gateway: GatewayConfig { url: "https://gateway.example.com".to_string() },
        redis: RedisConfig { host: "redis".to_string(), port: 6379, password: String::new() },
        team_apis: vec![TeamApi { name: "lms".to_string(), path: "/test/team/api/v1".to_string(), url: "https://lms.example.com".to_string() }],
    };
    let zone = Resource::new(Kind::Zone, ObjectMeta::new("test-env", "eu-zone", now()), spec);
    let zone = ctx.zones.create(zone).await.unwrap();

    ZoneHandler.reconcile(zone, ctx.clone()).await.unwrap();

    let updated = ctx.zones.get("test-env", "eu-zone").await.unwrap();
    assert!(updated.conditions().is_true(COND_READY));
    // 6 always-present children + the team-api realm + one team-api route.
    assert_eq!(updated.status.children.len(), 8);
    assert!(!updated.status.links.gateway_issuer.is_empty());
    assert!(!updated.status.links.stargate_lms_issuer.is_empty());
    assert_ne!(updated.status.links.gateway_issuer, updated.status.links.stargate_lms_issuer);
}

#[tokio::test]
async fn zone_without_team_apis_skips_the_team_realm_and_routes() {
    let ctx = test_ctx("test-env");
    let spec = ZoneSpec {
        visibility: Visibility::Enterprise,
        idp: IdpConfig { url: "https://idp.example.com".to_string() },
        gateway: GatewayConfig { url: "https://gateway.example.com".to_string() },
        redis: RedisConfig { host: "redis".to_string(), port: 6379, password: String::new() },
        team_apis: vec![],
    };
    let zone = Resource::new(Kind::Zone, ObjectMeta::new("test-env", "plain-zone", now()), spec);
    let zone = ctx.zones.create(zone).await.unwrap();

    ZoneHandler.reconcile(zone, ctx.clone()).await.unwrap();

    let updated = ctx.zones.get("test-env", "plain-zone").await.unwrap();
    assert!(updated.conditions().is_true(COND_READY));
    assert_eq!(updated.status.children.len(), 6);
}

fn bare_zone(ctx: &EngineContext, name: &str) -> rover_engine::model::kinds::zone::Zone {
    let spec = ZoneSpec {
        visibility: Visibility::World,
        idp: IdpConfig { url: "https://idp.example.com".to_string() },
        gateway: GatewayConfig { url: "https://gateway.example.com".to_string() },
        redis: RedisConfig { host: "redis".to_string(), port: 6379, password: String::new() },
        team_apis: vec![],
    };
    Resource::new(Kind::Zone, ObjectMeta::new(ctx.environment.clone(), name, now()), spec)
}

#[tokio::test]
async fn second_exposure_of_the_same_base_path_is_blocked_until_the_first_is_gone() {
    let ctx = test_ctx("test-env");
    ctx.zones.create(bare_zone(&ctx, "eu-zone")).await.unwrap();

    let spec = ApiSpecificationSpec {
        team: "eni--checkout".to_string(),
        open_api_document: r#"{"basePath": "/eni/checkout/v1", "info": {"version": "1.0.0"}}"#.to_string(),
        category: "eni".to_string(),
    };
    let api_spec = Resource::new(Kind::ApiSpecification, ObjectMeta::new("test-env--eni--checkout", "checkout-spec", now()), spec);
    let api_spec = ctx.api_specifications.create(api_spec).await.unwrap();
    ApiSpecificationHandler.reconcile(api_spec, ctx.clone()).await.unwrap();

    let first_meta = ObjectMeta::new("test-env--eni--checkout", "exp1", now());
    let mut second_meta = ObjectMeta::new("test-env--eni--other", "exp2", now());
    second_meta.creation_timestamp = first_meta.creation_timestamp + chrono::Duration::seconds(1);

    let exposure_spec = |application: &str| ApiExposureSpec {
        application: application.to_string(),
        api_base_path: "/eni/checkout/v1".to_string(),
        zone: "eu-zone".to_string(),
        upstream_url: "https://upstream.example.com".to_string(),
        traffic: TrafficConfig::default(),
        security: ExposureSecurity::default(),
    };

    let first = Resource::new(Kind::ApiExposure, first_meta, exposure_spec("checkout-app"));
    let first = ctx.api_exposures.create(first).await.unwrap();
    let second = Resource::new(Kind::ApiExposure, second_meta, exposure_spec("other-app"));
    let second = ctx.api_exposures.create(second).await.unwrap();

    ApiExposureHandler.reconcile(first, ctx.clone()).await.unwrap();
    let first_after = ctx.api_exposures.get("test-env--eni--checkout", "exp1").await.unwrap();
    assert!(first_after.status.active);
    assert!(first_after.conditions().is_true(COND_READY));
    assert!(ctx.routes.list(None).await.iter().any(|r| r.metadata.name == "checkout-app--eni-checkout-v1"));

    ApiExposureHandler.reconcile(second, ctx.clone()).await.unwrap();
    let second_after = ctx.api_exposures.get("test-env--eni--other", "exp2").await.unwrap();
    assert!(!second_after.status.active);
    assert!(second_after.conditions().is_true(COND_BLOCKED));
    assert_eq!(second_after.conditions().get(COND_BLOCKED).unwrap().reason, "ApiExposureNotActive");
}

#[tokio::test]
async fn four_eyes_subscription_needs_two_allows_before_the_sibling_approval_appears() {
    let ctx = test_ctx("test-env");
    let sub_ns = "test-env--eni--checkout";

    let subscription = Resource::new(
        Kind::ApiSubscription,
        ObjectMeta::new(sub_ns, "sub1", now()),
        ApiSubscriptionSpec {
            application: "checkout-app".to_string(),
            api_base_path: "/eni/billing/v1".to_string(),
            zone: "eu-zone".to_string(),
            approval_strategy: Strategy::FourEyes,
            trusted_teams: vec![],
        },
    );
    ctx.api_subscriptions.create(subscription).await.unwrap();

    let target = rover_engine::model::meta::ObjectRef::new("ApiSubscription", sub_ns, "sub1");
    let request = Resource::new(
        Kind::ApprovalRequest,
        ObjectMeta::new(sub_ns, "req1", now()),
        ApprovalRequestSpec { strategy: Strategy::FourEyes, state: State::Pending, requester: "checkout-app".to_string(), decider: "billing-team".to_string(), target: target.clone(), action: "subscribe".to_string() },
    );
    let request = ctx.approval_requests.create(request).await.unwrap();

    ApprovalRequestHandler.reconcile(request, ctx.clone()).await.unwrap();
    let after_pending = ctx.approval_requests.get(sub_ns, "req1").await.unwrap();
    assert_eq!(after_pending.status.last_state, Some(State::Pending));
    assert_eq!(after_pending.status.available_transitions.len(), 2);
    assert!(ctx.approvals.get(sub_ns, &approval_name("ApiSubscription", "sub1")).await.is_none());

    let mut semigranted = after_pending;
    semigranted.spec.state = Strategy::FourEyes.apply(State::Pending, TransitionAction::Allow).unwrap();
    let semigranted = ctx.approval_requests.update(semigranted).await.unwrap();
    ApprovalRequestHandler.reconcile(semigranted, ctx.clone()).await.unwrap();
    let after_semigranted = ctx.approval_requests.get(sub_ns, "req1").await.unwrap();
    assert_eq!(after_semigranted.status.last_state, Some(State::Semigranted));
    assert!(ctx.approvals.get(sub_ns, &approval_name("ApiSubscription", "sub1")).await.is_none());

    let mut granted = after_semigranted;
    granted.spec.state = Strategy::FourEyes.apply(State::Semigranted, TransitionAction::Allow).unwrap();
    let granted = ctx.approval_requests.update(granted).await.unwrap();
    ApprovalRequestHandler.reconcile(granted, ctx.clone()).await.unwrap();
    let after_granted = ctx.approval_requests.get(sub_ns, "req1").await.unwrap();
    assert_eq!(after_granted.status.last_state, Some(State::Granted));
    let approval = ctx.approvals.get(sub_ns, &approval_name("ApiSubscription", "sub1")).await.unwrap();
    assert!(approval.conditions().is_true(COND_READY));
    assert_eq!(approval.spec.approved_request.name, "req1");
}

#[tokio::test]
async fn exposure_recovers_once_its_api_specification_is_published() {
    let ctx = test_ctx("test-env");
    ctx.zones.create(bare_zone(&ctx, "eu-zone")).await.unwrap();

    let exposure = Resource::new(
        Kind::ApiExposure,
        ObjectMeta::new("test-env--eni--checkout", "exp1", now()),
        ApiExposureSpec {
            application: "checkout-app".to_string(),
            api_base_path: "/eni/checkout/v1".to_string(),
            zone: "eu-zone".to_string(),
            upstream_url: "https://upstream.example.com".to_string(),
            traffic: TrafficConfig::default(),
            security: ExposureSecurity::default(),
        },
    );
    let exposure = ctx.api_exposures.create(exposure).await.unwrap();

    let blocked = ApiExposureHandler.reconcile(exposure, ctx.clone()).await;
    assert!(blocked.is_ok());
    let after_first = ctx.api_exposures.get("test-env--eni--checkout", "exp1").await.unwrap();
    assert!(!after_first.status.active);
    assert_eq!(after_first.conditions().get(COND_BLOCKED).unwrap().reason, "NoApi");

    let api_spec = Resource::new(
        Kind::ApiSpecification,
        ObjectMeta::new("test-env--eni--checkout", "checkout-spec", now()),
        ApiSpecificationSpec {
            team: "eni--checkout".to_string(),
            open_api_document: r#"{"basePath": "/eni/checkout/v1", "info": {"version": "1.0.0"}}"#.to_string(),
            category: "eni".to_string(),
        },
    );
    let api_spec = ctx.api_specifications.create(api_spec).await.unwrap();
    ApiSpecificationHandler.reconcile(api_spec, ctx.clone()).await.unwrap();

    ApiExposureHandler.reconcile(after_first, ctx.clone()).await.unwrap();
    let after_second = ctx.api_exposures.get("test-env--eni--checkout", "exp1").await.unwrap();
    assert!(after_second.status.active);
    assert!(after_second.conditions().is_true(COND_READY));
    assert!(after_second.status.route.is_some());
}

#[tokio::test]
async fn provider_scenario_materializes_application_and_replies_idempotently() {
    let ctx = test_ctx("test-env");
    let org = Resource::new(
        Kind::RemoteOrganization,
        ObjectMeta::new("test-env", "acme-peer", now()),
        RemoteOrganizationSpec { id: "acme-id".to_string(), organization_name: "Acme".to_string(), gateway_zone: "eu-zone".to_string(), issuer_url: "https://issuer.acme.example.com".to_string() },
    );
    ctx.remote_organizations.create(org).await.unwrap();

    let ns = "test-env--remote";
    let remote_sub = Resource::new(
        Kind::RemoteApiSubscription,
        ObjectMeta::new(ns, "remote-sub-1", now()),
        RemoteApiSubscriptionSpec {
            api_base_path: "/eni/x/v1".to_string(),
            target_organization: "unknown-locally".to_string(),
            source_organization: Some("acme-id".to_string()),
            requester: Requester { application: "consumer-app".to_string(), team: "consumer-team".to_string() },
        },
    );
    let remote_sub = ctx.remote_api_subscriptions.create(remote_sub).await.unwrap();

    RemoteApiSubscriptionHandler.reconcile(remote_sub, ctx.clone()).await.unwrap();

    let after = ctx.remote_api_subscriptions.get(ns, "remote-sub-1").await.unwrap();
    assert_eq!(after.status.application.as_ref().unwrap().name, "acme-id--consumer-app");
    assert_eq!(after.status.api_subscription.as_ref().unwrap().name, "acme-id--consumer-app");
    assert!(ctx.applications.get(ns, "acme-id--consumer-app").await.is_some());
    assert!(ctx.api_subscriptions.get(ns, "acme-id--consumer-app").await.is_some());

    // the handler already shipped this exact status; replaying it must not look like an update.
    let expected_payload = json!({"ready": false, "route": null});
    let replayed = ctx.syncer.send_status("acme-id", &expected_payload).await.unwrap();
    assert!(!replayed.updated);
}

#[tokio::test]
async fn rotate_sentinel_mints_a_versioned_reference_once_the_team_is_onboarded() {
    let ctx = test_ctx("test-env");
    let mut spec = TeamSpec { group: "eni".to_string(), name: "checkout".to_string(), secret: ROTATE_SENTINEL.to_string() };

    rover_engine::onboarding::onboard_environment(ctx.secrets.as_ref(), "test-env").await.unwrap();
    rover_engine::onboarding::onboard_team(ctx.secrets.as_ref(), "test-env", "checkout").await.unwrap();

    default_team_secret(ctx.secrets.as_ref(), "test-env", &mut spec).await.unwrap();

    let reference = rover_engine::secrets::SecretRef::parse(&spec.secret).expect("rotated secret is a reference");
    assert_eq!(reference.env_id, "test-env");
    assert_eq!(reference.team_id, "checkout");
    assert_eq!(reference.version, 1);
    assert!(ctx.secrets.get(&reference).await.is_ok());
}

#[tokio::test]
async fn rotate_sentinel_is_forbidden_before_the_team_is_onboarded() {
    let ctx = test_ctx("test-env");
    let mut spec = TeamSpec { group: "eni".to_string(), name: "unboarded".to_string(), secret: ROTATE_SENTINEL.to_string() };
    assert!(default_team_secret(ctx.secrets.as_ref(), "test-env", &mut spec).await.is_err());
}
