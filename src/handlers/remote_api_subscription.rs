//! `RemoteApiSubscription` handler: bridges two control planes (§4.9). Which
//! scenario applies is decided purely by whether a `RemoteOrganization`
//! named `spec.target_organization` exists locally: if it does, this object
//! is the consumer's outbound request; if not, it is the provider-side
//! materialization shipped in from a remote consumer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::client::ScopedClient;
use crate::errors::{Error, Result};
use crate::model::kinds::api_subscription::ApiSubscriptionSpec;
use crate::model::kinds::application::ApplicationSpec;
use crate::model::kinds::gateway::{Downstream, RouteSecurity, RouteSpec, RouteType, Upstream};
use crate::model::kinds::remote_api_subscription::RemoteApiSubscription;
use crate::model::meta::{labels as label_keys, Condition, ConditionStatus, ObjectMeta, ObjectRef, OwnerReference, COND_BLOCKED, COND_PROCESSING, COND_READY};
use crate::model::resource::{Kind, Resource};
use crate::naming::remote_route_name;
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct RemoteApiSubscriptionHandler;

#[async_trait]
impl Handler<RemoteApiSubscription, EngineContext> for RemoteApiSubscriptionHandler {
    async fn reconcile(&self, mut obj: RemoteApiSubscription, ctx: Arc<EngineContext>) -> Result<Action> {
        match ctx.remote_organizations.get(&ctx.environment, &obj.spec.target_organization).await {
            Some(org) => consumer_scenario(&mut obj, &ctx, &org.spec).await,
            None => provider_scenario(&mut obj, &ctx).await,
        }
    }
}

async fn consumer_scenario(
    obj: &mut RemoteApiSubscription,
    ctx: &Arc<EngineContext>,
    org: &crate::model::kinds::remote_organization::RemoteOrganizationSpec,
) -> Result<Action> {
    let gen = obj.metadata.generation;
    let owner = OwnerReference::controller("RemoteApiSubscription", &obj.metadata.namespace, &obj.metadata.name, obj.metadata.uid);

    let payload = json!({
        "apiBasePath": obj.spec.api_base_path,
        "requester": {"application": obj.spec.requester.application, "team": obj.spec.requester.team},
        "sourceOrganization": ctx.environment,
    });
    let result = ctx.syncer.send(&obj.spec.target_organization, &payload).await?;

    if result.updated {
        // first time this exact content has been shipped; give the remote a
        // round trip to settle before trusting it.
        obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::True, "Syncing", "waiting for the remote control plane to settle", gen, now()));
        obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "Syncing", "", gen, now()));
        ctx.remote_api_subscriptions.update(obj.clone()).await.map_err(|e| Error::Transient(e.to_string()))?;
        return Ok(Action::requeue_after_secs(10));
    }

    let host = url::Url::parse(&org.issuer_url).ok().and_then(|u| u.host_str().map(str::to_string)).unwrap_or_else(|| org.organization_name.clone());
    let route_ns = crate::naming::zone_namespace(&ctx.environment, &org.gateway_zone);
    let route_name = remote_route_name(&org.id, &obj.spec.api_base_path);

    let gateway_host = match ctx.zones.get(&ctx.environment, &org.gateway_zone).await {
        Some(z) => z.status.links.gateway_host.clone(),
        None => {
            obj.conditions_mut().upsert(Condition::new(COND_BLOCKED, ConditionStatus::True, "NoZone", format!("zone {:?} does not exist", org.gateway_zone), gen, now()));
            obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "NoZone", "", gen, now()));
            ctx.remote_api_subscriptions.update(obj.clone()).await.map_err(|e| Error::Transient(e.to_string()))?;
            return Ok(Action::AwaitChange);
        }
    };
    let route_spec = RouteSpec {
        zone: org.gateway_zone.clone(),
        realm: ctx.environment.clone(),
        route_type: RouteType::Proxy,
        upstreams: vec![Upstream { scheme: "https".to_string(), host, port: 443, path: obj.spec.api_base_path.clone(), weight: None }],
        downstream: Downstream { host: gateway_host, port: 0, path: obj.spec.api_base_path.clone(), issuer_url: org.issuer_url.clone() },
        security: RouteSecurity::default(),
    };
    let route_client = ScopedClient::new(&ctx.routes, ctx.environment.clone());
    let (route, _) = route_client
        .create_or_update(&route_ns, &route_name, &owner, now(), |existing| {
            let mut o = existing.unwrap_or_else(|| Resource::new(Kind::Route, ObjectMeta::new(&route_ns, &route_name, now()), route_spec.clone()));
            o.spec = route_spec.clone();
            o.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", gen, now()));
            o
        })
        .await?;
    ctx.gateway_admin.apply_route(&route).await?;
    obj.status.route = Some(ObjectRef::new("Route", &route_ns, &route_name));

    obj.conditions_mut().remove(COND_BLOCKED);
    obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", gen, now()));
    obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));
    ctx.remote_api_subscriptions.update(obj.clone()).await.map_err(|e| Error::Transient(e.to_string()))?;
    Ok(Action::requeue_after_secs(300))
}

async fn provider_scenario(obj: &mut RemoteApiSubscription, ctx: &Arc<EngineContext>) -> Result<Action> {
    let gen = obj.metadata.generation;
    let ns = obj.metadata.namespace.clone();
    let owner = OwnerReference::controller("RemoteApiSubscription", &ns, &obj.metadata.name, obj.metadata.uid);

    let source_org = match &obj.spec.source_organization {
        Some(id) => id.clone(),
        None => {
            obj.conditions_mut().upsert(Condition::new(COND_BLOCKED, ConditionStatus::True, "NoSourceOrganization", "provider-side object is missing sourceOrganization", gen, now()));
            obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "NoSourceOrganization", "", gen, now()));
            ctx.remote_api_subscriptions.update(obj.clone()).await.map_err(|e| Error::Transient(e.to_string()))?;
            return Ok(Action::AwaitChange);
        }
    };
    let origin = ctx.remote_organizations.list(Some(&ctx.environment)).await.into_iter().find(|o| o.spec.id == source_org);
    let gateway_zone = match &origin {
        Some(o) => o.spec.gateway_zone.clone(),
        None => {
            obj.conditions_mut().upsert(Condition::new(COND_BLOCKED, ConditionStatus::True, "UnknownOrigin", format!("no RemoteOrganization known for {source_org:?}"), gen, now()));
            obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "UnknownOrigin", "", gen, now()));
            ctx.remote_api_subscriptions.update(obj.clone()).await.map_err(|e| Error::Transient(e.to_string()))?;
            return Ok(Action::AwaitChange);
        }
    };

    let app_name = format!("{source_org}--{}", obj.spec.requester.application);
    let app_spec = ApplicationSpec {
        team: obj.spec.requester.team.clone(),
        zone: gateway_zone.clone(),
        failover_zones: vec![],
        needs_client: false,
        needs_consumer: true,
        org_id: Some(source_org.clone()),
    };
    let app_client = ScopedClient::new(&ctx.applications, ctx.environment.clone());
    let (application, _) = app_client
        .create_or_update(&ns, &app_name, &owner, now(), |existing| {
            let mut o = existing.unwrap_or_else(|| Resource::new(Kind::Application, ObjectMeta::new(&ns, &app_name, now()), app_spec.clone()));
            o.spec = app_spec.clone();
            o.metadata.labels.insert(label_keys::ORG_ID.to_string(), source_org.clone());
            o
        })
        .await?;
    obj.status.application = Some(ObjectRef::new("Application", &ns, &app_name));

    let sub_spec = ApiSubscriptionSpec {
        application: app_name.clone(),
        api_base_path: obj.spec.api_base_path.clone(),
        zone: gateway_zone,
        approval_strategy: crate::approval_fsm::Strategy::Simple,
        trusted_teams: vec![],
    };
    let sub_client = ScopedClient::new(&ctx.api_subscriptions, ctx.environment.clone());
    let (subscription, _) = sub_client
        .create_or_update(&ns, &app_name, &owner, now(), |existing| {
            let mut o = existing.unwrap_or_else(|| Resource::new(Kind::ApiSubscription, ObjectMeta::new(&ns, &app_name, now()), sub_spec.clone()));
            o.spec = sub_spec.clone();
            o
        })
        .await?;
    obj.status.api_subscription = Some(ObjectRef::new("ApiSubscription", &ns, &app_name));
    obj.status.approval_request = subscription.status.approval_request.clone();
    obj.status.route = subscription.status.route.clone();

    let ready = application.conditions().is_true(COND_READY) && subscription.conditions().is_true(COND_READY);
    if ready {
        obj.conditions_mut().remove(COND_BLOCKED);
        obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", gen, now()));
        obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));
    } else {
        obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "Waiting", "", gen, now()));
        obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::True, "Waiting", "", gen, now()));
    }

    let status_payload = json!({
        "ready": ready,
        "route": obj.status.route.as_ref().map(|r| r.to_string()),
    });
    ctx.syncer.send_status(&source_org, &status_payload).await?;

    ctx.remote_api_subscriptions.update(obj.clone()).await.map_err(|e| Error::Transient(e.to_string()))?;
    Ok(Action::requeue_after_secs(60))
}
