//! `ApiExposure` handler: the basePath contention point (§4.6).

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::ScopedClient;
use crate::errors::{Error, Result};
use crate::model::kinds::api::Api;
use crate::model::kinds::api_exposure::ApiExposure;
use crate::model::kinds::gateway::{Downstream, RouteSecurity, RouteSpec, RouteType};
use crate::model::meta::{labels as label_keys, Condition, ConditionStatus, ObjectMeta, ObjectRef, OwnerReference, COND_BLOCKED, COND_PROCESSING, COND_READY};
use crate::model::resource::{Kind, Resource};
use crate::naming::{exposure_route_name, normalize_base_path};
use crate::routing::parse_upstream_url;
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct ApiExposureHandler;

fn blocked(obj: &mut ApiExposure, reason: &str, message: impl Into<String>, generation: i64) {
    obj.status.active = false;
    obj.conditions_mut().upsert(Condition::new(COND_BLOCKED, ConditionStatus::True, reason, message, generation, now()));
    obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, reason, "", generation, now()));
    obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Blocked", "", generation, now()));
}

#[async_trait]
impl Handler<ApiExposure, EngineContext> for ApiExposureHandler {
    async fn reconcile(&self, mut obj: ApiExposure, ctx: Arc<EngineContext>) -> Result<Action> {
        let gen = obj.metadata.generation;
        let owner = OwnerReference::controller("ApiExposure", &obj.metadata.namespace, &obj.metadata.name, obj.metadata.uid);
        let normalized_bp = normalize_base_path(&obj.spec.api_base_path);
        let route_client = ScopedClient::new(&ctx.routes, ctx.environment.clone());

        // 1. look up the active Api by basepath label.
        let api: Option<Api> = ctx
            .apis
            .list(Some(&ctx.environment))
            .await
            .into_iter()
            .find(|a| a.metadata.labels.get(label_keys::BASEPATH).map(String::as_str) == Some(normalized_bp.as_str()));
        let api = match api {
            Some(a) => a,
            None => {
                route_client.cleanup_all(&owner).await?;
                obj.status.route = None;
                obj.status.failover_route = None;
                blocked(&mut obj, "NoApi", "no Api is published for this basePath", gen);
                ctx.api_exposures.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
                return Ok(Action::AwaitChange);
            }
        };

        // 2. basePath case must match exactly.
        if api.spec.base_path != obj.spec.api_base_path {
            blocked(&mut obj, "ApiCaseConflict", format!("Api is published as {:?}", api.spec.base_path), gen);
            ctx.api_exposures.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
            return Ok(Action::AwaitChange);
        }

        // 3. exposure uniqueness: oldest by creation timestamp (namespace+name tiebreak) wins.
        let mut siblings: Vec<ApiExposure> =
            ctx.api_exposures.list(None).await.into_iter().filter(|e| normalize_base_path(&e.spec.api_base_path) == normalized_bp).collect();
        siblings.sort_by(|a, b| {
            a.metadata
                .creation_timestamp
                .cmp(&b.metadata.creation_timestamp)
                .then_with(|| (&a.metadata.namespace, &a.metadata.name).cmp(&(&b.metadata.namespace, &b.metadata.name)))
        });
        if let Some(winner) = siblings.first() {
            if winner.metadata.key() != obj.metadata.key() {
                let message = if winner.metadata.namespace == obj.metadata.namespace {
                    format!("basePath already exposed by application {:?} in this namespace", winner.spec.application)
                } else {
                    format!("basePath already exposed by team namespace {:?}", winner.metadata.namespace)
                };
                blocked(&mut obj, "ApiExposureNotActive", message, gen);
                ctx.api_exposures.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
                return Ok(Action::AwaitChange);
            }
        }

        // 4. M2M scope validation.
        if let Some(m2m) = &obj.spec.security.m2m {
            if m2m.external_idp.is_none() && !m2m.scopes.is_empty() {
                if api.spec.oauth2_scopes.is_empty() {
                    blocked(&mut obj, "ScopesNotDefined", "Api declares no oauth2 scopes", gen);
                    ctx.api_exposures.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
                    return Ok(Action::AwaitChange);
                }
                let invalid: Vec<&String> = m2m.scopes.iter().filter(|s| !api.spec.oauth2_scopes.contains(s)).collect();
                if !invalid.is_empty() {
                    blocked(&mut obj, "InvalidScopes", format!("scopes not declared by Api: {invalid:?}"), gen);
                    ctx.api_exposures.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
                    return Ok(Action::AwaitChange);
                }
            }
        }

        // 5. create/update the real Route in the target zone.
        let zone = match ctx.zones.get(&ctx.environment, &obj.spec.zone).await {
            Some(z) => z,
            None => {
                blocked(&mut obj, "NoZone", format!("zone {:?} does not exist", obj.spec.zone), gen);
                ctx.api_exposures.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
                return Ok(Action::AwaitChange);
            }
        };
        let issuer = zone.status.links.gateway_issuer.clone();
        let gateway_host = zone.status.links.gateway_host.clone();
        let upstream = parse_upstream_url(&obj.spec.upstream_url)?;

        let route_ns = crate::naming::zone_namespace(&ctx.environment, &obj.spec.zone);
        let route_name = exposure_route_name(&obj.spec.application, &obj.spec.api_base_path);
        let real_spec = RouteSpec {
            zone: obj.spec.zone.clone(),
            realm: ctx.environment.clone(),
            route_type: RouteType::Real,
            upstreams: vec![upstream],
            downstream: Downstream { host: gateway_host.clone(), port: 0, path: obj.spec.api_base_path.clone(), issuer_url: issuer.clone() },
            security: RouteSecurity { disable_access_control: obj.spec.security.disable_access_control },
        };
        let (route, _) = route_client
            .create_or_update(&route_ns, &route_name, &owner, now(), |existing| {
                let mut o = existing.unwrap_or_else(|| Resource::new(Kind::Route, ObjectMeta::new(&route_ns, &route_name, now()), real_spec.clone()));
                o.spec = real_spec.clone();
                o.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", gen, now()));
                o
            })
            .await?;
        ctx.gateway_admin.apply_route(&route).await?;
        obj.status.route = Some(ObjectRef::new("Route", &route_ns, &route_name));

        // failover: one proxy route per failover zone, upstreams borrowed from the active peer exposure there.
        obj.status.failover_route = None;
        if let Some(failover_zone_name) = obj.spec.traffic.failover.zones.first() {
            let peer = ctx
                .api_exposures
                .list(None)
                .await
                .into_iter()
                .find(|e| normalize_base_path(&e.spec.api_base_path) == normalized_bp && &e.spec.zone == failover_zone_name && e.status.active);
            if let (Some(peer), Some(failover_zone)) = (peer, ctx.zones.get(&ctx.environment, failover_zone_name).await) {
                let peer_upstream = parse_upstream_url(&peer.spec.upstream_url)?;
                let failover_ns = crate::naming::zone_namespace(&ctx.environment, failover_zone_name);
                let failover_name = format!("{route_name}--failover");
                let failover_spec = RouteSpec {
                    zone: failover_zone_name.clone(),
                    realm: ctx.environment.clone(),
                    route_type: RouteType::Failover,
                    upstreams: vec![peer_upstream],
                    downstream: Downstream {
                        host: failover_zone.status.links.gateway_host.clone(),
                        port: 0,
                        path: obj.spec.api_base_path.clone(),
                        issuer_url: failover_zone.status.links.gateway_issuer.clone(),
                    },
                    security: RouteSecurity { disable_access_control: obj.spec.security.disable_access_control },
                };
                let (failover_route, _) = route_client
                    .create_or_update(&failover_ns, &failover_name, &owner, now(), |existing| {
                        let mut o = existing
                            .unwrap_or_else(|| Resource::new(Kind::Route, ObjectMeta::new(&failover_ns, &failover_name, now()), failover_spec.clone()));
                        o.spec = failover_spec.clone();
                        o.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", gen, now()));
                        o
                    })
                    .await?;
                ctx.gateway_admin.apply_route(&failover_route).await?;
                obj.status.failover_route = Some(ObjectRef::new("Route", &failover_ns, &failover_name));
            }
        }

        obj.status.active = true;
        obj.conditions_mut().remove(COND_BLOCKED);
        obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "exposure is active", gen, now()));
        obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));

        ctx.api_exposures.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        Ok(Action::requeue_after_secs(300))
    }
}
