//! `Zone` handler: materializes the per-environment gateway+IdP footprint
//! (§4.5).

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::ScopedClient;
use crate::errors::{Error, Result};
use crate::model::kinds::gateway::{ConsumerSpec, Downstream, GatewaySpec, RealmSpec, RouteSecurity, RouteSpec, RouteType};
use crate::model::kinds::identity::{issuer_url, IdentityClientSpec, IdentityProviderSpec, IdentityRealmSpec};
use crate::model::kinds::zone::{Zone, ZoneLinks};
use crate::model::meta::{Condition, ConditionStatus, ObjectMeta, ObjectRef, OwnerReference, COND_PROCESSING, COND_READY};
use crate::model::resource::{HasConditions, Kind, Resource};
use crate::naming::{team_api_realm_name, team_api_route_name, zone_namespace};
use crate::routing::parse_upstream_url;
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct ZoneHandler;

fn mark_ready<Spec, Status: HasConditions>(o: &mut Resource<Spec, Status>, generation: i64) {
    o.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", generation, now()));
    o.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", generation, now()));
}

#[async_trait]
impl Handler<Zone, EngineContext> for ZoneHandler {
    async fn reconcile(&self, mut obj: Zone, ctx: Arc<EngineContext>) -> Result<Action> {
        let zone_name = obj.metadata.name.clone();
        let ns = zone_namespace(&ctx.environment, &zone_name);
        let owner = OwnerReference::controller("Zone", &obj.metadata.namespace, &zone_name, obj.metadata.uid);
        let gen = obj.metadata.generation;
        let issuer = issuer_url(&obj.spec.idp.url, &ctx.environment);
        let gateway_host = parse_upstream_url(&obj.spec.gateway.url)?.host;
        let team_api_realm_name_value = team_api_realm_name(&ctx.environment);
        let team_issuer = issuer_url(&obj.spec.idp.url, &team_api_realm_name_value);

        let idp_client = ScopedClient::new(&ctx.identity_providers, ctx.environment.clone());
        let (idp, _) = idp_client
            .create_or_update(&ns, &zone_name, &owner, now(), |existing| {
                let mut o = existing.unwrap_or_else(|| {
                    Resource::new(Kind::IdentityProvider, ObjectMeta::new(&ns, &zone_name, now()), IdentityProviderSpec { url: obj.spec.idp.url.clone() })
                });
                o.spec.url = obj.spec.idp.url.clone();
                mark_ready(&mut o, gen);
                o
            })
            .await?;
        ctx.identity_admin.apply_provider(&idp).await?;

        let realm_client = ScopedClient::new(&ctx.identity_realms, ctx.environment.clone());
        let (idr, _) = realm_client
            .create_or_update(&ns, &ctx.environment, &owner, now(), |existing| {
                let mut o = existing.unwrap_or_else(|| {
                    Resource::new(
                        Kind::IdentityRealm,
                        ObjectMeta::new(&ns, &ctx.environment, now()),
                        IdentityRealmSpec { identity_provider: zone_name.clone() },
                    )
                });
                o.spec.identity_provider = zone_name.clone();
                o.status.issuer_url = Some(issuer.clone());
                mark_ready(&mut o, gen);
                o
            })
            .await?;
        ctx.identity_admin.apply_realm(&idr).await?;

        let client_client = ScopedClient::new(&ctx.identity_clients, ctx.environment.clone());
        let (idc, _) = client_client
            .create_or_update(&ns, "gateway", &owner, now(), |existing| {
                let mut o = existing.unwrap_or_else(|| {
                    Resource::new(Kind::IdentityClient, ObjectMeta::new(&ns, "gateway", now()), IdentityClientSpec { realm: ctx.environment.clone() })
                });
                o.spec.realm = ctx.environment.clone();
                mark_ready(&mut o, gen);
                o
            })
            .await?;
        ctx.identity_admin.apply_client(&idc).await?;

        let gateway_spec = GatewaySpec {
            identity_provider: zone_name.clone(),
            identity_realm: ctx.environment.clone(),
            redis_host: obj.spec.redis.host.clone(),
            redis_port: obj.spec.redis.port,
            redis_password: obj.spec.redis.password.clone(),
            admin_url: obj.spec.gateway.url.clone(),
        };
        let gw_client = ScopedClient::new(&ctx.gateways, ctx.environment.clone());
        gw_client
            .create_or_update(&ns, &zone_name, &owner, now(), |existing| {
                let mut o = existing.unwrap_or_else(|| Resource::new(Kind::Gateway, ObjectMeta::new(&ns, &zone_name, now()), gateway_spec.clone()));
                o.spec = gateway_spec.clone();
                mark_ready(&mut o, gen);
                o
            })
            .await?;

        let gateway_realm_spec = RealmSpec { gateway: zone_name.clone(), default_consumers: vec!["gateway".to_string()], issuer_url: issuer.clone() };
        let gw_realm_client = ScopedClient::new(&ctx.realms, ctx.environment.clone());
        let (gw_realm, _) = gw_realm_client
            .create_or_update(&ns, &ctx.environment, &owner, now(), |existing| {
                let mut o = existing
                    .unwrap_or_else(|| Resource::new(Kind::Realm, ObjectMeta::new(&ns, &ctx.environment, now()), gateway_realm_spec.clone()));
                o.spec = gateway_realm_spec.clone();
                mark_ready(&mut o, gen);
                o
            })
            .await?;
        ctx.gateway_admin.apply_realm(&gw_realm).await?;

        let consumer_client = ScopedClient::new(&ctx.consumers, ctx.environment.clone());
        let (gw_consumer, _) = consumer_client
            .create_or_update(&ns, "gateway", &owner, now(), |existing| {
                let mut o = existing
                    .unwrap_or_else(|| Resource::new(Kind::Consumer, ObjectMeta::new(&ns, "gateway", now()), ConsumerSpec { realm: ctx.environment.clone() }));
                o.spec.realm = ctx.environment.clone();
                mark_ready(&mut o, gen);
                o
            })
            .await?;
        ctx.gateway_admin.apply_consumer(&gw_consumer).await?;

        let mut children = vec![
            ObjectRef::new("IdentityProvider", &ns, &zone_name),
            ObjectRef::new("IdentityRealm", &ns, &ctx.environment),
            ObjectRef::new("IdentityClient", &ns, "gateway"),
            ObjectRef::new("Gateway", &ns, &zone_name),
            ObjectRef::new("Realm", &ns, &ctx.environment),
            ObjectRef::new("Consumer", &ns, "gateway"),
        ];

        if !obj.spec.team_apis.is_empty() {
            let team_realm_spec = RealmSpec { gateway: zone_name.clone(), default_consumers: vec![], issuer_url: issuer.clone() };
            let team_realm_client = ScopedClient::new(&ctx.realms, ctx.environment.clone());
            let (team_realm, _) = team_realm_client
                .create_or_update(&ns, &team_api_realm_name_value, &owner, now(), |existing| {
                    let mut o = existing
                        .unwrap_or_else(|| Resource::new(Kind::Realm, ObjectMeta::new(&ns, &team_api_realm_name_value, now()), team_realm_spec.clone()));
                    o.spec = team_realm_spec.clone();
                    mark_ready(&mut o, gen);
                    o
                })
                .await?;
            ctx.gateway_admin.apply_realm(&team_realm).await?;
            children.push(ObjectRef::new("Realm", &ns, &team_api_realm_name_value));

            let route_client = ScopedClient::new(&ctx.routes, ctx.environment.clone());
            for api in &obj.spec.team_apis {
                let route_name = team_api_route_name(&ctx.environment, &api.name);
                let upstream = parse_upstream_url(&api.url)?;
                let route_spec = RouteSpec {
                    zone: zone_name.clone(),
                    realm: team_api_realm_name_value.clone(),
                    route_type: RouteType::Real,
                    upstreams: vec![upstream],
                    downstream: Downstream { host: gateway_host.clone(), port: 0, path: api.path.clone(), issuer_url: team_issuer.clone() },
                    security: RouteSecurity { disable_access_control: true },
                };
                let (route, _) = route_client
                    .create_or_update(&ns, &route_name, &owner, now(), |existing| {
                        let mut o = existing.unwrap_or_else(|| Resource::new(Kind::Route, ObjectMeta::new(&ns, &route_name, now()), route_spec.clone()));
                        o.spec = route_spec.clone();
                        mark_ready(&mut o, gen);
                        o
                    })
                    .await?;
                ctx.gateway_admin.apply_route(&route).await?;
                children.push(ObjectRef::new("Route", &ns, &route_name));
            }
        }

        obj.status.links = ZoneLinks {
            gateway_issuer: issuer.clone(),
            gateway_url: obj.spec.gateway.url.clone(),
            gateway_host: gateway_host.clone(),
            stargate_lms_issuer: team_issuer.clone(),
        };
        obj.status.children = children;
        mark_ready(&mut obj, gen);

        ctx.zones.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        Ok(Action::requeue_after_secs(300))
    }
}
