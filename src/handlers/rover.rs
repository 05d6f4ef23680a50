//! `Rover` handler: the user-facing orchestrator (§4.7). Expands into one
//! Application, one ApiSubscription per subscription entry and one
//! ApiExposure per exposure entry, then cleans up whatever fell out of the
//! desired set.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;

use crate::client::ScopedClient;
use crate::errors::{Error, Result};
use crate::model::kinds::api_exposure::{ApiExposureSpec, ExposureSecurity, FailoverConfig, TrafficConfig};
use crate::model::kinds::api_subscription::ApiSubscriptionSpec;
use crate::model::kinds::application::ApplicationSpec;
use crate::model::kinds::rover::Rover;
use crate::model::meta::{Condition, ConditionStatus, ObjectMeta, ObjectRef, OwnerReference, COND_BLOCKED, COND_PROCESSING, COND_READY};
use crate::model::resource::{Kind, Resource};
use crate::naming::slug;
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct RoverHandler;

#[async_trait]
impl Handler<Rover, EngineContext> for RoverHandler {
    async fn reconcile(&self, mut obj: Rover, ctx: Arc<EngineContext>) -> Result<Action> {
        let gen = obj.metadata.generation;
        let ns = obj.metadata.namespace.clone();
        let name = obj.metadata.name.clone();
        let owner = OwnerReference::controller("Rover", &ns, &name, obj.metadata.uid);

        // 2. validate cross-references.
        let mut errors = Vec::new();
        if ctx.zones.get(&ctx.environment, &obj.spec.zone).await.is_none() {
            errors.push(format!("zone {:?} does not exist", obj.spec.zone));
        }
        if let Some(remote_org) = &obj.spec.remote_organization {
            if ctx.remote_organizations.get(&ctx.environment, remote_org).await.is_none() {
                errors.push(format!("remote organization {remote_org:?} does not exist"));
            }
        }
        for sub in &obj.spec.subscriptions {
            for trusted in &sub.trusted_teams {
                if ctx.teams.get(&ctx.environment, trusted).await.is_none() {
                    errors.push(format!("trusted team {trusted:?} does not exist"));
                }
            }
        }
        if !errors.is_empty() {
            obj.conditions_mut().upsert(Condition::new(COND_BLOCKED, ConditionStatus::True, "InvalidReferences", errors.join("; "), gen, now()));
            obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "InvalidReferences", "", gen, now()));
            ctx.rovers.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
            return Ok(Action::AwaitChange);
        }

        // 1./3. create/update the desired set.
        let needs_client = !obj.spec.client_secret.is_empty();
        let needs_consumer = !obj.spec.subscriptions.is_empty();
        let app_spec = ApplicationSpec {
            team: obj.spec.team.clone(),
            zone: obj.spec.zone.clone(),
            failover_zones: vec![],
            needs_client,
            needs_consumer,
            org_id: None,
        };
        let app_client = ScopedClient::new(&ctx.applications, ctx.environment.clone());
        let (application, _) = app_client
            .create_or_update(&ns, &name, &owner, now(), |existing| {
                let mut o = existing.unwrap_or_else(|| Resource::new(Kind::Application, ObjectMeta::new(&ns, &name, now()), app_spec.clone()));
                o.spec = app_spec.clone();
                o
            })
            .await?;
        obj.status.application = Some(ObjectRef::new("Application", &ns, &name));

        // children within each set are independent of one another (§7: handlers
        // must be order-independent within the desired set), so create them
        // concurrently rather than one at a time.
        let sub_client = ScopedClient::new(&ctx.api_subscriptions, ctx.environment.clone());
        let subscription_refs: Vec<ObjectRef> = try_join_all(obj.spec.subscriptions.iter().map(|entry| {
            let child_name = format!("{name}--{}", slug(&entry.api_base_path));
            let spec = ApiSubscriptionSpec {
                application: name.clone(),
                api_base_path: entry.api_base_path.clone(),
                zone: obj.spec.zone.clone(),
                approval_strategy: entry.approval_strategy,
                trusted_teams: entry.trusted_teams.clone(),
            };
            let (ns, owner, sub_client) = (ns.clone(), owner.clone(), &sub_client);
            async move {
                let (child, _) = sub_client
                    .create_or_update(&ns, &child_name, &owner, now(), |existing| {
                        let mut o = existing.unwrap_or_else(|| Resource::new(Kind::ApiSubscription, ObjectMeta::new(&ns, &child_name, now()), spec.clone()));
                        o.spec = spec.clone();
                        o
                    })
                    .await?;
                Ok::<_, anyhow::Error>(ObjectRef::new("ApiSubscription", child.metadata.namespace, child.metadata.name))
            }
        }))
        .await?;
        obj.status.subscriptions = subscription_refs.clone();

        let exp_client = ScopedClient::new(&ctx.api_exposures, ctx.environment.clone());
        let exposure_refs: Vec<ObjectRef> = try_join_all(obj.spec.exposures.iter().map(|entry| {
            let child_name = format!("{name}--{}", slug(&entry.api_base_path));
            let spec = ApiExposureSpec {
                application: name.clone(),
                api_base_path: entry.api_base_path.clone(),
                zone: obj.spec.zone.clone(),
                upstream_url: entry.upstream_url.clone(),
                traffic: TrafficConfig { failover: FailoverConfig { zones: entry.failover_zones.clone() } },
                security: ExposureSecurity::default(),
            };
            let (ns, owner, exp_client) = (ns.clone(), owner.clone(), &exp_client);
            async move {
                let (child, _) = exp_client
                    .create_or_update(&ns, &child_name, &owner, now(), |existing| {
                        let mut o = existing.unwrap_or_else(|| Resource::new(Kind::ApiExposure, ObjectMeta::new(&ns, &child_name, now()), spec.clone()));
                        o.spec = spec.clone();
                        o
                    })
                    .await?;
                Ok::<_, anyhow::Error>(ObjectRef::new("ApiExposure", child.metadata.namespace, child.metadata.name))
            }
        }))
        .await?;
        obj.status.exposures = exposure_refs.clone();

        // 4. clean up whatever fell out of the desired set.
        app_client.cleanup(&owner, &[(ns.clone(), name.clone())]).await?;
        sub_client.cleanup(&owner, &subscription_refs.iter().map(|r| (r.namespace.clone(), r.name.clone())).collect::<Vec<_>>()).await?;
        exp_client.cleanup(&owner, &exposure_refs.iter().map(|r| (r.namespace.clone(), r.name.clone())).collect::<Vec<_>>()).await?;

        // 5. aggregate status.
        let all_ready = application.conditions().is_true(COND_READY);
        obj.conditions_mut().remove(COND_BLOCKED);
        if all_ready {
            obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", gen, now()));
            obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));
        } else {
            obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "Waiting", "waiting for the application to become ready", gen, now()));
            obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::True, "Waiting", "", gen, now()));
        }

        ctx.rovers.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        Ok(Action::requeue_after_secs(120))
    }
}
