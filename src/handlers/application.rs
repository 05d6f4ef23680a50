//! `Application` handler: provisions the identity client / gateway consumer
//! an application opts into (§4.3 implied by Rover's `needs_client`/
//! `needs_consumer`).

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::ScopedClient;
use crate::errors::{Error, Result};
use crate::model::kinds::application::Application;
use crate::model::kinds::gateway::ConsumerSpec;
use crate::model::kinds::identity::IdentityClientSpec;
use crate::model::meta::{Condition, ConditionStatus, ObjectMeta, ObjectRef, OwnerReference, COND_PROCESSING, COND_READY};
use crate::model::resource::{Kind, Resource};
use crate::naming::zone_namespace;
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct ApplicationHandler;

#[async_trait]
impl Handler<Application, EngineContext> for ApplicationHandler {
    async fn reconcile(&self, mut obj: Application, ctx: Arc<EngineContext>) -> Result<Action> {
        let name = obj.metadata.name.clone();
        let zone_ns = zone_namespace(&ctx.environment, &obj.spec.zone);
        let owner = OwnerReference::controller("Application", &obj.metadata.namespace, &name, obj.metadata.uid);
        let gen = obj.metadata.generation;

        if obj.spec.needs_client {
            let client_client = ScopedClient::new(&ctx.identity_clients, ctx.environment.clone());
            let (idc, _) = client_client
                .create_or_update(&zone_ns, &name, &owner, now(), |existing| {
                    let mut o = existing.unwrap_or_else(|| {
                        Resource::new(Kind::IdentityClient, ObjectMeta::new(&zone_ns, &name, now()), IdentityClientSpec { realm: ctx.environment.clone() })
                    });
                    o.spec.realm = ctx.environment.clone();
                    o.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", gen, now()));
                    o
                })
                .await?;
            ctx.identity_admin.apply_client(&idc).await?;
            obj.status.identity_client = Some(ObjectRef::new("IdentityClient", &zone_ns, &name));
        } else {
            ctx.identity_admin.delete_client(&zone_ns, &name).await.ok();
            ctx.identity_clients.delete(&zone_ns, &name).await.ok();
            obj.status.identity_client = None;
        }

        if obj.spec.needs_consumer {
            let consumer_client = ScopedClient::new(&ctx.consumers, ctx.environment.clone());
            let (consumer, _) = consumer_client
                .create_or_update(&zone_ns, &name, &owner, now(), |existing| {
                    let mut o = existing.unwrap_or_else(|| {
                        Resource::new(Kind::Consumer, ObjectMeta::new(&zone_ns, &name, now()), ConsumerSpec { realm: ctx.environment.clone() })
                    });
                    o.spec.realm = ctx.environment.clone();
                    o.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", gen, now()));
                    o
                })
                .await?;
            ctx.gateway_admin.apply_consumer(&consumer).await?;
            obj.status.gateway_consumer = Some(ObjectRef::new("Consumer", &zone_ns, &name));
        } else {
            ctx.gateway_admin.delete_consumer(&zone_ns, &name).await.ok();
            ctx.consumers.delete(&zone_ns, &name).await.ok();
            obj.status.gateway_consumer = None;
        }

        obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "application is ready", gen, now()));
        obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));

        ctx.applications.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        Ok(Action::AwaitChange)
    }
}
