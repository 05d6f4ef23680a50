//! `ApprovalRequest` handler: the finite-state machine driver (§4.4).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::approval_fsm::State;
use crate::client::ScopedClient;
use crate::errors::{Error, Result};
use crate::model::kinds::approval::{ApprovalRequest, ApprovalSpec};
use crate::model::kinds::notification::{NotificationSpec, Purpose};
use crate::model::meta::{Condition, ConditionStatus, ObjectMeta, ObjectRef, OwnerReference, COND_BLOCKED, COND_PROCESSING, COND_READY};
use crate::model::resource::{Kind, Resource};
use crate::naming::approval_name;
use crate::notifications::{approval_notify_targets, Actor};
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct ApprovalRequestHandler;

#[async_trait]
impl Handler<ApprovalRequest, EngineContext> for ApprovalRequestHandler {
    async fn reconcile(&self, mut obj: ApprovalRequest, ctx: Arc<EngineContext>) -> Result<Action> {
        let gen = obj.metadata.generation;
        let owner = OwnerReference::controller("ApprovalRequest", &obj.metadata.namespace, &obj.metadata.name, obj.metadata.uid);

        // 1. notify on state change.
        let previous_state = obj.status.last_state;
        if previous_state != Some(obj.spec.state) {
            let mut refs = Vec::new();
            for (actor, purpose) in approval_notify_targets(previous_state, obj.spec.state) {
                let channel_namespace = match actor {
                    Actor::Decider => obj.spec.decider.clone(),
                    Actor::Requester => obj.spec.requester.clone(),
                };
                let mut properties = BTreeMap::new();
                properties.insert("target".to_string(), obj.spec.target.to_string());
                properties.insert("action".to_string(), obj.spec.action.clone());
                if let Ok(r) = create_notification(&ctx, &owner, &channel_namespace, purpose, properties).await {
                    refs.push(r);
                }
            }
            obj.status.notification_refs = refs;
            obj.status.last_state = Some(obj.spec.state);
        }

        // 2. available transitions from the current state.
        obj.status.available_transitions = obj.spec.strategy.available_transitions(obj.spec.state);

        // 3. Granted -> sibling Approval, owned by (and cascading from) the target.
        if obj.spec.state == State::Granted {
            if let Some(target_uid) = target_uid(&ctx, &obj.spec.target).await {
                let approval_name_value = approval_name(&obj.spec.target.kind, &obj.spec.target.name);
                let approval_owner = OwnerReference::controller(obj.spec.target.kind.clone(), &obj.spec.target.namespace, &obj.spec.target.name, target_uid);
                let approval_spec = ApprovalSpec {
                    target: obj.spec.target.clone(),
                    approved_request: ObjectRef::new("ApprovalRequest", &obj.metadata.namespace, &obj.metadata.name),
                };
                let approval_client = ScopedClient::new(&ctx.approvals, ctx.environment.clone());
                approval_client
                    .create_or_update(&obj.spec.target.namespace, &approval_name_value, &approval_owner, now(), |existing| {
                        let mut o = existing
                            .unwrap_or_else(|| Resource::new(Kind::Approval, ObjectMeta::new(&obj.spec.target.namespace, &approval_name_value, now()), approval_spec.clone()));
                        o.spec = approval_spec.clone();
                        o.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Granted", "", gen, now()));
                        o
                    })
                    .await?;
            }
        }

        // 4. propagate conditions from state.
        match obj.spec.state {
            State::Granted => {
                obj.conditions_mut().remove(COND_BLOCKED);
                obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Granted", "", gen, now()));
                obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));
            }
            State::Rejected => {
                obj.conditions_mut().remove(COND_BLOCKED);
                obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "Rejected", "", gen, now()));
                obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));
            }
            State::Pending | State::Semigranted => {
                obj.conditions_mut().remove(COND_BLOCKED);
                obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "Pending", "", gen, now()));
                obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::True, "Pending", "", gen, now()));
            }
            State::Suspended => {
                obj.conditions_mut().upsert(Condition::new(COND_BLOCKED, ConditionStatus::True, "Suspended", "", gen, now()));
                obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "Suspended", "", gen, now()));
                obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Suspended", "", gen, now()));
            }
        }

        ctx.approval_requests.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        Ok(Action::requeue_after_secs(60))
    }
}

/// Only `ApiSubscription` targets exist so far; a future second target kind
/// needs a kind-indexed lookup here instead of one `if let` per kind.
async fn target_uid(ctx: &Arc<EngineContext>, target: &ObjectRef) -> Option<uuid::Uuid> {
    match target.kind.as_str() {
        "ApiSubscription" => ctx.api_subscriptions.get(&target.namespace, &target.name).await.map(|o| o.metadata.uid),
        _ => None,
    }
}

async fn create_notification(ctx: &Arc<EngineContext>, owner: &OwnerReference, channel_namespace: &str, purpose: Purpose, properties: BTreeMap<String, String>) -> Result<ObjectRef> {
    let channels: Vec<ObjectRef> = ctx
        .notification_channels
        .list(Some(channel_namespace))
        .await
        .into_iter()
        .filter(|c| !c.spec.ignore_purposes.contains(&purpose))
        .map(|c| ObjectRef::new("NotificationChannel", &c.metadata.namespace, &c.metadata.name))
        .collect();

    let name = format!("{}--{}", owner.name.to_ascii_lowercase(), purpose_slug(purpose));
    let spec = NotificationSpec { purpose, channels, properties };
    let notif_client = ScopedClient::new(&ctx.notifications, ctx.environment.clone());
    let (notif, _) = notif_client
        .create_or_update(channel_namespace, &name, owner, now(), |existing| {
            let mut o = existing.unwrap_or_else(|| Resource::new(Kind::Notification, ObjectMeta::new(channel_namespace, &name, now()), spec.clone()));
            o.spec = spec.clone();
            o
        })
        .await?;
    Ok(ObjectRef::new("Notification", &notif.metadata.namespace, &notif.metadata.name))
}

fn purpose_slug(p: Purpose) -> &'static str {
    match p {
        Purpose::ApprovalRequestCreated => "created",
        Purpose::ApprovalRequestDecided => "decided",
        Purpose::ApprovalRequestPending => "pending",
    }
}
