//! `ApiSubscription` handler: gates consumption of an Api behind an
//! ApprovalRequest decided by the owning team of the active exposure (§4.6,
//! §4.7).

use std::sync::Arc;

use async_trait::async_trait;

use crate::approval_fsm::State;
use crate::client::ScopedClient;
use crate::errors::{Error, Result};
use crate::model::kinds::api_subscription::ApiSubscription;
use crate::model::kinds::approval::ApprovalRequestSpec;
use crate::model::meta::{Condition, ConditionStatus, ObjectMeta, ObjectRef, OwnerReference, COND_BLOCKED, COND_PROCESSING, COND_READY};
use crate::model::resource::{Kind, Resource};
use crate::naming::{approval_name, normalize_base_path};
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct ApiSubscriptionHandler;

fn blocked(obj: &mut ApiSubscription, reason: &str, message: impl Into<String>, generation: i64) {
    obj.conditions_mut().upsert(Condition::new(COND_BLOCKED, ConditionStatus::True, reason, message, generation, now()));
    obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, reason, "", generation, now()));
    obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Blocked", "", generation, now()));
}

#[async_trait]
impl Handler<ApiSubscription, EngineContext> for ApiSubscriptionHandler {
    async fn reconcile(&self, mut obj: ApiSubscription, ctx: Arc<EngineContext>) -> Result<Action> {
        let gen = obj.metadata.generation;
        let owner = OwnerReference::controller("ApiSubscription", &obj.metadata.namespace, &obj.metadata.name, obj.metadata.uid);
        let normalized_bp = normalize_base_path(&obj.spec.api_base_path);

        let active_exposure = ctx.api_exposures.list(None).await.into_iter().find(|e| normalize_base_path(&e.spec.api_base_path) == normalized_bp && e.status.active);
        let exposure = match active_exposure {
            Some(e) => e,
            None => {
                blocked(&mut obj, "NoActiveExposure", "no active ApiExposure publishes this basePath", gen);
                ctx.api_subscriptions.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
                return Ok(Action::AwaitChange);
            }
        };

        let decider_team = match ctx.applications.get(&exposure.metadata.namespace, &exposure.spec.application).await {
            Some(app) => app.spec.team,
            None => {
                blocked(&mut obj, "NoApplication", "the exposing application does not exist", gen);
                ctx.api_subscriptions.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
                return Ok(Action::AwaitChange);
            }
        };

        let req_name = approval_name("ApiSubscription", &obj.metadata.name);
        let req_ns = obj.metadata.namespace.clone();
        let target = ObjectRef::new("ApiSubscription", &req_ns, &obj.metadata.name);
        let req_client = ScopedClient::new(&ctx.approval_requests, ctx.environment.clone());
        let (request, _) = req_client
            .create_or_update(&req_ns, &req_name, &owner, now(), |existing| match existing {
                None => Resource::new(
                    Kind::ApprovalRequest,
                    ObjectMeta::new(&req_ns, &req_name, now()),
                    ApprovalRequestSpec {
                        strategy: obj.spec.approval_strategy,
                        state: State::Pending,
                        requester: obj.spec.application.clone(),
                        decider: decider_team.clone(),
                        target: target.clone(),
                        action: "subscribe".to_string(),
                    },
                ),
                Some(mut o) => {
                    // `spec.state` is mutated externally by the decider; only refresh the
                    // fields this handler owns.
                    o.spec.strategy = obj.spec.approval_strategy;
                    o.spec.requester = obj.spec.application.clone();
                    o.spec.decider = decider_team.clone();
                    o.spec.target = target.clone();
                    o
                }
            })
            .await?;
        obj.status.approval_request = Some(ObjectRef::new("ApprovalRequest", &req_ns, &req_name));

        match request.status.last_state {
            Some(State::Granted) => {
                obj.status.route = exposure.status.route.clone();
                obj.conditions_mut().remove(COND_BLOCKED);
                obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Granted", "", gen, now()));
                obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));
            }
            Some(State::Rejected) => {
                obj.status.route = None;
                obj.conditions_mut().upsert(Condition::new(COND_BLOCKED, ConditionStatus::True, "Rejected", "", gen, now()));
                obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "Rejected", "", gen, now()));
                obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));
            }
            _ => {
                obj.status.route = None;
                obj.conditions_mut().remove(COND_BLOCKED);
                obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "AwaitingApproval", "", gen, now()));
                obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::True, "AwaitingApproval", "", gen, now()));
            }
        }

        ctx.api_subscriptions.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        Ok(Action::requeue_after_secs(300))
    }
}
