//! `Environment` handler: ready as soon as it exists (§3).

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{Error, Result};
use crate::model::kinds::environment::Environment;
use crate::model::meta::{Condition, ConditionStatus, COND_PROCESSING, COND_READY};
use crate::onboarding;
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct EnvironmentHandler;

#[async_trait]
impl Handler<Environment, EngineContext> for EnvironmentHandler {
    async fn reconcile(&self, mut obj: Environment, ctx: Arc<EngineContext>) -> Result<Action> {
        onboarding::onboard_environment(ctx.secrets.as_ref(), &obj.metadata.name).await?;

        let before = obj.status.conditions.clone();
        let generation = obj.metadata.generation;
        obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "environment is ready", generation, now()));
        obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", generation, now()));

        if obj.status.conditions != before {
            ctx.environments.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        }
        Ok(Action::AwaitChange)
    }
}
