//! `Team` handler: onboards the secret-store scope backing `spec.secret`'s
//! references and reports ready (§3, §4.10).

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{Error, Result};
use crate::model::kinds::team::Team;
use crate::model::meta::{Condition, ConditionStatus, COND_PROCESSING, COND_READY};
use crate::onboarding;
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct TeamHandler;

#[async_trait]
impl Handler<Team, EngineContext> for TeamHandler {
    async fn reconcile(&self, mut obj: Team, ctx: Arc<EngineContext>) -> Result<Action> {
        onboarding::onboard_team(ctx.secrets.as_ref(), &ctx.environment, &obj.spec.name).await?;

        let before = obj.status.conditions.clone();
        let generation = obj.metadata.generation;
        obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "team is ready", generation, now()));
        obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", generation, now()));

        if obj.status.conditions != before {
            ctx.teams.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        }
        Ok(Action::AwaitChange)
    }
}
